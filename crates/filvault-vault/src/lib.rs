//! Password-gated key vault and unlock-session manager.
//!
//! The [`manager::Vault`] keeps decrypted private keys in page-locked
//! enclaves for a bounded interval. A background janitor empties the
//! vault once the session expires; every public operation goes through
//! one process-wide reader/writer lock.

pub mod manager;
pub mod rpc;
#[cfg(test)]
mod testutil;

pub use manager::Vault;
pub use rpc::RpcClient;
