//! Persisted wallet record and its unlock lifecycle.
//!
//! A [`wallet::Wallet`] holds only ciphertext and salt at rest. The
//! private key exists in plaintext solely inside the page-locked
//! enclave returned by [`wallet::Wallet::unlock`].

pub mod wallet;

pub use wallet::Wallet;
