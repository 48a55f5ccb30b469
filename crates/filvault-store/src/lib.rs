//! Wallet persistence port and its implementations.
//!
//! The vault depends only on the [`WalletStore`] trait. Two production
//! backends exist — [`SqliteStore`] (embedded file database, the
//! default) and `PgStore` (server database, behind the `postgres`
//! feature) — plus [`MemoryStore`], an in-memory fake for tests.
//!
//! Contract highlights:
//!
//! - `save_wallet` assigns the id and timestamps and marks the row as
//!   default iff it is the first wallet in the store.
//! - Wallet names and address values are unique; violations surface as
//!   [`FilvaultError::WalletExists`].
//! - `find_wallet` reports a missing row as the distinct
//!   [`FilvaultError::NotFound`].
//! - `delete_wallet` cascades to the wallet's addresses.

pub mod memory;
pub mod models;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use sqlite::SqliteStore;

use filvault_types::{Address, Result};
use filvault_wallet::Wallet;

// ---------------------------------------------------------------------------
// SaveWalletParams
// ---------------------------------------------------------------------------

/// Everything the store needs to persist a freshly created wallet.
#[derive(Clone, Debug)]
pub struct SaveWalletParams {
    /// scrypt keystore envelope around the private key.
    pub key_json: Vec<u8>,
    /// AES-GCM envelope around the mnemonic.
    pub encrypted_seed: Vec<u8>,
    /// Derived chain addresses in stable order.
    pub addresses: Vec<Address>,
    /// Human label, unique per store.
    pub name: String,
    /// 32-byte Argon2id salt.
    pub salt: Vec<u8>,
}

impl SaveWalletParams {
    /// Extracts save parameters from an unpersisted wallet record.
    pub fn from_wallet(wallet: &Wallet) -> Self {
        Self {
            key_json: wallet.encrypted_key_json.clone(),
            encrypted_seed: wallet.encrypted_seed.clone(),
            addresses: wallet.addresses.clone(),
            name: wallet.name.clone(),
            salt: wallet.salt.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// WalletStore
// ---------------------------------------------------------------------------

/// Abstract wallet persistence.
///
/// Implementations must be threadsafe; the vault serializes only the
/// operations that must stay consistent with its in-memory session.
pub trait WalletStore: Send + Sync {
    /// Number of persisted wallets.
    fn count_wallets(&self) -> Result<i64>;

    /// All wallets with their address sets, ordered by id.
    fn get_wallets(&self) -> Result<Vec<Wallet>>;

    /// A single wallet with its address set.
    fn find_wallet(&self, wallet_id: i32) -> Result<Wallet>;

    /// Persists a new wallet, assigning its id and timestamps.
    fn save_wallet(&self, params: SaveWalletParams) -> Result<Wallet>;

    /// Removes a wallet and its addresses.
    fn delete_wallet(&self, wallet_id: i32) -> Result<()>;
}
