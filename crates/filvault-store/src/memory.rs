//! In-memory wallet store for tests.
//!
//! Honors the full port contract — id assignment, first-wallet
//! default, name and address uniqueness, cascade delete — without any
//! database behind it.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;
use filvault_types::{FilvaultError, Result};
use filvault_wallet::Wallet;

use crate::{SaveWalletParams, WalletStore};

#[derive(Default)]
struct Inner {
    next_id: i32,
    wallets: BTreeMap<i32, Wallet>,
}

/// In-memory fake implementing [`WalletStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, op: &'static str) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| FilvaultError::storage(op, "store mutex poisoned"))
    }
}

impl WalletStore for MemoryStore {
    fn count_wallets(&self) -> Result<i64> {
        Ok(self.lock("count_wallets")?.wallets.len() as i64)
    }

    fn get_wallets(&self) -> Result<Vec<Wallet>> {
        Ok(self.lock("get_wallets")?.wallets.values().cloned().collect())
    }

    fn find_wallet(&self, wallet_id: i32) -> Result<Wallet> {
        self.lock("find_wallet")?
            .wallets
            .get(&wallet_id)
            .cloned()
            .ok_or(FilvaultError::NotFound)
    }

    fn save_wallet(&self, params: SaveWalletParams) -> Result<Wallet> {
        let mut inner = self.lock("save_wallet")?;

        let duplicate = inner.wallets.values().any(|w| {
            w.name == params.name
                || w.addresses
                    .iter()
                    .any(|a| params.addresses.iter().any(|b| a.value == b.value))
        });
        if duplicate {
            return Err(FilvaultError::WalletExists);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let wallet = Wallet {
            id: inner.next_id,
            is_default: inner.wallets.is_empty(),
            name: params.name,
            addresses: params.addresses,
            salt: params.salt,
            encrypted_key_json: params.key_json,
            encrypted_seed: params.encrypted_seed,
            created_at: now,
            updated_at: now,
        };

        inner.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    fn delete_wallet(&self, wallet_id: i32) -> Result<()> {
        let mut inner = self.lock("delete_wallet")?;
        inner
            .wallets
            .remove(&wallet_id)
            .map(|_| ())
            .ok_or(FilvaultError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use filvault_types::{Address, AddressKind};

    fn params(name: &str, addr: &str) -> SaveWalletParams {
        SaveWalletParams {
            key_json: vec![1, 2, 3],
            encrypted_seed: vec![4, 5, 6],
            addresses: vec![Address::new(AddressKind::F1, addr)],
            name: name.into(),
            salt: vec![0u8; 32],
        }
    }

    #[test]
    fn ids_are_sequential_and_first_is_default() -> Result<()> {
        let store = MemoryStore::new();
        let a = store.save_wallet(params("a", "f1aaa"))?;
        let b = store.save_wallet(params("b", "f1bbb"))?;

        assert_eq!(a.id, 1);
        assert!(a.is_default);
        assert_eq!(b.id, 2);
        assert!(!b.is_default);
        assert_eq!(store.count_wallets()?, 2);
        Ok(())
    }

    #[test]
    fn duplicate_name_rejected() -> Result<()> {
        let store = MemoryStore::new();
        store.save_wallet(params("a", "f1aaa"))?;
        let result = store.save_wallet(params("a", "f1bbb"));
        assert!(matches!(result, Err(FilvaultError::WalletExists)));
        assert_eq!(store.count_wallets()?, 1);
        Ok(())
    }

    #[test]
    fn duplicate_address_rejected() -> Result<()> {
        let store = MemoryStore::new();
        store.save_wallet(params("a", "f1aaa"))?;
        let result = store.save_wallet(params("b", "f1aaa"));
        assert!(matches!(result, Err(FilvaultError::WalletExists)));
        Ok(())
    }

    #[test]
    fn find_and_delete() -> Result<()> {
        let store = MemoryStore::new();
        let saved = store.save_wallet(params("a", "f1aaa"))?;

        let found = store.find_wallet(saved.id)?;
        assert_eq!(found.name, "a");

        store.delete_wallet(saved.id)?;
        assert!(matches!(
            store.find_wallet(saved.id),
            Err(FilvaultError::NotFound)
        ));
        assert!(matches!(
            store.delete_wallet(saved.id),
            Err(FilvaultError::NotFound)
        ));
        Ok(())
    }
}
