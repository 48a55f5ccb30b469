//! End-to-end vault scenarios against the in-memory store.
//!
//! Deterministic BIP-39 vectors only; randomness is confined to the
//! per-wallet salts and nonces, which the assertions never depend on.

use std::sync::Arc;

use filvault_crypto::keystore::LIGHT_SCRYPT_LOG_N;
use filvault_store::MemoryStore;
use filvault_types::config::VaultConfig;
use filvault_types::{AddressKind, Env, FilvaultError, Network};
use filvault_vault::Vault;

const MNEMONIC_A: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const MNEMONIC_B: &str =
    "legal winner thank year wave sausage worth useful legal winner thank yellow";

const PW_A: &str = "password alpha";
const PW_B: &str = "password beta";

/// Loopback HTTP listener answering every request with a canned
/// `Filecoin.Version` result, so vault construction has a node to dial.
async fn spawn_stub_node() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub node listener");
    let addr = listener.local_addr().expect("stub node address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;

                let body = r#"{"jsonrpc":"2.0","result":{"Version":"stub-node/0"},"id":1}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\n\
                     content-type: application/json\r\n\
                     content-length: {}\r\n\
                     connection: close\r\n\
                     \r\n\
                     {body}",
                    body.len(),
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}/rpc/v1")
}

async fn test_vault(network: Network) -> Arc<Vault> {
    let cfg = VaultConfig {
        env: Env::Development,
        network,
        session_timeout_minutes: 30,
        data_dir: std::env::temp_dir(),
        rpc_endpoint: spawn_stub_node().await,
        rpc_token: None,
    };
    Vault::with_keystore_cost(Arc::new(MemoryStore::new()), cfg, LIGHT_SCRYPT_LOG_N)
        .await
        .expect("construct vault")
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_first_wallet() {
    let vault = test_vault(Network::Mainnet).await;

    let (wallet, mnemonic) = vault.create("alpha", "pw1").unwrap();

    assert_eq!(wallet.id, 1);
    assert!(wallet.is_default);
    assert_eq!(wallet.addresses.len(), 3);
    assert_eq!(wallet.addresses[0].kind, AddressKind::F1);
    assert_eq!(wallet.addresses[1].kind, AddressKind::F4);
    assert_eq!(wallet.addresses[2].kind, AddressKind::ZeroX);
    assert!(wallet.addresses[0].value.starts_with("f1"));
    assert_eq!(mnemonic.split_whitespace().count(), 12);
    assert_eq!(vault.count().unwrap(), 1);

    // Creation warms the vault.
    assert!(!vault.locked());
    assert_eq!(vault.get_key(wallet.id).unwrap().len(), 32);
}

#[tokio::test]
async fn create_rejects_empty_inputs() {
    let vault = test_vault(Network::Mainnet).await;

    assert!(matches!(
        vault.create("alpha", ""),
        Err(FilvaultError::InvalidPassword)
    ));
    assert!(matches!(
        vault.create("", "pw"),
        Err(FilvaultError::InvalidWalletName)
    ));
    assert_eq!(vault.count().unwrap(), 0);
}

#[tokio::test]
async fn duplicate_name_is_wallet_exists() {
    let vault = test_vault(Network::Mainnet).await;

    vault.create("alpha", "pw").unwrap();
    let result = vault.create("alpha", "pw");

    assert!(matches!(result, Err(FilvaultError::WalletExists)));
    assert_eq!(vault.count().unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recover_known_vector() {
    let vault = test_vault(Network::Mainnet).await;

    let wallet = vault.recover(MNEMONIC_A, "beta", PW_B).unwrap();

    assert_eq!(wallet.addresses.len(), 3);
    assert!(wallet.addresses[0].value.starts_with("f1"));
    assert!(wallet.addresses[1].value.starts_with("f410f"));
    assert!(wallet.addresses[2].value.starts_with("0x"));
}

#[tokio::test]
async fn recover_rejects_bad_mnemonic() {
    let vault = test_vault(Network::Mainnet).await;

    let result = vault.recover("twelve words that are not a bip39 phrase at all okay then", "x", "pw");
    assert!(matches!(result, Err(FilvaultError::InvalidSeedPhrase)));
    assert_eq!(vault.count().unwrap(), 0);
}

#[tokio::test]
async fn recovered_addresses_are_deterministic() {
    let a = test_vault(Network::Mainnet)
        .await
        .recover(MNEMONIC_A, "one", "pw one")
        .unwrap();
    let b = test_vault(Network::Mainnet)
        .await
        .recover(MNEMONIC_A, "two", "pw two")
        .unwrap();

    // Same mnemonic, different store/name/password: identical address
    // set, element-wise and order-stable.
    assert_eq!(a.addresses, b.addresses);
}

#[tokio::test]
async fn calibration_recovery_uses_t_prefix() {
    let wallet = test_vault(Network::Calibration)
        .await
        .recover(MNEMONIC_A, "beta", PW_B)
        .unwrap();
    assert!(wallet.addresses[0].value.starts_with("t1"));
}

// ---------------------------------------------------------------------------
// Unlock / GetKey
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_password_leaves_vault_intact() {
    let vault = test_vault(Network::Mainnet).await;
    let (wallet, _) = vault.create("alpha", "pw1").unwrap();

    vault.lock();
    let result = vault.unlock(wallet.id, "wrong");
    assert!(matches!(result, Err(FilvaultError::InvalidPassword)));
    assert!(vault.locked());

    // And with the wallet still resident, a bad password is a no-op
    // because unlock short-circuits on presence.
    vault.unlock(wallet.id, "pw1").unwrap();
    vault.unlock(wallet.id, "wrong").unwrap();
    assert!(vault.get_key(wallet.id).is_ok());
}

#[tokio::test]
async fn unlock_unknown_wallet_is_not_found() {
    let vault = test_vault(Network::Mainnet).await;
    assert!(matches!(
        vault.unlock(99, "pw"),
        Err(FilvaultError::NotFound)
    ));
}

#[tokio::test]
async fn get_key_returns_caller_owned_copy() {
    let vault = test_vault(Network::Mainnet).await;
    let (wallet, _) = vault.create("alpha", "pw1").unwrap();

    let first = vault.get_key(wallet.id).unwrap();
    let second = vault.get_key(wallet.id).unwrap();
    assert_eq!(first.open().bytes(), second.open().bytes());

    // Dropping a handed-out copy leaves the resident enclave usable.
    drop(first);
    assert!(vault.get_key(wallet.id).is_ok());
}

#[tokio::test]
async fn lock_then_get_key_is_not_found() {
    let vault = test_vault(Network::Mainnet).await;
    let (a, _) = vault.create("alpha", PW_A).unwrap();
    let b = vault.recover(MNEMONIC_B, "beta", PW_B).unwrap();

    assert!(vault.get_key(a.id).is_ok());
    assert!(vault.get_key(b.id).is_ok());

    vault.lock();

    assert!(vault.locked());
    assert!(matches!(vault.get_key(a.id), Err(FilvaultError::NotFound)));
    assert!(matches!(vault.get_key(b.id), Err(FilvaultError::NotFound)));
}

// ---------------------------------------------------------------------------
// UnlockAll
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unlock_all_with_shared_password() {
    let vault = test_vault(Network::Mainnet).await;
    let (a, _) = vault.create("alpha", PW_A).unwrap();
    let b = vault.recover(MNEMONIC_B, "beta", PW_A).unwrap();

    vault.lock();
    vault.unlock_all(PW_A).unwrap();

    assert!(vault.get_key(a.id).is_ok());
    assert!(vault.get_key(b.id).is_ok());
}

#[tokio::test]
async fn unlock_all_is_atomic_on_password_mismatch() {
    let vault = test_vault(Network::Mainnet).await;
    let (a, _) = vault.create("alpha", PW_A).unwrap();
    vault.recover(MNEMONIC_B, "beta", PW_B).unwrap();

    vault.lock();
    // Wallet beta rejects PW_A, so nothing may become resident.
    let result = vault.unlock_all(PW_A);
    assert!(matches!(result, Err(FilvaultError::InvalidPassword)));
    assert!(vault.locked());
    assert!(matches!(vault.get_key(a.id), Err(FilvaultError::NotFound)));
}

// ---------------------------------------------------------------------------
// RevealSeed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reveal_seed_roundtrip() {
    let vault = test_vault(Network::Mainnet).await;
    let (wallet, mnemonic) = vault.create("alpha", "pw1").unwrap();

    let revealed = vault.reveal_seed(wallet.id, "pw1").unwrap();
    assert_eq!(revealed.as_str(), mnemonic.as_str());
}

#[tokio::test]
async fn reveal_seed_works_while_locked() {
    let vault = test_vault(Network::Mainnet).await;
    let wallet = vault.recover(MNEMONIC_A, "alpha", "pw1").unwrap();

    // The vault holds only keys, never seeds: revealing must not
    // depend on the session at all.
    vault.lock();
    let revealed = vault.reveal_seed(wallet.id, "pw1").unwrap();
    assert_eq!(revealed.as_str(), MNEMONIC_A);
}

#[tokio::test]
async fn reveal_seed_wrong_password() {
    let vault = test_vault(Network::Mainnet).await;
    let (wallet, _) = vault.create("alpha", "pw1").unwrap();

    let result = vault.reveal_seed(wallet.id, "wrong");
    assert!(matches!(result, Err(FilvaultError::InvalidPassword)));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_evicts_session_and_releases_addresses() {
    let vault = test_vault(Network::Mainnet).await;
    let wallet = vault.recover(MNEMONIC_A, "alpha", "pw1").unwrap();

    vault.delete_wallet(wallet.id).unwrap();

    assert_eq!(vault.count().unwrap(), 0);
    assert!(matches!(
        vault.get_key(wallet.id),
        Err(FilvaultError::NotFound)
    ));
    assert!(matches!(
        vault.reveal_seed(wallet.id, "pw1"),
        Err(FilvaultError::NotFound)
    ));

    // Addresses are released: the same mnemonic imports again.
    let again = vault.recover(MNEMONIC_A, "alpha", "pw1").unwrap();
    assert!(again.is_default);
}
