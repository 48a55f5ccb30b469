//! The vault: wallet lifecycle operations and the unlock session.
//!
//! The session is a map from wallet id to a page-locked enclave plus
//! one absolute expiry instant. All cryptographic work happens before
//! the write lock is taken; the lock only ever guards map mutations
//! and the expiry field. A janitor task ticks once a minute and empties
//! the vault when the expiry has passed.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use filvault_crypto::keystore::STANDARD_SCRYPT_LOG_N;
use filvault_crypto::mnemonic::{generate_mnemonic, validate_mnemonic};
use filvault_crypto::secret::SecretBuffer;
use filvault_store::{SaveWalletParams, WalletStore};
use filvault_types::config::VaultConfig;
use filvault_types::{FilvaultError, Result};
use filvault_wallet::Wallet;
use tokio::sync::watch;
use zeroize::Zeroizing;

use crate::rpc::RpcClient;

/// Fixed janitor tick interval, independent of the session timeout.
const JANITOR_PERIOD: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// In-memory unlock session.
///
/// `expires_at = None` means the vault is fully locked; a `Some`
/// instant in the past means expired and about to be emptied by the
/// janitor.
struct SessionState {
    vault: HashMap<i32, SecretBuffer>,
    expires_at: Option<Instant>,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Process-wide wallet vault and session manager.
///
/// Construct once at bootstrap with [`Vault::new`] and share the
/// returned [`Arc`]; the janitor task holds only a weak reference and
/// exits when the vault is dropped or [`Vault::close`] is called.
pub struct Vault {
    cfg: VaultConfig,
    store: Arc<dyn WalletStore>,
    rpc: RpcClient,
    session: RwLock<SessionState>,
    session_ttl: Duration,
    keystore_cost: u8,
    shutdown_tx: watch::Sender<bool>,
}

impl Vault {
    /// Creates the vault, dials the RPC collaborator, and starts the
    /// session janitor. Fails if the RPC endpoint does not answer.
    pub async fn new(store: Arc<dyn WalletStore>, cfg: VaultConfig) -> Result<Arc<Self>> {
        Self::with_keystore_cost(store, cfg, STANDARD_SCRYPT_LOG_N).await
    }

    /// Like [`Vault::new`] with an explicit keystore scrypt cost.
    ///
    /// Reduced costs are only appropriate for tests; unlock reads the
    /// cost back out of each persisted envelope.
    pub async fn with_keystore_cost(
        store: Arc<dyn WalletStore>,
        cfg: VaultConfig,
        keystore_cost: u8,
    ) -> Result<Arc<Self>> {
        cfg.validate()?;

        let rpc = RpcClient::connect(&cfg.rpc_endpoint, cfg.rpc_token.as_deref()).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let session_ttl = cfg.session_timeout();

        let vault = Arc::new(Self {
            cfg,
            store,
            rpc,
            session: RwLock::new(SessionState {
                vault: HashMap::new(),
                expires_at: None,
            }),
            session_ttl,
            keystore_cost,
            shutdown_tx,
        });

        vault.spawn_janitor(shutdown_rx);
        Ok(vault)
    }

    // -- Creation and recovery --------------------------------------------

    /// Creates a wallet from a fresh 128-bit mnemonic.
    ///
    /// Returns the persisted wallet and the plaintext mnemonic. The
    /// phrase is handed out exactly once, for the user to transcribe;
    /// no plaintext copy survives this call.
    pub fn create(&self, name: &str, password: &str) -> Result<(Wallet, Zeroizing<String>)> {
        if password.is_empty() {
            return Err(FilvaultError::InvalidPassword);
        }
        if name.is_empty() {
            return Err(FilvaultError::InvalidWalletName);
        }

        let mnemonic = generate_mnemonic(128)?;
        let wallet = self.import(&mnemonic, name, password)?;
        Ok((wallet, mnemonic))
    }

    /// Recovers a wallet from an existing mnemonic.
    pub fn recover(&self, mnemonic: &str, name: &str, password: &str) -> Result<Wallet> {
        if !validate_mnemonic(mnemonic) {
            return Err(FilvaultError::InvalidSeedPhrase);
        }
        if password.is_empty() {
            return Err(FilvaultError::InvalidPassword);
        }
        if name.is_empty() {
            return Err(FilvaultError::InvalidWalletName);
        }

        self.import(mnemonic, name, password)
    }

    /// Shared import path: all crypto runs before any lock is taken,
    /// nothing is persisted on failure, and the new wallet is warmed
    /// into the vault before returning.
    fn import(&self, mnemonic: &str, name: &str, password: &str) -> Result<Wallet> {
        let wallet = Wallet::create_with_cost(
            mnemonic,
            name,
            password,
            self.cfg.network,
            self.keystore_cost,
        )?;

        let saved = self.store.save_wallet(SaveWalletParams::from_wallet(&wallet))?;

        self.unlock(saved.id, password)?;

        tracing::info!(wallet_id = saved.id, name = %saved.name, "wallet imported");
        Ok(saved)
    }

    // -- Session ----------------------------------------------------------

    /// Unlocks one wallet into the vault.
    ///
    /// A wallet that is already resident succeeds as a no-op without
    /// touching the expiry.
    ///
    /// # Errors
    ///
    /// - [`FilvaultError::NotFound`] if the id is unknown.
    /// - [`FilvaultError::InvalidPassword`] if decryption fails.
    pub fn unlock(&self, wallet_id: i32, password: &str) -> Result<()> {
        if self.read_session().vault.contains_key(&wallet_id) {
            return Ok(());
        }

        let wallet = self.store.find_wallet(wallet_id)?;
        let enclave = wallet.unlock(password)?;

        let mut session = self.write_session();
        // A concurrent unlock may have won the race; keep the resident
        // enclave and let ours drop (wiping its pages).
        session.vault.entry(wallet_id).or_insert(enclave);
        session.expires_at = Some(Instant::now() + self.session_ttl);
        Ok(())
    }

    /// Unlocks every stored wallet with one password, atomically.
    ///
    /// All wallets are decrypted into a staging map first; if any of
    /// them rejects the password the live vault is left untouched.
    pub fn unlock_all(&self, password: &str) -> Result<()> {
        let wallets = self.store.get_wallets()?;

        let mut staged: HashMap<i32, SecretBuffer> = HashMap::with_capacity(wallets.len());
        for wallet in &wallets {
            let enclave = wallet.unlock(password)?;
            staged.insert(wallet.id, enclave);
        }

        let mut session = self.write_session();
        session.vault.extend(staged);
        session.expires_at = Some(Instant::now() + self.session_ttl);
        Ok(())
    }

    /// Returns an independent locked copy of a resident private key.
    ///
    /// The caller owns the returned buffer and destroys it by dropping
    /// it. Reading a key does not extend the session.
    ///
    /// # Errors
    ///
    /// - [`FilvaultError::SessionExpired`] once the expiry has passed
    ///   (until the janitor empties the vault).
    /// - [`FilvaultError::NotFound`] if the wallet is not resident.
    pub fn get_key(&self, wallet_id: i32) -> Result<SecretBuffer> {
        let session = self.read_session();

        if let Some(expires_at) = session.expires_at {
            if Instant::now() > expires_at {
                return Err(FilvaultError::SessionExpired);
            }
        }

        let enclave = session
            .vault
            .get(&wallet_id)
            .ok_or(FilvaultError::NotFound)?;
        enclave.duplicate()
    }

    /// Decrypts the persisted seed phrase for a wallet.
    ///
    /// Always re-derives from the stored ciphertext — the vault keeps
    /// keys resident, never seeds.
    pub fn reveal_seed(&self, wallet_id: i32, password: &str) -> Result<Zeroizing<String>> {
        let wallet = self.store.find_wallet(wallet_id)?;
        wallet.decrypt_seed(password)
    }

    /// Empties the vault. Every evicted enclave wipes its pages.
    pub fn lock(&self) {
        let mut session = self.write_session();
        session.vault = HashMap::new();
        session.expires_at = None;
    }

    /// `true` when no usable session exists (empty or expired vault).
    pub fn locked(&self) -> bool {
        let session = self.read_session();
        if let Some(expires_at) = session.expires_at {
            if Instant::now() > expires_at {
                return true;
            }
        }
        session.vault.is_empty()
    }

    // -- Store delegates --------------------------------------------------

    /// Number of persisted wallets. Does not touch the session.
    pub fn count(&self) -> Result<i64> {
        self.store.count_wallets()
    }

    /// Deletes a wallet and evicts any resident enclave for it.
    ///
    /// Terminal: a deleted wallet cannot be resurrected and its
    /// addresses are released for reuse.
    pub fn delete_wallet(&self, wallet_id: i32) -> Result<()> {
        self.store.delete_wallet(wallet_id)?;
        self.write_session().vault.remove(&wallet_id);
        Ok(())
    }

    // -- Shutdown ---------------------------------------------------------

    /// Stops the janitor, empties the vault, and closes the RPC client.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
        self.lock();
        self.rpc.close();
        tracing::info!("vault closed");
    }

    // -- Internals --------------------------------------------------------

    /// Empties the vault if the expiry has passed. Observation and
    /// mutation happen under one write-lock acquisition.
    fn expire_if_due(&self) {
        let mut session = self.write_session();
        if let Some(expires_at) = session.expires_at {
            if Instant::now() > expires_at {
                session.vault = HashMap::new();
                session.expires_at = None;
                tracing::info!("session expired; vault locked");
            }
        }
    }

    fn spawn_janitor(self: &Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(JANITOR_PERIOD);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; swallow it so the
            // real cadence starts one full period out.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if let Some(vault) = weak.upgrade() {
                            vault.lock();
                        }
                        tracing::debug!("session janitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(vault) = weak.upgrade() else { break };
                        // A panicking tick must not take the process
                        // down; the ticker keeps running.
                        let tick = std::panic::catch_unwind(AssertUnwindSafe(|| {
                            vault.expire_if_due();
                        }));
                        if tick.is_err() {
                            tracing::error!("session janitor tick panicked");
                        }
                    }
                }
            }
        });
    }

    fn read_session(&self) -> RwLockReadGuard<'_, SessionState> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
