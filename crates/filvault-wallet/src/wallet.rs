//! The wallet data object: creation, unlock, and seed recovery.
//!
//! At rest a wallet consists of a keystore-encrypted private key, an
//! AEAD-encrypted mnemonic, and the 32-byte salt both envelopes hang
//! off. Unlocking re-derives the master key from the password and the
//! stored salt; the decrypted key bytes move straight into a
//! [`SecretBuffer`] and every intermediate copy is wiped.

use chrono::{DateTime, Utc};
use filvault_crypto::aead::{decrypt_aes_gcm, encrypt_aes_gcm};
use filvault_crypto::address::derive_addresses;
use filvault_crypto::kdf::{derive_master_key, Argon2Params, SALT_LEN};
use filvault_crypto::keystore::{
    decrypt_keystore, encrypt_keystore_with_cost, STANDARD_SCRYPT_LOG_N,
};
use filvault_crypto::mnemonic::mnemonic_to_seed;
use filvault_crypto::secp::derive_private_key;
use filvault_crypto::secret::SecretBuffer;
use filvault_types::{Address, FilvaultError, Network, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// A persisted wallet row with its eagerly loaded address set.
///
/// # Invariants
///
/// - `salt` is exactly 32 bytes, generated once at creation, never
///   rotated.
/// - `encrypted_key_json` is the scrypt keystore envelope of the
///   32-byte private key, keyed by the hex master key.
/// - `encrypted_seed` is the AES-GCM envelope of the mnemonic under
///   the raw master key.
/// - `addresses` holds at least one entry; for newly created wallets
///   it is exactly `[F1, F4, 0x]`.
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Store-assigned identity; `0` until persisted.
    pub id: i32,
    /// Exactly one wallet per store is the default.
    pub is_default: bool,
    /// Human label, unique per store.
    pub name: String,
    /// Derived chain addresses, in stable `[F1, F4, 0x]` order.
    pub addresses: Vec<Address>,
    /// 32-byte Argon2id salt.
    pub salt: Vec<u8>,
    /// scrypt keystore envelope around the private key.
    pub encrypted_key_json: Vec<u8>,
    /// AES-GCM envelope around the mnemonic (nonce prefixed).
    pub encrypted_seed: Vec<u8>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    // -- Creation ---------------------------------------------------------

    /// Builds an unpersisted wallet from a mnemonic at the standard
    /// keystore cost.
    ///
    /// The returned wallet has `id = 0` and `is_default = false`; both
    /// are assigned by the store on save.
    pub fn create_new(
        mnemonic: &str,
        name: &str,
        password: &str,
        network: Network,
    ) -> Result<Self> {
        Self::create_with_cost(mnemonic, name, password, network, STANDARD_SCRYPT_LOG_N)
    }

    /// Builds an unpersisted wallet with an explicit scrypt cost.
    ///
    /// Costs below the standard one are only appropriate for tests;
    /// unlock reads the cost back out of the persisted envelope, so
    /// wallets created at any cost stay readable.
    pub fn create_with_cost(
        mnemonic: &str,
        name: &str,
        password: &str,
        network: Network,
        scrypt_log_n: u8,
    ) -> Result<Self> {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let seed = mnemonic_to_seed(mnemonic)?;
        let private_key = derive_private_key(seed.as_bytes())?;

        let master = derive_master_key(password, &salt, &Argon2Params::default())?;

        let encrypted_key_json =
            encrypt_keystore_with_cost(&private_key, &master.to_passphrase(), scrypt_log_n)?;
        let encrypted_seed = encrypt_aes_gcm(mnemonic.as_bytes(), master.as_bytes())?;

        let addresses = derive_addresses(&private_key.public_key(), network)?;

        let now = Utc::now();
        Ok(Self {
            id: 0,
            is_default: false,
            name: name.to_string(),
            addresses,
            salt,
            encrypted_key_json,
            encrypted_seed,
            created_at: now,
            updated_at: now,
        })
    }

    // -- Unlock -----------------------------------------------------------

    /// Decrypts the private key into a fresh page-locked enclave.
    ///
    /// The returned [`SecretBuffer`] is the sole live reference to the
    /// key material; all heap intermediates are zeroized before this
    /// returns.
    ///
    /// # Errors
    ///
    /// - [`FilvaultError::InvalidPassword`] if the keystore MAC does
    ///   not verify. A wrong password and a corrupted envelope are
    ///   indistinguishable to the caller.
    pub fn unlock(&self, password: &str) -> Result<SecretBuffer> {
        let master = derive_master_key(password, &self.salt, &Argon2Params::default())?;

        let mut key_bytes = decrypt_keystore(&self.encrypted_key_json, &master.to_passphrase())
            .map_err(password_failure)?;

        SecretBuffer::new(&mut *key_bytes)
    }

    /// Decrypts the stored mnemonic.
    ///
    /// # Errors
    ///
    /// - [`FilvaultError::MissingSeed`] if no seed ciphertext is stored.
    /// - [`FilvaultError::InvalidPassword`] on AEAD tag mismatch.
    pub fn decrypt_seed(&self, password: &str) -> Result<Zeroizing<String>> {
        if self.encrypted_seed.is_empty() {
            return Err(FilvaultError::MissingSeed);
        }

        let master = derive_master_key(password, &self.salt, &Argon2Params::default())?;

        let plaintext =
            decrypt_aes_gcm(&self.encrypted_seed, master.as_bytes()).map_err(password_failure)?;

        match String::from_utf8(plaintext) {
            Ok(phrase) => Ok(Zeroizing::new(phrase)),
            Err(e) => {
                let mut bad = e.into_bytes();
                bad.zeroize();
                Err(FilvaultError::Crypto {
                    reason: "decrypted seed is not valid UTF-8".into(),
                })
            }
        }
    }

    // -- Validation -------------------------------------------------------

    /// Checks the structural invariants of a persisted row.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(FilvaultError::InvalidWalletName);
        }
        if self.salt.len() != SALT_LEN {
            return Err(FilvaultError::Crypto {
                reason: format!("wallet salt must be {SALT_LEN} bytes, got {}", self.salt.len()),
            });
        }
        if self.encrypted_key_json.is_empty() {
            return Err(FilvaultError::Crypto {
                reason: "wallet has no encrypted key".into(),
            });
        }
        if self.encrypted_seed.is_empty() {
            return Err(FilvaultError::MissingSeed);
        }
        if self.addresses.is_empty() {
            return Err(FilvaultError::Crypto {
                reason: "wallet has no addresses".into(),
            });
        }
        Ok(())
    }
}

/// Collapses authentication failures into the password error the
/// unlock surface promises.
fn password_failure(err: FilvaultError) -> FilvaultError {
    match err {
        FilvaultError::Tampered => FilvaultError::InvalidPassword,
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
