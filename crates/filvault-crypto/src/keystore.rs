//! scrypt-based keystore envelope for the wallet private key.
//!
//! The private key is persisted as a version-3 keystore JSON document
//! (the de-facto standard for Ethereum key files), keyed by the hex
//! form of the Argon2id master key:
//!
//! 1. `dk = scrypt(passphrase, salt, n, r=8, p=1, dklen=32)`
//! 2. `ciphertext = AES-128-CTR(dk[..16], iv, private_key)`
//! 3. `mac = keccak256(dk[16..32] || ciphertext)`
//!
//! Decryption verifies the MAC in constant time before touching the
//! ciphertext. The envelope duplicates the protection already provided
//! by the Argon2id master key, but is retained for interoperability
//! with existing key files.

use aes::cipher::{KeyIvInit, StreamCipher};
use filvault_types::{FilvaultError, Result};
use k256::SecretKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::address::eth_address;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Keystore document version this module reads and writes.
pub const KEYSTORE_VERSION: u32 = 3;

/// Standard scrypt cost: `n = 2^18`. This is the persisted-wallet
/// contract for production key files.
pub const STANDARD_SCRYPT_LOG_N: u8 = 18;

/// Reduced scrypt cost for tests: `n = 2^12`.
pub const LIGHT_SCRYPT_LOG_N: u8 = 12;

const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const DKLEN: usize = 32;
const SALT_LEN: usize = 32;
const IV_LEN: usize = 16;

// ---------------------------------------------------------------------------
// JSON document
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct KeystoreJson {
    address: String,
    crypto: CryptoJson,
    id: String,
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct CryptoJson {
    cipher: String,
    ciphertext: String,
    cipherparams: CipherParamsJson,
    kdf: String,
    kdfparams: KdfParamsJson,
    mac: String,
}

#[derive(Serialize, Deserialize)]
struct CipherParamsJson {
    iv: String,
}

#[derive(Serialize, Deserialize)]
struct KdfParamsJson {
    dklen: u32,
    n: u64,
    p: u32,
    r: u32,
    salt: String,
}

// ---------------------------------------------------------------------------
// Encrypt
// ---------------------------------------------------------------------------

/// Encrypts a private key into a keystore JSON document at the
/// standard scrypt cost.
pub fn encrypt_keystore(private_key: &SecretKey, passphrase: &str) -> Result<Vec<u8>> {
    encrypt_keystore_with_cost(private_key, passphrase, STANDARD_SCRYPT_LOG_N)
}

/// Encrypts a private key with an explicit scrypt cost.
///
/// `log_n` is the base-2 logarithm of the scrypt work factor. Anything
/// below [`STANDARD_SCRYPT_LOG_N`] is only appropriate for tests.
pub fn encrypt_keystore_with_cost(
    private_key: &SecretKey,
    passphrase: &str,
    log_n: u8,
) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let mut dk = Zeroizing::new([0u8; DKLEN]);
    run_scrypt(passphrase.as_bytes(), &salt, log_n, &mut *dk)?;

    // AES-128-CTR over the raw 32 key bytes with dk[..16].
    let mut buf = Zeroizing::new([0u8; 32]);
    buf.copy_from_slice(&private_key.to_bytes());
    apply_ctr(&dk[..16], &iv, &mut *buf)?;
    let ciphertext = buf.to_vec();

    let mac = keystore_mac(&dk[16..32], &ciphertext);

    let doc = KeystoreJson {
        address: hex::encode(eth_address(&private_key.public_key())),
        crypto: CryptoJson {
            cipher: "aes-128-ctr".into(),
            ciphertext: hex::encode(&ciphertext),
            cipherparams: CipherParamsJson {
                iv: hex::encode(iv),
            },
            kdf: "scrypt".into(),
            kdfparams: KdfParamsJson {
                dklen: DKLEN as u32,
                n: 1u64 << log_n,
                p: SCRYPT_P,
                r: SCRYPT_R,
                salt: hex::encode(salt),
            },
            mac: hex::encode(mac),
        },
        id: uuid::Uuid::new_v4().to_string(),
        version: KEYSTORE_VERSION,
    };

    serde_json::to_vec(&doc).map_err(|e| FilvaultError::Crypto {
        reason: format!("serialize keystore: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Decrypt
// ---------------------------------------------------------------------------

/// Opens a keystore JSON document and returns the 32 raw key bytes.
///
/// # Errors
///
/// - [`FilvaultError::Crypto`] for malformed documents, unsupported
///   cipher/KDF combinations, or invalid parameters.
/// - [`FilvaultError::Tampered`] if the MAC does not verify — a wrong
///   passphrase and a corrupted document are indistinguishable.
pub fn decrypt_keystore(json: &[u8], passphrase: &str) -> Result<Zeroizing<[u8; 32]>> {
    let doc: KeystoreJson = serde_json::from_slice(json).map_err(|e| FilvaultError::Crypto {
        reason: format!("parse keystore: {e}"),
    })?;

    if doc.version != KEYSTORE_VERSION {
        return Err(FilvaultError::Crypto {
            reason: format!("unsupported keystore version {}", doc.version),
        });
    }
    if doc.crypto.cipher != "aes-128-ctr" {
        return Err(FilvaultError::Crypto {
            reason: format!("unsupported keystore cipher {}", doc.crypto.cipher),
        });
    }
    if doc.crypto.kdf != "scrypt" {
        return Err(FilvaultError::Crypto {
            reason: format!("unsupported keystore kdf {}", doc.crypto.kdf),
        });
    }

    let params = &doc.crypto.kdfparams;
    if params.dklen as usize != DKLEN || params.r != SCRYPT_R || params.p != SCRYPT_P {
        return Err(FilvaultError::Crypto {
            reason: "unsupported scrypt parameters".into(),
        });
    }
    if !params.n.is_power_of_two() || params.n < 2 {
        return Err(FilvaultError::Crypto {
            reason: format!("invalid scrypt n: {}", params.n),
        });
    }
    let log_n = params.n.trailing_zeros() as u8;

    let salt = decode_hex("kdfparams.salt", &params.salt)?;
    let iv = decode_hex("cipherparams.iv", &doc.crypto.cipherparams.iv)?;
    let ciphertext = decode_hex("ciphertext", &doc.crypto.ciphertext)?;
    let mac = decode_hex("mac", &doc.crypto.mac)?;

    if iv.len() != IV_LEN {
        return Err(FilvaultError::Crypto {
            reason: format!("invalid iv length {}", iv.len()),
        });
    }
    if ciphertext.len() != 32 {
        return Err(FilvaultError::Crypto {
            reason: format!("invalid ciphertext length {}", ciphertext.len()),
        });
    }

    let mut dk = Zeroizing::new([0u8; DKLEN]);
    run_scrypt(passphrase.as_bytes(), &salt, log_n, &mut *dk)?;

    // Constant-time MAC verification before any decryption.
    let expected = keystore_mac(&dk[16..32], &ciphertext);
    if !bool::from(mac.as_slice().ct_eq(&expected)) {
        return Err(FilvaultError::Tampered);
    }

    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&ciphertext);
    apply_ctr(&dk[..16], &iv, &mut *out)?;

    Ok(out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn apply_ctr(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()> {
    let mut cipher =
        Aes128Ctr::new_from_slices(key, iv).map_err(|e| FilvaultError::Crypto {
            reason: format!("invalid AES-CTR key/iv length: {e}"),
        })?;
    cipher.apply_keystream(buf);
    Ok(())
}

fn run_scrypt(passphrase: &[u8], salt: &[u8], log_n: u8, out: &mut [u8]) -> Result<()> {
    let params =
        scrypt::Params::new(log_n, SCRYPT_R, SCRYPT_P, DKLEN).map_err(|e| {
            FilvaultError::Crypto {
                reason: format!("invalid scrypt parameters: {e}"),
            }
        })?;

    scrypt::scrypt(passphrase, salt, &params, out).map_err(|e| FilvaultError::Crypto {
        reason: format!("scrypt derivation failed: {e}"),
    })
}

fn keystore_mac(dk_tail: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(dk_tail);
    hasher.update(ciphertext);
    hasher.finalize().into()
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| FilvaultError::Crypto {
        reason: format!("invalid hex in keystore {field}: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
