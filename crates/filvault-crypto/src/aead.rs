//! AES-256-GCM authenticated encryption for the seed-phrase envelope.
//!
//! Ciphertexts are self-contained: a fresh 12-byte random nonce is
//! prefixed to the GCM output (`nonce || ciphertext || tag`). The
//! layout is part of the persisted-wallet contract.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use filvault_types::{FilvaultError, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Byte length of the GCM nonce prefixed to every ciphertext.
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag appended by the cipher.
pub const TAG_LEN: usize = 16;

/// Encrypts `plaintext` under a 256-bit key.
///
/// Returns `nonce || ciphertext || tag`. The nonce is drawn from the
/// OS CSPRNG for every call; a key/nonce pair is never reused.
///
/// # Errors
///
/// Returns [`FilvaultError::Crypto`] if the underlying cipher fails.
pub fn encrypt_aes_gcm(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| FilvaultError::Crypto {
            reason: format!("AES-GCM encryption failed: {e}"),
        })?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts a `nonce || ciphertext || tag` envelope.
///
/// # Errors
///
/// - [`FilvaultError::Crypto`] if the input is shorter than a nonce
///   plus tag.
/// - [`FilvaultError::Tampered`] if tag verification fails (wrong key
///   or modified ciphertext — indistinguishable by design).
pub fn decrypt_aes_gcm(data: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(FilvaultError::Crypto {
            reason: format!(
                "ciphertext too short: expected at least {} bytes, got {}",
                NONCE_LEN + TAG_LEN,
                data.len()
            ),
        });
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| FilvaultError::Tampered)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
