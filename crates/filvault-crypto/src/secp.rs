//! Seed → secp256k1 private-key derivation.
//!
//! The wallet uses a single account key: SHA-256 over the first 32
//! bytes of the BIP-39 seed, interpreted as a secp256k1 scalar. The
//! curve library rejects a digest of zero or one at or above the group
//! order; no retry is performed — the probability is negligible and
//! existing wallets assume acceptance of every other digest.

use filvault_types::{FilvaultError, Result};
use k256::SecretKey;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

/// Minimum seed length accepted by [`derive_private_key`].
pub const MIN_SEED_LEN: usize = 32;

/// Derives the wallet's secp256k1 private key from a BIP-39 seed.
///
/// # Errors
///
/// - [`FilvaultError::Crypto`] if the seed is shorter than 32 bytes or
///   the digest is not a valid scalar.
pub fn derive_private_key(seed: &[u8]) -> Result<SecretKey> {
    if seed.len() < MIN_SEED_LEN {
        return Err(FilvaultError::Crypto {
            reason: "seed too short".into(),
        });
    }

    let mut digest: [u8; 32] = Sha256::digest(&seed[..MIN_SEED_LEN]).into();

    let result = SecretKey::from_slice(&digest).map_err(|e| FilvaultError::Crypto {
        reason: format!("digest is not a valid secp256k1 scalar: {e}"),
    });

    digest.zeroize();
    result
}

/// Exports the raw 32 scalar bytes of a private key.
///
/// The returned buffer is zeroized on drop; the key itself wipes its
/// internal scalar when dropped.
pub fn export_key_bytes(key: &SecretKey) -> Zeroizing<[u8; 32]> {
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&key.to_bytes());
    out
}

/// Overwrites an exported scalar buffer with zeros.
///
/// Call on every copy of the raw key bytes once they have been moved
/// into an enclave or are no longer needed.
pub fn wipe_key_bytes(bytes: &mut [u8]) {
    bytes.zeroize();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
