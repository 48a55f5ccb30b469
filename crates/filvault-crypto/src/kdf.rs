//! Argon2id master-key derivation.
//!
//! A user password plus a per-wallet random salt is stretched into a
//! 256-bit master key. The master key serves double duty: the raw
//! bytes key the AES-GCM seed envelope, and the lowercase-hex form is
//! the passphrase for the scrypt keystore envelope. The hex form is
//! part of the on-disk contract — changing it breaks existing wallets.

use filvault_types::{FilvaultError, Result};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ---------------------------------------------------------------------------
// Argon2Params
// ---------------------------------------------------------------------------

/// Tuning parameters for the Argon2id key derivation function.
///
/// # Defaults
///
/// | Parameter | Default | Meaning |
/// |-----------|---------|---------|
/// | `m_cost`  | 65 536  | Memory usage in KiB (64 MiB) |
/// | `t_cost`  | 1       | Number of iterations |
/// | `p_cost`  | 4       | Degree of parallelism |
///
/// The defaults are the persisted-wallet contract: every stored wallet
/// was encrypted under these values, so they must never change for the
/// unlock path.
#[derive(Clone, Copy, Debug)]
pub struct Argon2Params {
    /// Memory cost in KiB. Must be ≥ 8 × `p_cost`.
    pub m_cost: u32,
    /// Time cost (number of passes). Must be ≥ 1.
    pub t_cost: u32,
    /// Parallelism degree. Must be ≥ 1.
    pub p_cost: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            m_cost: 64 * 1024,
            t_cost: 1,
            p_cost: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// MasterKey
// ---------------------------------------------------------------------------

/// 256-bit master key derived by Argon2id.
///
/// Zeroized on drop. Does not implement `Clone` or `Debug` to prevent
/// accidental copies or leakage through logs.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; 32]);

impl MasterKey {
    /// Fixed byte length of the master key.
    pub const LEN: usize = 32;

    /// Raw key bytes, used directly as the AES-256-GCM key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 64-character lowercase hex form, used as the keystore-envelope
    /// passphrase. The returned string is zeroized on drop.
    pub fn to_passphrase(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Required salt length: a fresh 32-byte salt is generated once per
/// wallet at creation and never rotated.
pub const SALT_LEN: usize = 32;

/// Derives the 256-bit master key from a password and a 32-byte salt.
///
/// # Errors
///
/// - [`FilvaultError::Crypto`] if the salt has the wrong length, the
///   parameters are invalid, or the Argon2 computation fails.
pub fn derive_master_key(
    password: &str,
    salt: &[u8],
    params: &Argon2Params,
) -> Result<MasterKey> {
    if salt.len() != SALT_LEN {
        return Err(FilvaultError::Crypto {
            reason: format!("salt must be {SALT_LEN} bytes, got {}", salt.len()),
        });
    }

    let argon2_params = argon2::Params::new(
        params.m_cost,
        params.t_cost,
        params.p_cost,
        Some(MasterKey::LEN),
    )
    .map_err(|e| FilvaultError::Crypto {
        reason: format!("invalid Argon2 parameters: {e}"),
    })?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|e| FilvaultError::Crypto {
            reason: format!("Argon2id derivation failed: {e}"),
        })?;

    Ok(MasterKey(output))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Light parameters suitable for fast unit tests.
    fn test_params() -> Argon2Params {
        Argon2Params {
            m_cost: 256,
            t_cost: 1,
            p_cost: 1,
        }
    }

    #[test]
    fn derivation_is_deterministic() -> Result<()> {
        let salt = [7u8; SALT_LEN];
        let k1 = derive_master_key("hunter2", &salt, &test_params())?;
        let k2 = derive_master_key("hunter2", &salt, &test_params())?;
        assert_eq!(k1.as_bytes(), k2.as_bytes());
        Ok(())
    }

    #[test]
    fn different_password_different_key() -> Result<()> {
        let salt = [7u8; SALT_LEN];
        let a = derive_master_key("password_a", &salt, &test_params())?;
        let b = derive_master_key("password_b", &salt, &test_params())?;
        assert_ne!(a.as_bytes(), b.as_bytes());
        Ok(())
    }

    #[test]
    fn different_salt_different_key() -> Result<()> {
        let a = derive_master_key("same", &[1u8; SALT_LEN], &test_params())?;
        let b = derive_master_key("same", &[2u8; SALT_LEN], &test_params())?;
        assert_ne!(a.as_bytes(), b.as_bytes());
        Ok(())
    }

    #[test]
    fn short_salt_rejected() {
        let result = derive_master_key("pw", &[0u8; 16], &test_params());
        assert!(result.is_err());
    }

    #[test]
    fn zero_t_cost_rejected() {
        let params = Argon2Params {
            t_cost: 0,
            ..test_params()
        };
        assert!(derive_master_key("pw", &[0u8; SALT_LEN], &params).is_err());
    }

    #[test]
    fn passphrase_is_64_hex_chars() -> Result<()> {
        let key = derive_master_key("pw", &[3u8; SALT_LEN], &test_params())?;
        let passphrase = key.to_passphrase();
        assert_eq!(passphrase.len(), 64);
        assert!(passphrase.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(passphrase.as_str(), hex::encode(key.as_bytes()));
        Ok(())
    }

    #[test]
    fn default_params_match_persisted_contract() {
        let params = Argon2Params::default();
        assert_eq!(params.m_cost, 65_536);
        assert_eq!(params.t_cost, 1);
        assert_eq!(params.p_cost, 4);
    }
}
