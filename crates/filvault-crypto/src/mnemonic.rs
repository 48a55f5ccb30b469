//! BIP-39 mnemonic generation, validation, and seed expansion.
//!
//! Entropy sizes are restricted to 128 bits (12 words) and 256 bits
//! (24 words); any other request is silently normalized to 128. Seed
//! expansion always uses an empty BIP-39 passphrase.

use bip39::Mnemonic;
use filvault_types::{FilvaultError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ---------------------------------------------------------------------------
// Seed
// ---------------------------------------------------------------------------

/// The 64-byte PBKDF2 expansion of a mnemonic. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Fixed byte length of a BIP-39 seed.
    pub const LEN: usize = 64;

    /// Raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

// Seed does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generates a fresh BIP-39 mnemonic from OS entropy.
///
/// `bits` selects the entropy size: 128 (12 words) or 256 (24 words).
/// Any other value falls back to 128. The returned phrase is zeroized
/// on drop; it is handed to the user exactly once for transcription.
pub fn generate_mnemonic(bits: usize) -> Result<Zeroizing<String>> {
    let entropy_len = match bits {
        256 => 32,
        _ => 16,
    };

    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy[..entropy_len]);

    let result = Mnemonic::from_entropy(&entropy[..entropy_len])
        .map(|m| Zeroizing::new(m.to_string()))
        .map_err(|e| FilvaultError::Crypto {
            reason: format!("generate mnemonic: {e}"),
        });

    entropy.zeroize();
    result
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Checks a phrase against the BIP-39 English wordlist and checksum.
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_normalized(phrase).is_ok()
}

// ---------------------------------------------------------------------------
// Seed expansion
// ---------------------------------------------------------------------------

/// Expands a mnemonic into its 64-byte seed (empty passphrase).
///
/// # Errors
///
/// Returns [`FilvaultError::InvalidSeedPhrase`] if the phrase fails
/// wordlist or checksum validation.
pub fn mnemonic_to_seed(phrase: &str) -> Result<Seed> {
    let mnemonic =
        Mnemonic::parse_normalized(phrase).map_err(|_| FilvaultError::InvalidSeedPhrase)?;

    Ok(Seed(mnemonic.to_seed_normalized("")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// BIP-39 test vector: 128 bits of zero entropy.
    const VECTOR_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generate_128_gives_12_words() -> Result<()> {
        let phrase = generate_mnemonic(128)?;
        assert_eq!(phrase.split_whitespace().count(), 12);
        Ok(())
    }

    #[test]
    fn generate_256_gives_24_words() -> Result<()> {
        let phrase = generate_mnemonic(256)?;
        assert_eq!(phrase.split_whitespace().count(), 24);
        Ok(())
    }

    #[test]
    fn odd_sizes_normalize_to_128() -> Result<()> {
        for bits in [0, 64, 160, 192, 512] {
            let phrase = generate_mnemonic(bits)?;
            assert_eq!(phrase.split_whitespace().count(), 12, "bits = {bits}");
        }
        Ok(())
    }

    #[test]
    fn generated_phrase_validates() -> Result<()> {
        let phrase = generate_mnemonic(128)?;
        assert!(validate_mnemonic(&phrase));
        Ok(())
    }

    #[test]
    fn two_generations_differ() -> Result<()> {
        let a = generate_mnemonic(128)?;
        let b = generate_mnemonic(128)?;
        assert_ne!(a.as_str(), b.as_str());
        Ok(())
    }

    #[test]
    fn known_vector_validates() {
        assert!(validate_mnemonic(VECTOR_12));
    }

    #[test]
    fn bad_checksum_rejected() {
        // 12 × "abandon" has an invalid checksum (the last word must be "about").
        let phrase = ["abandon"; 12].join(" ");
        assert!(!validate_mnemonic(&phrase));
    }

    #[test]
    fn unknown_word_rejected() {
        let phrase = VECTOR_12.replace("about", "aboat");
        assert!(!validate_mnemonic(&phrase));
    }

    #[test]
    fn wrong_word_count_rejected() {
        assert!(!validate_mnemonic("abandon abandon abandon"));
    }

    /// TREZOR reference vector: all-zero 128-bit entropy, empty passphrase.
    #[test]
    fn seed_matches_reference_vector() -> Result<()> {
        let seed = mnemonic_to_seed(VECTOR_12)?;
        let expected = "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
                        9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4";
        assert_eq!(hex::encode(seed.as_bytes()), expected);
        Ok(())
    }

    #[test]
    fn seed_rejects_invalid_phrase() {
        let result = mnemonic_to_seed("definitely not a mnemonic");
        assert!(matches!(result, Err(FilvaultError::InvalidSeedPhrase)));
    }

    #[test]
    fn seed_is_deterministic() -> Result<()> {
        let a = mnemonic_to_seed(VECTOR_12)?;
        let b = mnemonic_to_seed(VECTOR_12)?;
        assert_eq!(a.as_bytes(), b.as_bytes());
        Ok(())
    }
}
