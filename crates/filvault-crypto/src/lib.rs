//! Cryptographic primitives for the filvault wallet backend.
//!
//! Everything that touches key material lives here:
//!
//! - [`kdf`] — Argon2id password → master-key derivation.
//! - [`aead`] — AES-256-GCM envelope for the seed phrase.
//! - [`keystore`] — scrypt-based keystore envelope for the private key.
//! - [`mnemonic`] — BIP-39 generation, validation, and seed expansion.
//! - [`secp`] — seed → secp256k1 private-key derivation.
//! - [`address`] — chain address derivation (`f1`, `f4`, `0x`).
//! - [`secret`] — page-locked [`secret::SecretBuffer`] for resident keys.
//!
//! All transient buffers holding passwords, keys, seeds, or mnemonics
//! are zeroized on every exit path, including error paths.

pub mod address;
pub mod aead;
pub mod kdf;
pub mod keystore;
pub mod mnemonic;
pub mod secp;
pub mod secret;
