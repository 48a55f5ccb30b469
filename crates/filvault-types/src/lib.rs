//! Core shared types for the filvault wallet backend.
//!
//! This crate defines all fundamental types used across the workspace.
//! No other crate should define shared types — everything lives here.

pub mod config;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Target Filecoin network.
///
/// Determines the address prefix (`f` on mainnet, `t` on calibration)
/// and which per-network data directory the store lives in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Filecoin mainnet.
    #[default]
    Mainnet,
    /// Calibration test network.
    Calibration,
}

impl Network {
    /// Returns `true` for [`Network::Mainnet`].
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::Mainnet)
    }

    /// Single-character address prefix for this network.
    pub fn prefix(&self) -> char {
        match self {
            Self::Mainnet => 'f',
            Self::Calibration => 't',
        }
    }

    /// Parses a network name, falling back to [`Network::Calibration`]
    /// for anything that is not exactly `"mainnet"`.
    pub fn from_name(name: &str) -> Self {
        if name == "mainnet" {
            Self::Mainnet
        } else {
            Self::Calibration
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Calibration => write!(f, "calibration"),
        }
    }
}

// ---------------------------------------------------------------------------
// Env
// ---------------------------------------------------------------------------

/// Deployment environment, used to segment the on-disk data layout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    /// Local development.
    #[default]
    Development,
    /// Production deployment.
    Production,
}

impl Env {
    /// Returns `true` for [`Env::Production`].
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Env {
    type Err = FilvaultError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(FilvaultError::Config {
                reason: format!("invalid environment: {other}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// AddressKind
// ---------------------------------------------------------------------------

/// Address protocol of a derived chain address.
///
/// Discriminants are stable — they are persisted as integers in the
/// address table and must never be renumbered. `F3` is reserved for
/// BLS addresses; derivation currently never emits it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AddressKind {
    /// Unrecognized or not-yet-assigned protocol.
    Unknown = 0,
    /// Filecoin secp256k1 address (`f1…`).
    F1 = 1,
    /// Filecoin BLS address (`f3…`). Reserved, never derived.
    F3 = 2,
    /// Filecoin delegated address under the EVM namespace (`f410…`).
    F4 = 3,
    /// Ethereum `0x` hex address.
    ZeroX = 4,
}

impl AddressKind {
    /// Converts a persisted integer discriminant back to a kind.
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::F1,
            2 => Self::F3,
            3 => Self::F4,
            4 => Self::ZeroX,
            _ => Self::Unknown,
        }
    }

    /// The integer discriminant persisted in the address table.
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::F1 => write!(f, "f1"),
            Self::F3 => write!(f, "f3"),
            Self::F4 => write!(f, "f4"),
            Self::ZeroX => write!(f, "0x"),
        }
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A concrete chain address instance: protocol plus canonical string form.
///
/// Each address belongs to exactly one wallet; the string form is unique
/// across the whole store.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Address protocol.
    pub kind: AddressKind,
    /// Canonical string form (e.g. `f1abc…`, `0xAbC…`).
    pub value: String,
}

impl Address {
    /// Creates an address from a kind and its canonical string form.
    pub fn new(kind: AddressKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Classifies a raw address string by its prefix.
    ///
    /// Recognizes `f1`/`f3`/`f4`/`0x` (and the `t`-prefixed testnet
    /// forms). Fails with [`FilvaultError::Config`] for anything else.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() < 3 {
            return Err(FilvaultError::Config {
                reason: "address too short".into(),
            });
        }

        let prefix = &raw[..2];
        let kind = match prefix {
            "f1" | "t1" => AddressKind::F1,
            "f3" | "t3" => AddressKind::F3,
            "f4" | "t4" => AddressKind::F4,
            "0x" => AddressKind::ZeroX,
            other => {
                return Err(FilvaultError::Config {
                    reason: format!("unknown address prefix: {other}"),
                })
            }
        };

        Ok(Self {
            kind,
            value: raw.to_string(),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// ---------------------------------------------------------------------------
// FilvaultError
// ---------------------------------------------------------------------------

/// Central error type for the filvault system.
///
/// All crates in the workspace convert their internal errors into
/// variants of this enum, ensuring a unified error handling surface.
/// The first six variants map one-to-one onto the stable error codes
/// surfaced to the RPC layer via [`FilvaultError::code`].
#[derive(Debug, Error)]
pub enum FilvaultError {
    /// No wallet with the requested id exists (in the store or the vault).
    #[error("wallet not found")]
    NotFound,

    /// The unlock session has expired; the caller must unlock again.
    #[error("session expired")]
    SessionExpired,

    /// A wallet with the same name or address already exists.
    #[error("wallet already exists")]
    WalletExists,

    /// The supplied password is empty or failed to decrypt the wallet.
    #[error("invalid password")]
    InvalidPassword,

    /// The supplied mnemonic failed BIP-39 validation.
    #[error("invalid seed phrase")]
    InvalidSeedPhrase,

    /// The supplied wallet name is empty.
    #[error("invalid wallet name")]
    InvalidWalletName,

    /// The wallet record carries no encrypted seed phrase.
    #[error("no seed phrase stored for this wallet")]
    MissingSeed,

    /// AEAD or keystore authentication failed.
    ///
    /// Never surfaced through the unlock paths — the wallet layer maps
    /// it to [`FilvaultError::InvalidPassword`] so a mistyped password
    /// is indistinguishable from ciphertext corruption.
    #[error("ciphertext authentication failed")]
    Tampered,

    /// A cryptographic operation failed (derivation, encryption, parsing).
    #[error("crypto error: {reason}")]
    Crypto {
        /// Human-readable description of the cryptographic failure.
        reason: String,
    },

    /// A store operation failed, annotated with the operation name.
    #[error("storage error in {op}: {reason}")]
    Storage {
        /// Name of the failed store operation.
        op: &'static str,
        /// Human-readable description of the storage failure.
        reason: String,
    },

    /// A configuration value is invalid or missing.
    #[error("config error: {reason}")]
    Config {
        /// Human-readable description of the configuration problem.
        reason: String,
    },

    /// The chain RPC collaborator failed.
    #[error("rpc error: {reason}")]
    Rpc {
        /// Human-readable description of the RPC failure.
        reason: String,
    },
}

impl FilvaultError {
    /// Wraps a store-level failure with the operation name.
    pub fn storage(op: &'static str, err: impl fmt::Display) -> Self {
        Self::Storage {
            op,
            reason: err.to_string(),
        }
    }

    /// Stable error code surfaced to the outer RPC layer, if any.
    ///
    /// Internal errors (crypto, storage, config, rpc) have no stable
    /// code and are reported as opaque failures.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::NotFound => Some("wallet_not_found"),
            Self::SessionExpired => Some("session_expired"),
            Self::WalletExists => Some("wallet_exists"),
            Self::InvalidPassword => Some("invalid_password"),
            Self::InvalidSeedPhrase => Some("invalid_seed_phrase"),
            Self::InvalidWalletName => Some("invalid_wallet_name"),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`FilvaultError`].
pub type Result<T> = std::result::Result<T, FilvaultError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
