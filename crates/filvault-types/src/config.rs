//! Vault configuration with validation.
//!
//! The vault is constructed with a fully resolved [`VaultConfig`];
//! collecting the values (config file, environment, CLI) is the
//! bootstrap collaborator's job.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Env, FilvaultError, Network, Result};

/// Default unlock-session lifetime in minutes.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 30;

/// Fully resolved configuration for the vault session manager.
#[derive(Clone, Debug)]
pub struct VaultConfig {
    /// Deployment environment (segments the data layout).
    pub env: Env,

    /// Target network; determines address prefixes and the per-network
    /// database location.
    pub network: Network,

    /// Unlock-session lifetime in minutes. Must be ≥ 1.
    pub session_timeout_minutes: u64,

    /// Application data directory holding the database and settings.
    pub data_dir: PathBuf,

    /// Chain node RPC endpoint URL.
    pub rpc_endpoint: String,

    /// Optional bearer token for the RPC endpoint.
    pub rpc_token: Option<String>,
}

impl VaultConfig {
    /// Validates all configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.session_timeout_minutes == 0 {
            return Err(FilvaultError::Config {
                reason: "session_timeout must be at least 1 minute".into(),
            });
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(FilvaultError::Config {
                reason: "missing app data directory".into(),
            });
        }

        if self.rpc_endpoint.is_empty() {
            return Err(FilvaultError::Config {
                reason: "missing rpc endpoint".into(),
            });
        }

        Ok(())
    }

    /// The session timeout as a [`Duration`].
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> VaultConfig {
        VaultConfig {
            env: Env::Development,
            network: Network::Calibration,
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
            data_dir: PathBuf::from("/tmp/filvault"),
            rpc_endpoint: "https://api.calibration.node.glif.io/rpc/v1".into(),
            rpc_token: None,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn zero_session_timeout_rejected() {
        let cfg = VaultConfig {
            session_timeout_minutes: 0,
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_data_dir_rejected() {
        let cfg = VaultConfig {
            data_dir: PathBuf::new(),
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_rpc_endpoint_rejected() {
        let cfg = VaultConfig {
            rpc_endpoint: String::new(),
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn session_timeout_duration() {
        let cfg = VaultConfig {
            session_timeout_minutes: 2,
            ..valid_config()
        };
        assert_eq!(cfg.session_timeout(), Duration::from_secs(120));
    }
}
