//! Platform-appropriate application data directory resolution.
//!
//! - Linux:   `$XDG_DATA_HOME/<app>` or `~/.local/share/<app>`
//! - macOS:   `~/Library/Application Support/<app>`
//! - Windows: `%LOCALAPPDATA%\<app>`
//! - Other:   `<user-cache-dir>/<app>`
//!
//! Below the base, data is segmented per environment and network:
//! `<base>/<env>/<network>/` holds the database, with `logs/` next to
//! it for rotated log files.

use std::path::{Path, PathBuf};

use filvault_types::{Env, FilvaultError, Network, Result};

/// Application name used for the data directory.
pub const APP_NAME: &str = "filvault";

/// Resolves the base application data directory for this platform.
pub fn app_data_dir(app_name: &str) -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            if !xdg.is_empty() {
                return Ok(PathBuf::from(xdg).join(app_name));
            }
        }
        dirs::home_dir()
            .map(|home| home.join(".local").join("share").join(app_name))
            .ok_or_else(|| FilvaultError::Config {
                reason: "failed to resolve home directory".into(),
            })
    } else if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|home| home.join("Library").join("Application Support").join(app_name))
            .ok_or_else(|| FilvaultError::Config {
                reason: "failed to resolve home directory".into(),
            })
    } else if cfg!(target_os = "windows") {
        match std::env::var("LOCALAPPDATA") {
            Ok(local) if !local.is_empty() => Ok(PathBuf::from(local).join(app_name)),
            _ => Err(FilvaultError::Config {
                reason: "LOCALAPPDATA environment variable not set".into(),
            }),
        }
    } else {
        dirs::cache_dir()
            .map(|cache| cache.join(app_name))
            .ok_or_else(|| FilvaultError::Config {
                reason: "failed to resolve cache directory".into(),
            })
    }
}

/// Creates and returns `<base>/<env>/<network>/`.
pub fn network_data_dir(base: &Path, env: Env, network: Network) -> Result<PathBuf> {
    let dir = base.join(env.to_string()).join(network.to_string());

    std::fs::create_dir_all(&dir).map_err(|e| FilvaultError::Config {
        reason: format!("create data directory {}: {e}", dir.display()),
    })?;
    restrict_dir_mode(&dir)?;

    Ok(dir)
}

/// Applies mode `0750` to a data directory.
#[cfg(unix)]
pub fn restrict_dir_mode(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o750)).map_err(|e| {
        FilvaultError::Config {
            reason: format!("set permissions on {}: {e}", dir.display()),
        }
    })
}

#[cfg(not(unix))]
pub fn restrict_dir_mode(_dir: &Path) -> Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dir_ends_with_app_name() -> Result<()> {
        let dir = app_data_dir(APP_NAME)?;
        assert!(dir.ends_with(APP_NAME));
        Ok(())
    }

    #[test]
    fn network_dir_is_segmented_and_created() -> Result<()> {
        let tmp = tempfile::tempdir().map_err(|e| FilvaultError::Config {
            reason: e.to_string(),
        })?;

        let dir = network_data_dir(tmp.path(), Env::Development, Network::Calibration)?;
        assert!(dir.is_dir());
        assert!(dir.ends_with("development/calibration"));

        let mainnet = network_data_dir(tmp.path(), Env::Development, Network::Mainnet)?;
        assert_ne!(dir, mainnet);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn network_dir_mode_is_0750() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().map_err(|e| FilvaultError::Config {
            reason: e.to_string(),
        })?;
        let dir = network_data_dir(tmp.path(), Env::Production, Network::Mainnet)?;

        let mode = std::fs::metadata(&dir)
            .map_err(|e| FilvaultError::Config {
                reason: e.to_string(),
            })?
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o750);
        Ok(())
    }
}
