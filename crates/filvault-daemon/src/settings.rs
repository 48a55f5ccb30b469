//! Bootstrap settings file.
//!
//! A single JSON record at `<app_data_dir>/settings.json` persists the
//! chosen network across runs. First run writes the default; an
//! unreadable or unparseable file falls back to the default **without**
//! overwriting it, so a hand-edited file is never clobbered.

use std::io::ErrorKind;
use std::path::Path;

use filvault_types::{FilvaultError, Network, Result};
use serde::{Deserialize, Serialize};

use crate::appdir::restrict_dir_mode;

/// File name of the bootstrap record inside the app data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Persisted bootstrap settings.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Selected network; defaults to mainnet on first run.
    pub network: Network,
}

/// Loads the settings file, creating it with defaults on first run.
pub fn load_or_init(data_dir: &Path) -> Result<Settings> {
    std::fs::create_dir_all(data_dir).map_err(|e| FilvaultError::Config {
        reason: format!("create app data directory {}: {e}", data_dir.display()),
    })?;
    restrict_dir_mode(data_dir)?;

    let path = data_dir.join(SETTINGS_FILE);
    match std::fs::read(&path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "settings file unparseable; using defaults without overwriting"
                );
                Ok(Settings::default())
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let settings = Settings::default();
            let json = serde_json::to_vec_pretty(&settings).map_err(|e| {
                FilvaultError::Config {
                    reason: format!("serialize default settings: {e}"),
                }
            })?;

            std::fs::write(&path, json).map_err(|e| FilvaultError::Config {
                reason: format!("write {}: {e}", path.display()),
            })?;
            restrict_file_mode(&path)?;

            tracing::info!(path = %path.display(), "settings file created with defaults");
            Ok(settings)
        }
        Err(e) => Err(FilvaultError::Config {
            reason: format!("read {}: {e}", path.display()),
        }),
    }
}

/// Applies mode `0640` to the settings file.
#[cfg(unix)]
fn restrict_file_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o640)).map_err(|e| {
        FilvaultError::Config {
            reason: format!("set permissions on {}: {e}", path.display()),
        }
    })
}

#[cfg(not(unix))]
fn restrict_file_mode(_path: &Path) -> Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
