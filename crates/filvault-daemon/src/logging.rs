//! Tracing setup with daily-rotated file logs.
//!
//! Logs go to stdout and to `<data_dir>/logs/filvault.log.<date>`.
//! Rotation is daily; retention is enforced at startup by pruning
//! files beyond the configured backup count or age.

use std::path::Path;
use std::time::{Duration, SystemTime};

use filvault_types::{FilvaultError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::config::LogConfig;

/// Base name of the rotated log files.
const LOG_FILE_PREFIX: &str = "filvault.log";

/// Initializes the global tracing subscriber.
///
/// Returns the appender guard; dropping it flushes buffered log lines,
/// so the caller keeps it alive for the process lifetime.
pub fn init(log_dir: &Path, cfg: &LogConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).map_err(|e| FilvaultError::Config {
        reason: format!("create log directory {}: {e}", log_dir.display()),
    })?;

    prune_old_logs(log_dir, cfg.max_backups, cfg.max_age_days);

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cfg.level.clone()));

    // try_init: tests may install a subscriber first; the daemon only
    // ever calls this once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(file_writer.and(std::io::stdout))
        .try_init();

    Ok(guard)
}

/// Removes rotated log files beyond the retention policy.
///
/// Keeps the newest `max_backups` files and drops anything older than
/// `max_age_days`. Failures are logged and ignored; retention must
/// never take the process down.
fn prune_old_logs(log_dir: &Path, max_backups: usize, max_age_days: u64) {
    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut logs: Vec<(std::path::PathBuf, SystemTime)> = entries
        .flatten()
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(LOG_FILE_PREFIX)
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((entry.path(), modified))
        })
        .collect();

    // Newest first.
    logs.sort_by(|a, b| b.1.cmp(&a.1));

    let cutoff = SystemTime::now().checked_sub(Duration::from_secs(max_age_days * 24 * 60 * 60));

    for (index, (path, modified)) in logs.iter().enumerate() {
        let too_many = index >= max_backups;
        let too_old = cutoff.is_some_and(|cutoff| *modified < cutoff);
        if too_many || too_old {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to prune log file");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_keeps_newest_backups() {
        let tmp = tempfile::tempdir().expect("tempdir");

        for i in 0..5 {
            let path = tmp.path().join(format!("{LOG_FILE_PREFIX}.2026-01-0{}", i + 1));
            std::fs::write(&path, b"log line").unwrap();
        }
        // An unrelated file must survive pruning.
        std::fs::write(tmp.path().join("unrelated.txt"), b"keep me").unwrap();

        prune_old_logs(tmp.path(), 2, 365);

        let remaining: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();

        let log_count = remaining
            .iter()
            .filter(|name| name.starts_with(LOG_FILE_PREFIX))
            .count();
        assert_eq!(log_count, 2);
        assert!(remaining.iter().any(|name| name == "unrelated.txt"));
    }

    #[test]
    fn prune_missing_dir_is_harmless() {
        prune_old_logs(Path::new("/nonexistent/filvault-logs"), 3, 7);
    }
}
