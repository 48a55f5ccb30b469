//! filvault daemon entry point.
//!
//! Resolves configuration, bootstraps the per-network data directory
//! and settings file, opens the store, constructs the vault, and runs
//! until interrupted.

mod appdir;
mod config;
mod logging;
mod settings;

use std::sync::Arc;

use filvault_store::{SqliteStore, WalletStore};
use filvault_types::config::VaultConfig;
use filvault_types::{FilvaultError, Result};
use filvault_vault::Vault;

use crate::config::{CliArgs, DaemonConfig};

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse_from_env();

    let cfg = match DaemonConfig::resolve(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cfg).await {
        tracing::error!(error = %e, "daemon failed");
        eprintln!("filvault-daemon: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: DaemonConfig) -> Result<()> {
    let base_dir = appdir::app_data_dir(appdir::APP_NAME)?;
    let settings = settings::load_or_init(&base_dir)?;

    // An explicit network (file, env, or flag) wins over the persisted
    // settings record.
    let network = cfg.network.unwrap_or(settings.network);
    let data_dir = appdir::network_data_dir(&base_dir, cfg.server.env, network)?;

    let _log_guard = logging::init(&data_dir.join("logs"), &cfg.log)?;
    tracing::info!(
        %network,
        env = %cfg.server.env,
        host = %cfg.server.host,
        port = cfg.server.port,
        data_dir = %data_dir.display(),
        "starting filvault daemon"
    );

    let store = open_store(&cfg, &data_dir)?;

    let vault_cfg = VaultConfig {
        env: cfg.server.env,
        network,
        session_timeout_minutes: cfg.server.session_timeout_minutes,
        data_dir: data_dir.clone(),
        rpc_endpoint: cfg.rpc.endpoint.clone(),
        rpc_token: cfg.rpc.token.clone(),
    };
    let vault = Vault::new(store, vault_cfg).await?;

    tracing::info!(wallets = vault.count()?, "vault ready");

    tokio::signal::ctrl_c().await.map_err(|e| FilvaultError::Config {
        reason: format!("listen for shutdown signal: {e}"),
    })?;

    tracing::info!("shutdown signal received");
    vault.close();
    Ok(())
}

fn open_store(cfg: &DaemonConfig, data_dir: &std::path::Path) -> Result<Arc<dyn WalletStore>> {
    match cfg.database.driver.trim().to_lowercase().as_str() {
        "sqlite" => {
            let path = data_dir.join(&cfg.database.name);
            Ok(Arc::new(SqliteStore::open(&path)?))
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = format!(
                "postgres://{}:{}@{}:{}/{}",
                cfg.database.user,
                cfg.database.password,
                cfg.database.host,
                cfg.database.port,
                cfg.database.name,
            );
            Ok(Arc::new(filvault_store::PgStore::open(&url)?))
        }
        other => Err(FilvaultError::Config {
            reason: format!("unsupported database driver: {other}"),
        }),
    }
}
