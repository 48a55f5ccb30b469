//! Layered daemon configuration.
//!
//! Values resolve low to high: built-in defaults, JSON config file,
//! `FILVAULT_*` environment variables, command-line flags. The
//! resolved [`DaemonConfig`] is validated once before anything is
//! wired up.

use std::path::{Path, PathBuf};

use filvault_types::{Env, FilvaultError, Network, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// CLI arguments (manual parsing)
// ---------------------------------------------------------------------------

/// Parsed command-line arguments.
#[derive(Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub session_timeout: Option<u64>,
    pub network: Option<String>,
    pub env: Option<String>,
    pub db_driver: Option<String>,
    pub db_name: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub rpc_endpoint: Option<String>,
    pub rpc_token: Option<String>,
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Parses CLI arguments from `std::env::args`.
    pub fn parse_from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut cli = Self::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    i += 1;
                    cli.config_path = args.get(i).map(PathBuf::from);
                }
                "--host" => {
                    i += 1;
                    cli.host = args.get(i).cloned();
                }
                "--port" => {
                    i += 1;
                    cli.port = args.get(i).and_then(|s| s.parse().ok());
                }
                "--session-timeout" => {
                    i += 1;
                    cli.session_timeout = args.get(i).and_then(|s| s.parse().ok());
                }
                "--network" => {
                    i += 1;
                    cli.network = args.get(i).cloned();
                }
                "--env" => {
                    i += 1;
                    cli.env = args.get(i).cloned();
                }
                "--db-driver" => {
                    i += 1;
                    cli.db_driver = args.get(i).cloned();
                }
                "--db-name" => {
                    i += 1;
                    cli.db_name = args.get(i).cloned();
                }
                "--db-host" => {
                    i += 1;
                    cli.db_host = args.get(i).cloned();
                }
                "--db-port" => {
                    i += 1;
                    cli.db_port = args.get(i).and_then(|s| s.parse().ok());
                }
                "--db-user" => {
                    i += 1;
                    cli.db_user = args.get(i).cloned();
                }
                "--db-password" => {
                    i += 1;
                    cli.db_password = args.get(i).cloned();
                }
                "--rpc-endpoint" => {
                    i += 1;
                    cli.rpc_endpoint = args.get(i).cloned();
                }
                "--rpc-token" => {
                    i += 1;
                    cli.rpc_token = args.get(i).cloned();
                }
                "--log-level" => {
                    i += 1;
                    cli.log_level = args.get(i).cloned();
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("unknown argument: {other}");
                    eprintln!("use --help for usage information");
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        cli
    }
}

// ---------------------------------------------------------------------------
// Config file (JSON)
// ---------------------------------------------------------------------------

/// JSON config file format; every section and key is optional.
///
/// Example `filvault.json`:
/// ```json
/// {
///   "server": { "host": "127.0.0.1", "port": 8080, "session_timeout": 30 },
///   "network": "calibration",
///   "database": { "driver": "sqlite", "name": "filvault.db" },
///   "log": { "level": "info", "max_backups": 5, "max_age": 28 },
///   "rpc": { "endpoint": "https://api.node.glif.io/rpc/v1" }
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub server: Option<ServerSection>,
    pub network: Option<String>,
    pub database: Option<DatabaseSection>,
    pub log: Option<LogSection>,
    pub rpc: Option<RpcSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub session_timeout: Option<u64>,
    pub environment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseSection {
    pub driver: Option<String>,
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogSection {
    pub level: Option<String>,
    pub max_backups: Option<usize>,
    pub max_age: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RpcSection {
    pub endpoint: Option<String>,
    pub token: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub session_timeout_minutes: u64,
    pub env: Env,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub driver: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: String,
    pub max_backups: usize,
    pub max_age_days: u64,
}

#[derive(Clone, Debug)]
pub struct RpcConfig {
    pub endpoint: String,
    pub token: Option<String>,
}

/// Fully resolved daemon configuration.
#[derive(Clone, Debug)]
pub struct DaemonConfig {
    pub server: ServerConfig,
    /// Network override; when absent the persisted settings file wins.
    pub network: Option<Network>,
    pub database: DatabaseConfig,
    pub log: LogConfig,
    pub rpc: RpcConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
                session_timeout_minutes: 30,
                env: Env::Development,
            },
            network: None,
            database: DatabaseConfig {
                driver: "sqlite".into(),
                name: "filvault.db".into(),
                host: String::new(),
                port: 0,
                user: String::new(),
                password: String::new(),
            },
            log: LogConfig {
                level: "info".into(),
                max_backups: 5,
                max_age_days: 28,
            },
            rpc: RpcConfig {
                endpoint: "https://api.node.glif.io/rpc/v1".into(),
                token: None,
            },
        }
    }
}

impl DaemonConfig {
    /// Resolves the configuration from all layers and validates it.
    pub fn resolve(cli: &CliArgs) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(path) = &cli.config_path {
            cfg.apply_file(&ConfigFile::load(path)?);
        }
        cfg.apply_env_with(|key| std::env::var(key).ok());
        cfg.apply_cli(cli)?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(server) = &file.server {
            if let Some(host) = &server.host {
                self.server.host = host.clone();
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(timeout) = server.session_timeout {
                self.server.session_timeout_minutes = timeout;
            }
            if let Some(env) = &server.environment {
                if let Ok(parsed) = env.parse() {
                    self.server.env = parsed;
                }
            }
        }
        if let Some(network) = &file.network {
            self.network = Some(Network::from_name(network));
        }
        if let Some(db) = &file.database {
            if let Some(driver) = &db.driver {
                self.database.driver = driver.clone();
            }
            if let Some(name) = &db.name {
                self.database.name = name.clone();
            }
            if let Some(host) = &db.host {
                self.database.host = host.clone();
            }
            if let Some(port) = db.port {
                self.database.port = port;
            }
            if let Some(user) = &db.user {
                self.database.user = user.clone();
            }
            if let Some(password) = &db.password {
                self.database.password = password.clone();
            }
        }
        if let Some(log) = &file.log {
            if let Some(level) = &log.level {
                self.log.level = level.clone();
            }
            if let Some(backups) = log.max_backups {
                self.log.max_backups = backups;
            }
            if let Some(age) = log.max_age {
                self.log.max_age_days = age;
            }
        }
        if let Some(rpc) = &file.rpc {
            if let Some(endpoint) = &rpc.endpoint {
                self.rpc.endpoint = endpoint.clone();
            }
            if rpc.token.is_some() {
                self.rpc.token = rpc.token.clone();
            }
        }
    }

    /// Applies `FILVAULT_*` environment overrides through a lookup
    /// function (injected so tests stay hermetic).
    fn apply_env_with(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(host) = get("FILVAULT_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("FILVAULT_SERVER_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(timeout) = get("FILVAULT_SESSION_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.server.session_timeout_minutes = timeout;
        }
        if let Some(env) = get("FILVAULT_ENV").and_then(|v| v.parse().ok()) {
            self.server.env = env;
        }
        if let Some(network) = get("FILVAULT_NETWORK") {
            self.network = Some(Network::from_name(&network));
        }
        if let Some(driver) = get("FILVAULT_DB_DRIVER") {
            self.database.driver = driver;
        }
        if let Some(name) = get("FILVAULT_DB_NAME") {
            self.database.name = name;
        }
        if let Some(host) = get("FILVAULT_DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = get("FILVAULT_DB_PORT").and_then(|v| v.parse().ok()) {
            self.database.port = port;
        }
        if let Some(user) = get("FILVAULT_DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = get("FILVAULT_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(endpoint) = get("FILVAULT_RPC_ENDPOINT") {
            self.rpc.endpoint = endpoint;
        }
        if let Some(token) = get("FILVAULT_RPC_TOKEN") {
            self.rpc.token = Some(token);
        }
        if let Some(level) = get("FILVAULT_LOG_LEVEL") {
            self.log.level = level;
        }
    }

    fn apply_cli(&mut self, cli: &CliArgs) -> Result<()> {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(timeout) = cli.session_timeout {
            self.server.session_timeout_minutes = timeout;
        }
        if let Some(env) = &cli.env {
            self.server.env = env.parse()?;
        }
        if let Some(network) = &cli.network {
            self.network = Some(Network::from_name(network));
        }
        if let Some(driver) = &cli.db_driver {
            self.database.driver = driver.clone();
        }
        if let Some(name) = &cli.db_name {
            self.database.name = name.clone();
        }
        if let Some(host) = &cli.db_host {
            self.database.host = host.clone();
        }
        if let Some(port) = cli.db_port {
            self.database.port = port;
        }
        if let Some(user) = &cli.db_user {
            self.database.user = user.clone();
        }
        if let Some(password) = &cli.db_password {
            self.database.password = password.clone();
        }
        if let Some(endpoint) = &cli.rpc_endpoint {
            self.rpc.endpoint = endpoint.clone();
        }
        if let Some(token) = &cli.rpc_token {
            self.rpc.token = Some(token.clone());
        }
        if let Some(level) = &cli.log_level {
            self.log.level = level.clone();
        }
        Ok(())
    }

    /// Validates the resolved configuration.
    pub fn validate(&self) -> Result<()> {
        let driver = self.database.driver.trim().to_lowercase();
        if driver.is_empty() {
            return Err(FilvaultError::Config {
                reason: "database.driver is required".into(),
            });
        }

        match driver.as_str() {
            "sqlite" => {
                if self.database.name.trim().is_empty() {
                    return Err(FilvaultError::Config {
                        reason: "database.name is required when using sqlite".into(),
                    });
                }
            }
            other => {
                if self.database.host.trim().is_empty() {
                    return Err(FilvaultError::Config {
                        reason: format!("database.host is required when using {other}"),
                    });
                }
                if self.database.port == 0 {
                    return Err(FilvaultError::Config {
                        reason: format!("database.port is required when using {other}"),
                    });
                }
                if self.database.name.trim().is_empty() {
                    return Err(FilvaultError::Config {
                        reason: format!("database.name is required when using {other}"),
                    });
                }
                if self.database.user.trim().is_empty() {
                    return Err(FilvaultError::Config {
                        reason: format!("database.user is required when using {other}"),
                    });
                }
            }
        }

        if self.server.session_timeout_minutes == 0 {
            return Err(FilvaultError::Config {
                reason: "server.session_timeout must be at least 1 minute".into(),
            });
        }

        if self.rpc.endpoint.trim().is_empty() {
            return Err(FilvaultError::Config {
                reason: "rpc.endpoint is required".into(),
            });
        }

        Ok(())
    }
}

impl ConfigFile {
    /// Loads and parses a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| FilvaultError::Config {
            reason: format!("read config file {}: {e}", path.display()),
        })?;

        serde_json::from_str(&text).map_err(|e| FilvaultError::Config {
            reason: format!("invalid config JSON: {e}"),
        })
    }
}

fn print_help() {
    println!(
        r#"filvault-daemon - headless wallet vault backend

USAGE:
    filvault-daemon [OPTIONS]

OPTIONS:
    --config <PATH>            Load settings from a JSON config file
    --host <ADDR>              Bind address (default: 127.0.0.1)
    --port <PORT>              TCP port (default: 8080)
    --session-timeout <MIN>    Unlock-session lifetime in minutes (default: 30)
    --network <NAME>           mainnet or calibration (default: persisted settings)
    --env <NAME>               development or production (default: development)
    --db-driver <NAME>         sqlite or postgres (default: sqlite)
    --db-name <NAME>           Database file or name (default: filvault.db)
    --db-host <HOST>           Database host (server drivers only)
    --db-port <PORT>           Database port (server drivers only)
    --db-user <USER>           Database user (server drivers only)
    --db-password <PASS>       Database password (server drivers only)
    --rpc-endpoint <URL>       Chain node RPC endpoint
    --rpc-token <TOKEN>        Bearer token for the RPC endpoint
    --log-level <LEVEL>        Log filter (default: info)
    -h, --help                 Show this help

ENVIRONMENT:
    FILVAULT_SERVER_HOST, FILVAULT_SERVER_PORT, FILVAULT_SESSION_TIMEOUT,
    FILVAULT_ENV, FILVAULT_NETWORK, FILVAULT_DB_DRIVER, FILVAULT_DB_NAME,
    FILVAULT_DB_HOST, FILVAULT_DB_PORT, FILVAULT_DB_USER, FILVAULT_DB_PASSWORD,
    FILVAULT_RPC_ENDPOINT, FILVAULT_RPC_TOKEN, FILVAULT_LOG_LEVEL
    RUST_LOG overrides the log filter entirely.

Precedence, low to high: defaults, config file, environment, flags.
"#
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
