//! Configuration loader for the `sensor-ingest` service.
//!
//! All runtime settings are read from environment variables (the caller may
//! load a `.env` file first). The resulting [`Config`] is passed explicitly
//! into the router; nothing else in the crate calls `env::var`.
use std::{env, net::SocketAddr, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

const DEFAULT_DATABASE_URL: &str = "sqlite://sensor-data.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Strongly typed application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// SQLite connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// How long a connection waits on a locked database before failing.
    pub db_busy_timeout: Duration,

    /// Shared secret every non-preflight request must present verbatim in
    /// its `Authorization` header.
    pub api_token: String,

    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `API_TOKEN` – shared authorization secret
///
/// Optional:
/// - `DATABASE_URL` – SQLite connection string (default: `sqlite://sensor-data.db`)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `DB_BUSY_TIMEOUT_SECS` – SQLite busy timeout (default: 5)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_token = require_env!("API_TOKEN");
    if api_token.is_empty() {
        return Err(anyhow!("API_TOKEN must not be empty"));
    }

    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let busy_secs = parse_env_u32!("DB_BUSY_TIMEOUT_SECS", 5);

    let bind_addr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?;

    Ok(Config {
        db_url,
        db_pool_max,
        db_busy_timeout: Duration::from_secs(u64::from(busy_secs)),
        api_token,
        bind_addr,
    })
}

impl Config {
    /// Log the loaded configuration, with the API token masked.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL         : {}", self.db_url);
        tracing::info!("  DB_POOL_MAX          : {}", self.db_pool_max);
        tracing::info!("  DB_BUSY_TIMEOUT_SECS : {}", self.db_busy_timeout.as_secs());
        tracing::info!("  API_TOKEN            : {}", mask_secret(&self.api_token));
        tracing::info!("  BIND_ADDR            : {}", self.bind_addr);
    }
}

/// Keep the first two characters of a secret so operators can tell tokens
/// apart in logs without revealing them.
fn mask_secret(secret: &str) -> String {
    // ---
    let visible: String = secret.chars().take(2).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
