//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Relay configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory served for every path that is not an API route
    pub static_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PORT wins over SERVER_ADDR, as on most hosting platforms
        let server_addr = match lookup("PORT") {
            Some(port) => {
                let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidPort(port))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            None => lookup("SERVER_ADDR")
                .unwrap_or_else(|| "0.0.0.0:3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
        };

        Ok(Self {
            server_addr,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
        })
    }
}

/// Settings for the headless `grapple_bot` client
#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Relay WebSocket endpoint
    pub relay_url: String,
    /// Seed for the generated city
    pub city_seed: u64,
    /// Ticks to run before exiting; `None` runs until interrupted
    pub max_ticks: Option<u64>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let city_seed = parse_number(&lookup, "CITY_SEED")?.unwrap_or(42);
        // 0 means run forever
        let max_ticks = parse_number(&lookup, "BOT_TICKS")?.unwrap_or(600);
        let max_ticks = (max_ticks > 0).then_some(max_ticks);

        Ok(Self {
            relay_url: lookup("RELAY_URL").unwrap_or_else(|| "ws://127.0.0.1:3000/ws".to_string()),
            city_seed,
            max_ticks,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_number<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            let parsed = value.trim().parse::<u64>();
            parsed.map_err(|_| ConfigError::InvalidNumber { key, value })
        })
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),

    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}
