//! Configuration module for the request history service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::codec::DEFAULT_COMPRESSION_LEVEL;
use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// zstd level used when compressing request snapshots
    pub compression_level: i32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("REQUEST_HISTORY_API_PSK")
            .ok()
            .filter(|psk| !psk.is_empty());

        let db_path = env::var("REQUEST_HISTORY_DB_PATH")
            .unwrap_or_else(|_| "./data/history.sqlite".to_string())
            .into();

        let bind_addr = env::var("REQUEST_HISTORY_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_addr.parse().map_err(|_| {
            AppError::Config(format!("Invalid REQUEST_HISTORY_BIND_ADDR: {}", bind_addr))
        })?;

        let log_level =
            env::var("REQUEST_HISTORY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let compression_level = match env::var("REQUEST_HISTORY_COMPRESSION_LEVEL") {
            Ok(raw) => parse_compression_level(&raw)?,
            Err(_) => DEFAULT_COMPRESSION_LEVEL,
        };

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            compression_level,
        })
    }
}

fn parse_compression_level(raw: &str) -> Result<i32, AppError> {
    let level: i32 = raw.trim().parse().map_err(|_| {
        AppError::Config(format!("Invalid REQUEST_HISTORY_COMPRESSION_LEVEL: {}", raw))
    })?;
    if !zstd::compression_level_range().contains(&level) {
        return Err(AppError::Config(format!(
            "REQUEST_HISTORY_COMPRESSION_LEVEL {} is outside the supported zstd range",
            level
        )));
    }
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("REQUEST_HISTORY_API_PSK");
        env::remove_var("REQUEST_HISTORY_DB_PATH");
        env::remove_var("REQUEST_HISTORY_BIND_ADDR");
        env::remove_var("REQUEST_HISTORY_LOG_LEVEL");
        env::remove_var("REQUEST_HISTORY_COMPRESSION_LEVEL");

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/history.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.compression_level, DEFAULT_COMPRESSION_LEVEL);
    }

    #[test]
    fn test_compression_level_parsing() {
        assert_eq!(parse_compression_level("7").unwrap(), 7);
        assert_eq!(parse_compression_level(" 1 ").unwrap(), 1);
        assert!(parse_compression_level("fast").is_err());
        assert!(parse_compression_level("9999").is_err());
    }
}
