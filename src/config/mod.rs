//! Configuration module for the library backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Operator login name
    pub admin_username: String,
    /// Operator password
    pub admin_password: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("LIBRARY_DB_PATH")
            .unwrap_or_else(|_| "./data/library.sqlite".to_string())
            .into();

        let bind_addr = env::var("LIBRARY_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5001".to_string())
            .parse()?;

        let log_level = env::var("LIBRARY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "library123".to_string());

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            admin_username,
            admin_password,
        })
    }
}
