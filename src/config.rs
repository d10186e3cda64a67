//! Configuration management for the ballot ledger
//!
//! Loads behavior toggles from environment variables with validation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Behavior toggles for ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Write the `_debug1`/`_debug2` scratch snapshots during poll creation
    pub record_diagnostics: bool,

    /// Run the deadline sweep before serving a read of the index key
    pub close_expired_on_read: bool,

    /// Treat open polls past their deadline as closed when casting a vote
    pub reject_expired_on_vote: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            record_diagnostics: true,
            close_expired_on_read: true,
            reject_expired_on_vote: true,
        }
    }
}

impl LedgerConfig {
    /// Load ledger configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        Ok(Self {
            record_diagnostics: env_flag("BALLOT_RECORD_DIAGNOSTICS", defaults.record_diagnostics)?,
            close_expired_on_read: env_flag(
                "BALLOT_CLOSE_EXPIRED_ON_READ",
                defaults.close_expired_on_read,
            )?,
            reject_expired_on_vote: env_flag(
                "BALLOT_REJECT_EXPIRED_ON_VOTE",
                defaults.reject_expired_on_vote,
            )?,
        })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self::default()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `full` or `compact`
    pub format: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        let ledger = LedgerConfig::from_env()?;

        let logging = LoggingConfig {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "full".to_string()),
        };

        Ok(Self { ledger, logging })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Result<Self> {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "compact".to_string(),
        };

        Ok(Self {
            ledger: LedgerConfig::for_testing(),
            logging,
        })
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(raw) => parse_flag(&raw)
            .ok_or_else(|| Error::internal(format!("Invalid {name}: expected true or false"))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
