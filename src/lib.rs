//! Poll and Ballot Ledger
//!
//! Transactional state machine for polls and votes kept in an external
//! atomic key-value store.

pub mod args;
pub mod config;
pub mod errors;
pub mod host;
pub mod ledger;
pub mod poll;
pub mod query;
pub mod store;
pub mod types;
pub mod voting;

// Re-export commonly used types
pub use errors::{Error, ErrorKind, Result};
pub use host::LedgerHandle;
pub use ledger::{Ledger, Operation};
pub use store::{KeyValueStore, MemoryStore};
pub use voting::{BusinessRejection, VoteOutcome};

use config::LoggingConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging for the ledger
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ballot=info".into()),
        )
        .try_init()
        .map_err(|e| Error::internal(format!("Logging already initialized: {e}")))?;

    tracing::info!("🗳️  Ballot ledger v{} initialized", VERSION);
    Ok(())
}

/// Initialize logging from a [`LoggingConfig`]
///
/// `RUST_LOG` still takes precedence over `config.level`.
pub fn init_with(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ballot={}", config.level).into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.format.as_str() {
        "compact" => builder.compact().try_init(),
        _ => builder.try_init(),
    };
    installed.map_err(|e| Error::internal(format!("Logging already initialized: {e}")))?;

    tracing::info!(format = %config.format, "🗳️  Ballot ledger v{} initialized", VERSION);
    Ok(())
}
