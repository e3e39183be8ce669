//! Startup and infrastructure errors shared by Phyto services
//!
//! Request-level failures have their own types in each service; this enum
//! covers what can go wrong while opening storage and loading configuration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bootstrap TOML unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tag vocabulary file rejected (unknown rule targets, conflicting rules, bad TOML)
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    /// Outbound HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
