//! Errors for satellite tracker
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SatTrackerError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid NORAD id: {0}")]
    InvalidNoradId(String),

    #[error("Invalid satellite record: {0}")]
    InvalidRecord(String),

    #[error("Satellite with NORAD id {0} already exists")]
    DuplicateNoradId(i64),

    #[error("search parameter required")]
    MissingSearchQuery,

    #[error("passes not available via this temporary API")]
    PassesUnavailable,

    #[error("connection error: {0}")]
    UpstreamConnection(String),

    #[error("upstream API error")]
    UpstreamApi(String),

    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<reqwest::Error> for SatTrackerError {
    fn from(e: reqwest::Error) -> Self {
        SatTrackerError::UpstreamConnection(e.to_string())
    }
}
