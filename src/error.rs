//! Error types for pgbrowse
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors with clear error chains.

use std::io;

/// Main error type for the pgbrowse crate
#[derive(Debug, thiserror::Error)]
pub enum PgBrowseError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Database operation errors
///
/// Connection failures are mapped from driver and OS errors into these
/// kinds. Every kind has a human-readable description (its `Display`) and,
/// where one makes sense, a [`recovery_suggestion`](DbError::recovery_suggestion).
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Host is empty or could not be resolved
    #[error("Invalid host")]
    InvalidHost,

    /// Port outside 1..=65535
    #[error("Invalid port: {0}")]
    InvalidPort(u32),

    /// Server rejected the credentials
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Target database does not exist
    #[error("Database '{0}' not found")]
    DatabaseNotFound(String),

    /// Connection attempt timed out
    #[error("Connection timed out")]
    Timeout,

    /// Server could not be reached at all
    #[error("Network unreachable")]
    NetworkUnreachable,

    /// Operation needs a live connection
    #[error("Not connected to database")]
    NotConnected,

    /// Query execution failed; the driver's message is kept as-is
    #[error("{0}")]
    Query(String),

    /// Anything the mapping does not recognize
    #[error("Unknown error: {0}")]
    Unknown(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DbError {
    /// What the user can try next, if anything.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            DbError::InvalidHost => Some("Check the host name or IP address."),
            DbError::InvalidPort(_) => Some("Use a port between 1 and 65535 (PostgreSQL defaults to 5432)."),
            DbError::AuthenticationFailed => Some("Check username and password."),
            DbError::DatabaseNotFound(_) => Some("Check the database name, or connect to 'postgres' and list databases."),
            DbError::Timeout => Some("Check that the server is running and reachable, then try again."),
            DbError::NetworkUnreachable => {
                Some("Check your network connection and that the server accepts TCP connections.")
            }
            DbError::NotConnected => Some("Connect to a server first."),
            DbError::Query(_) => None,
            DbError::Unknown(_) => None,
        }
    }

    /// Wrap an arbitrary error as [`DbError::Unknown`].
    pub fn unknown<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DbError::Unknown(Box::new(err))
    }
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file could not be read or written
    #[error("Configuration file error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to write configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Connection profile not found
    #[error("Connection profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Specialized Result type for pgbrowse operations
pub type Result<T> = std::result::Result<T, PgBrowseError>;

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
