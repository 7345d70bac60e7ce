//! Storage error types
//!
//! Errors raised by the storage adapters. They are translated to
//! [`PortError`] at the port boundary so domain crates never see them.

use thiserror::Error;
use core_kernel::PortError;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema setup failed
    #[error("Schema setup failed: {0}")]
    SchemaFailed(String),

    /// Key contains characters that cannot be stored safely
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Filesystem error from the file adapter
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => DatabaseError::QueryFailed(db_err.message().to_string()),
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

/// Translates adapter errors for the key-value port
pub fn db_to_port_error(e: DatabaseError) -> PortError {
    match e {
        DatabaseError::InvalidKey(key) => PortError::validation(format!("invalid storage key '{}'", key)),
        DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted => {
            PortError::connection_with_source("storage unavailable", e)
        }
        DatabaseError::SqlError(sqlx::Error::PoolTimedOut) => PortError::connection_with_source("storage unavailable", e),
        _ => PortError::Internal {
            message: e.to_string(),
            source: Some(Box::new(e)),
        },
    }
}
