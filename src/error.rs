//! Error types for sqlbridge.
//!
//! This module defines all error types using `thiserror`. Driver errors are
//! never retried or swallowed: they are wrapped with the name of the operation
//! that produced them and kept as the error `source`.

use crate::models::TransactionStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Transaction error: {operation} failed: {source}")]
    Transaction {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid state: cannot {operation} a transaction that is {state}")]
    InvalidState {
        operation: &'static str,
        state: TransactionStatus,
    },

    #[error("Query error: {operation} failed: {message}")]
    Query {
        operation: &'static str,
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    #[error("Mapping error: {message}")]
    Mapping { message: String },

    #[error("No rows in result set")]
    NoRows,

    #[error("Timeout: {operation} exceeded {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Cancelled: {operation}")]
    Cancelled { operation: &'static str },
}

impl DbError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Wrap a driver failure of begin/commit/rollback.
    pub fn transaction(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Transaction { operation, source }
    }

    pub fn invalid_state(operation: &'static str, state: TransactionStatus) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create a mapping error.
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: &'static str, timeout: Duration) -> Self {
        Self::Timeout {
            operation,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn cancelled(operation: &'static str) -> Self {
        Self::Cancelled { operation }
    }

    /// Classify a driver error raised while running a statement.
    ///
    /// Decode failures become [`DbError::Mapping`], a missing row becomes
    /// [`DbError::NoRows`], everything else is a [`DbError::Query`].
    pub fn query(operation: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NoRows,
            sqlx::Error::ColumnNotFound(col) => {
                DbError::mapping(format!("missing destination name {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::mapping(format!(
                "column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::mapping(format!("failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::mapping(format!("decode error: {}", source)),
            sqlx::Error::Database(ref db_err) => {
                let message = db_err.message().to_string();
                let sql_state = db_err.code().map(|c| c.to_string());
                DbError::Query {
                    operation,
                    message,
                    sql_state,
                    source: err,
                }
            }
            other => DbError::Query {
                operation,
                message: other.to_string(),
                sql_state: None,
                source: other,
            },
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// True for driver transaction failures and for transaction state misuse.
    pub fn is_transaction_error(&self) -> bool {
        matches!(self, Self::Transaction { .. } | Self::InvalidState { .. })
    }

    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// SQLSTATE reported by the database, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Query { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors raised outside a specific operation.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::query("statement", err)
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::mapping(err.to_string())
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
