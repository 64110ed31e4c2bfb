//! Connection-related data models.
//!
//! This module defines the backend type selected by a driver name and the
//! lifecycle state reported by transactions.

use serde::{Deserialize, Serialize};

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
}

/// Placeholder syntax understood by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindStyle {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Dollar,
}

impl DatabaseType {
    /// Resolve a driver name such as `postgres` or `sqlite3`.
    pub fn from_driver_name(driver: &str) -> Option<Self> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgx" | "pq" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlite" | "sqlite3" => Some(Self::SQLite),
            _ => None,
        }
    }

    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }

    /// Canonical driver name, accepted by [`DatabaseType::from_driver_name`].
    pub fn driver_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgres",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }

    pub fn bind_style(&self) -> BindStyle {
        match self {
            Self::PostgreSQL => BindStyle::Dollar,
            Self::MySQL | Self::SQLite => BindStyle::Question,
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Lifecycle state of a [`Transaction`](crate::db::Transaction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// No transaction opened on the database yet.
    Unstarted,
    Active,
    /// Committed or rolled back; terminal.
    Closed,
}

impl TransactionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionInfo {
    pub id: String,
    pub database_type: DatabaseType,
    pub status: TransactionStatus,
    /// Set once `begin` succeeds.
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
}
