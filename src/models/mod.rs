//! Data models for sqlbridge.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod query;

// Re-export commonly used types
pub use connection::{BindStyle, DatabaseType, TransactionInfo, TransactionStatus};
pub use query::{ExecResult, QueryParam};
