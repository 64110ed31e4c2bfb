//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Pool-backed and transactional executors sharing one query surface
//! - Prepared statements
//! - Row decoding into JSON values and user types
//! - Database dispatch macros for reducing code duplication

#[macro_use]
mod macros;
pub(crate) mod backend;
pub mod executor;
mod params;
pub mod pool;
pub mod row;
pub mod statement;
pub mod transaction;
pub mod types;

pub use executor::{Executor, SingleExecutor};
pub use pool::{ConnectionManager, DbPool, PoolLimits, PoolStatus};
pub use row::{Row, RowCursor, RowHandle};
pub use statement::PreparedStatement;
pub use transaction::Transaction;
