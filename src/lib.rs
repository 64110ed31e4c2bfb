//! sqlbridge
//!
//! A thin database access layer over sqlx for SQLite, PostgreSQL and MySQL.
//! A [`ConnectionManager`] owns the pool and hands out a [`SingleExecutor`]
//! for one-off statements or a [`Transaction`] for explicitly driven ones.
//! Both implement [`Executor`]: positional and named parameters, `?`
//! rebinding and row mapping through serde.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod sql;

pub use config::DatabaseConfig;
pub use context::{CancelHandle, Context};
pub use db::{
    ConnectionManager, Executor, PreparedStatement, Row, RowCursor, RowHandle, SingleExecutor,
    Transaction,
};
pub use error::{DbError, DbResult};
pub use models::{DatabaseType, ExecResult, QueryParam, TransactionStatus};
