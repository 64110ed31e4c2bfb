//! Prepared statements bound to the executor that prepared them.

use crate::context::Context;
use crate::db::backend::StatementInfo;
use crate::db::executor::Executor;
use crate::db::row::{RowCursor, RowHandle};
use crate::error::DbResult;
use crate::models::{ExecResult, QueryParam};
use serde::de::DeserializeOwned;

/// A statement checked by the database ahead of execution.
///
/// The statement keeps a handle on its executor: one prepared on a
/// transaction only runs inside that transaction and fails once it is closed.
pub struct PreparedStatement<E> {
    executor: E,
    sql: String,
    columns: Vec<String>,
    param_count: Option<usize>,
}

impl<E> std::fmt::Debug for PreparedStatement<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("sql", &self.sql)
            .field("columns", &self.columns)
            .field("param_count", &self.param_count)
            .finish_non_exhaustive()
    }
}

impl<E> PreparedStatement<E> {
    pub(crate) fn new(executor: E, sql: &str, info: StatementInfo) -> Self {
        Self {
            executor,
            sql: sql.to_string(),
            columns: info.columns,
            param_count: info.param_count,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Result columns as described by the database. Empty for statements
    /// that return no rows.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of placeholders, when the driver reports it.
    pub fn param_count(&self) -> Option<usize> {
        self.param_count
    }
}

impl<E: Executor> PreparedStatement<E> {
    pub async fn query(&self, ctx: &Context, args: &[QueryParam]) -> DbResult<RowCursor> {
        self.executor.query(ctx, &self.sql, args).await
    }

    pub async fn query_row(&self, ctx: &Context, args: &[QueryParam]) -> RowHandle {
        self.executor.query_row(ctx, &self.sql, args).await
    }

    pub async fn exec(&self, ctx: &Context, args: &[QueryParam]) -> DbResult<ExecResult> {
        self.executor.exec(ctx, &self.sql, args).await
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        args: &[QueryParam],
    ) -> DbResult<Vec<T>> {
        self.executor.select(ctx, &self.sql, args).await
    }

    pub async fn get<T: DeserializeOwned>(&self, ctx: &Context, args: &[QueryParam]) -> DbResult<T> {
        self.executor.get(ctx, &self.sql, args).await
    }
}
