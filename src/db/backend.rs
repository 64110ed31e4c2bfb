//! Statement execution, written once and instantiated per backend.
//!
//! Each backend module exposes the same functions, generic over any sqlx
//! executor of that database: a pool reference for the single executor or
//! the connection of an open transaction. Statements without arguments run
//! as raw SQL; otherwise every argument is bound positionally.

use crate::db::params::{bind_mysql_param, bind_postgres_param, bind_sqlite_param};
use crate::db::row::{Row, RowCursor, decode_row};
use crate::error::{DbError, DbResult};
use crate::models::{ExecResult, QueryParam};
use sqlx::{Column, Either, Statement};
use tracing::debug;

/// What the driver reports about a prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatementInfo {
    pub columns: Vec<String>,
    pub param_count: Option<usize>,
}

macro_rules! backend {
    ($module:ident, $db:ty, $bind:path, |$result:ident| $last_insert_id:expr) => {
        pub(crate) mod $module {
            use super::*;

            type Db = $db;

            fn bind<'q>(
                sql: &'q str,
                params: &'q [QueryParam],
            ) -> sqlx::query::Query<'q, Db, <Db as sqlx::Database>::Arguments<'q>> {
                params.iter().fold(sqlx::query(sql), $bind)
            }

            pub(crate) async fn fetch_all<'c, E>(
                exec: E,
                operation: &'static str,
                sql: &str,
                params: &[QueryParam],
            ) -> DbResult<RowCursor>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                debug!(sql, params = params.len(), "Running {}", operation);
                let rows = if params.is_empty() {
                    exec.fetch_all(sql).await
                } else {
                    bind(sql, params).fetch_all(exec).await
                }
                .map_err(|e| DbError::query(operation, e))?;
                RowCursor::from_driver_rows(&rows)
            }

            pub(crate) async fn fetch_optional<'c, E>(
                exec: E,
                operation: &'static str,
                sql: &str,
                params: &[QueryParam],
            ) -> DbResult<Option<Row>>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                debug!(sql, params = params.len(), "Running {}", operation);
                let row = if params.is_empty() {
                    exec.fetch_optional(sql).await
                } else {
                    bind(sql, params).fetch_optional(exec).await
                }
                .map_err(|e| DbError::query(operation, e))?;
                row.map(|row| decode_row(&row, &mut None)).transpose()
            }

            pub(crate) async fn execute<'c, E>(
                exec: E,
                sql: &str,
                params: &[QueryParam],
            ) -> DbResult<ExecResult>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                debug!(sql, params = params.len(), "Running exec");
                let done = if params.is_empty() {
                    exec.execute(sql).await
                } else {
                    bind(sql, params).execute(exec).await
                }
                .map_err(|e| DbError::query("exec", e))?;
                let $result = &done;
                Ok(ExecResult {
                    rows_affected: done.rows_affected(),
                    last_insert_id: $last_insert_id,
                })
            }

            pub(crate) async fn prepare<'c, E>(exec: E, sql: &str) -> DbResult<StatementInfo>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                debug!(sql, "Preparing statement");
                let statement = exec
                    .prepare(sql)
                    .await
                    .map_err(|e| DbError::query("prepare", e))?;
                let param_count = match statement.parameters() {
                    Some(Either::Left(types)) => Some(types.len()),
                    Some(Either::Right(count)) => Some(count),
                    None => None,
                };
                Ok(StatementInfo {
                    columns: statement
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect(),
                    param_count,
                })
            }

            pub(crate) async fn ping<'c, E>(exec: E) -> DbResult<()>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                exec.execute("SELECT 1")
                    .await
                    .map(|_| ())
                    .map_err(|e| DbError::query("ping", e))
            }

            pub(crate) async fn scalar_text<'c, E>(exec: E, sql: &str) -> DbResult<String>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                sqlx::query_scalar::<_, String>(sql)
                    .fetch_one(exec)
                    .await
                    .map_err(|e| DbError::query("query_row", e))
            }
        }
    };
}

backend!(mysql, sqlx::MySql, bind_mysql_param, |result| {
    Some(result.last_insert_id() as i64).filter(|id| *id != 0)
});

backend!(postgres, sqlx::Postgres, bind_postgres_param, |_result| None);

backend!(sqlite, sqlx::Sqlite, bind_sqlite_param, |result| {
    Some(result.last_insert_rowid()).filter(|id| *id != 0)
});
