//! The query surface shared by pool-backed and transactional executors.

use crate::context::Context;
use crate::db::pool::DbPool;
use crate::db::row::{RowCursor, RowHandle};
use crate::db::statement::PreparedStatement;
use crate::error::DbResult;
use crate::models::{DatabaseType, ExecResult, QueryParam};
use crate::sql::{bind_named, compile_named};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

/// Operations available on both a [`SingleExecutor`] and a
/// [`Transaction`](crate::db::transaction::Transaction).
///
/// Positional arguments use the dialect's own placeholder syntax; call
/// [`Executor::rebind`] first to write portable `?` queries. Every call is
/// bounded by its [`Context`].
pub trait Executor: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    /// Run a statement and read every row.
    fn query(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[QueryParam],
    ) -> impl Future<Output = DbResult<RowCursor>> + Send;

    /// Run a statement expected to return at most one row. Failures and an
    /// empty result are reported when the handle is scanned.
    fn query_row(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[QueryParam],
    ) -> impl Future<Output = RowHandle> + Send;

    /// Run a statement that returns no rows.
    fn exec(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[QueryParam],
    ) -> impl Future<Output = DbResult<ExecResult>> + Send;

    /// Prepare `sql` on this executor. The statement runs on the same pool or
    /// transaction it was prepared on.
    fn prepare(
        &self,
        ctx: &Context,
        sql: &str,
    ) -> impl Future<Output = DbResult<PreparedStatement<Self>>> + Send
    where
        Self: Sized;

    /// Run a query and map every row into `T`.
    fn select<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[QueryParam],
    ) -> impl Future<Output = DbResult<Vec<T>>> + Send {
        async move { self.query(ctx, sql, args).await?.scan_all() }
    }

    /// Run a query and map its first row into `T`; further rows are ignored.
    fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[QueryParam],
    ) -> impl Future<Output = DbResult<T>> + Send {
        async move { self.query_row(ctx, sql, args).await.scan() }
    }

    /// Rewrite `?` placeholders into this executor's bind syntax.
    fn rebind(&self, sql: &str) -> String {
        crate::sql::rebind(self.database_type().bind_style(), sql)
    }

    /// Run a statement with `:name` placeholders bound from the fields of a
    /// struct or the entries of a map.
    fn named_exec<A: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        sql: &str,
        arg: &A,
    ) -> impl Future<Output = DbResult<ExecResult>> + Send {
        let bound = compile_and_bind(self.database_type(), sql, arg);
        async move {
            let (sql, params) = bound?;
            self.exec(ctx, &sql, &params).await
        }
    }

    /// Row-returning counterpart of [`Executor::named_exec`].
    fn named_query<A: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        sql: &str,
        arg: &A,
    ) -> impl Future<Output = DbResult<RowCursor>> + Send {
        let bound = compile_and_bind(self.database_type(), sql, arg);
        async move {
            let (sql, params) = bound?;
            self.query(ctx, &sql, &params).await
        }
    }
}

fn compile_and_bind<A: Serialize + ?Sized>(
    db_type: DatabaseType,
    sql: &str,
    arg: &A,
) -> DbResult<(String, Vec<QueryParam>)> {
    let compiled = compile_named(db_type.bind_style(), sql);
    let params = bind_named(&compiled.names, arg)?;
    Ok((compiled.sql, params))
}

/// Runs each operation directly on the pool, on whichever connection the pool
/// hands out. Cheap to clone and safe to share between tasks.
#[derive(Debug, Clone)]
pub struct SingleExecutor {
    pool: DbPool,
}

impl SingleExecutor {
    pub(crate) fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Executor for SingleExecutor {
    fn database_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    async fn query(&self, ctx: &Context, sql: &str, args: &[QueryParam]) -> DbResult<RowCursor> {
        ctx.run("query", async {
            impl_db_dispatch!(&self.pool, |backend, exec| {
                backend::fetch_all(exec, "query", sql, args).await
            })
        })
        .await
    }

    async fn query_row(&self, ctx: &Context, sql: &str, args: &[QueryParam]) -> RowHandle {
        let row = ctx
            .run("query_row", async {
                impl_db_dispatch!(&self.pool, |backend, exec| {
                    backend::fetch_optional(exec, "query_row", sql, args).await
                })
            })
            .await;
        RowHandle::new(row)
    }

    async fn exec(&self, ctx: &Context, sql: &str, args: &[QueryParam]) -> DbResult<ExecResult> {
        ctx.run("exec", async {
            impl_db_dispatch!(&self.pool, |backend, exec| {
                backend::execute(exec, sql, args).await
            })
        })
        .await
    }

    async fn prepare(&self, ctx: &Context, sql: &str) -> DbResult<PreparedStatement<Self>> {
        let info = ctx
            .run("prepare", async {
                impl_db_dispatch!(&self.pool, |backend, exec| backend::prepare(exec, sql).await)
            })
            .await?;
        Ok(PreparedStatement::new(self.clone(), sql, info))
    }
}
