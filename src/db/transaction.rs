//! Explicitly driven transactions.
//!
//! A [`Transaction`] starts unstarted; `begin` takes a connection from the
//! pool and opens a database transaction on it, and `commit` or `rollback`
//! finishes it. Every entry point checks the current state:
//!
//! ```text
//! Unstarted --begin--> Active --commit|rollback--> Closed
//! ```
//!
//! Closed is terminal. Statements are only accepted while active. Dropping an
//! active transaction returns its connection to the pool after sqlx rolls it
//! back.

use crate::context::Context;
use crate::db::backend::StatementInfo;
use crate::db::executor::Executor;
use crate::db::pool::DbPool;
use crate::db::row::{Row, RowCursor, RowHandle};
use crate::db::statement::PreparedStatement;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, ExecResult, QueryParam, TransactionInfo, TransactionStatus};
use chrono::{DateTime, Utc};
use sqlx::{MySql, Postgres, Sqlite};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Database-specific transaction wrapper.
pub(crate) enum DbTransaction {
    MySql(sqlx::Transaction<'static, MySql>),
    Postgres(sqlx::Transaction<'static, Postgres>),
    SQLite(sqlx::Transaction<'static, Sqlite>),
}

impl DbTransaction {
    async fn begin(pool: &DbPool) -> DbResult<Self> {
        match pool {
            DbPool::MySql(pool) => pool.begin().await.map(DbTransaction::MySql),
            DbPool::Postgres(pool) => pool.begin().await.map(DbTransaction::Postgres),
            DbPool::SQLite(pool) => pool.begin().await.map(DbTransaction::SQLite),
        }
        .map_err(|e| DbError::transaction("begin", e))
    }

    async fn commit(self) -> DbResult<()> {
        match self {
            DbTransaction::MySql(tx) => tx.commit().await,
            DbTransaction::Postgres(tx) => tx.commit().await,
            DbTransaction::SQLite(tx) => tx.commit().await,
        }
        .map_err(|e| DbError::transaction("commit", e))
    }

    async fn rollback(self) -> DbResult<()> {
        match self {
            DbTransaction::MySql(tx) => tx.rollback().await,
            DbTransaction::Postgres(tx) => tx.rollback().await,
            DbTransaction::SQLite(tx) => tx.rollback().await,
        }
        .map_err(|e| DbError::transaction("rollback", e))
    }
}

pub(crate) enum TxState {
    Unstarted,
    Active {
        tx: DbTransaction,
        started_at: DateTime<Utc>,
    },
    Closed,
}

impl TxState {
    fn status(&self) -> TransactionStatus {
        match self {
            TxState::Unstarted => TransactionStatus::Unstarted,
            TxState::Active { .. } => TransactionStatus::Active,
            TxState::Closed => TransactionStatus::Closed,
        }
    }

    fn active(&mut self, operation: &'static str) -> DbResult<&mut DbTransaction> {
        match self {
            TxState::Active { tx, .. } => Ok(tx),
            other => Err(DbError::invalid_state(operation, other.status())),
        }
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Commit,
    Rollback,
}

/// A transaction with an explicit lifecycle.
///
/// Callers are serialised on an internal lock; one transaction is meant for
/// one logical caller at a time.
pub struct Transaction {
    pool: DbPool,
    id: String,
    state: Arc<Mutex<TxState>>,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("database_type", &self.pool.db_type())
            .finish_non_exhaustive()
    }
}

impl Transaction {
    pub(crate) fn new(pool: DbPool) -> Self {
        Self {
            pool,
            id: format!("tx_{}", uuid::Uuid::new_v4().simple()),
            state: Arc::new(Mutex::new(TxState::Unstarted)),
        }
    }

    /// Another handle on the same transaction, for prepared statements.
    fn handle(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            id: self.id.clone(),
            state: Arc::clone(&self.state),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn status(&self) -> TransactionStatus {
        self.state.lock().await.status()
    }

    pub async fn info(&self) -> TransactionInfo {
        let state = self.state.lock().await;
        TransactionInfo {
            id: self.id.clone(),
            database_type: self.pool.db_type(),
            status: state.status(),
            started_at: match &*state {
                TxState::Active { started_at, .. } => Some(*started_at),
                _ => None,
            },
        }
    }

    /// Open the database transaction. Only valid once, on an unstarted
    /// transaction. If the driver refuses, the transaction stays unstarted.
    pub async fn begin(&self, ctx: &Context) -> DbResult<()> {
        let mut state = self.state.lock().await;
        if !matches!(*state, TxState::Unstarted) {
            return Err(DbError::invalid_state("begin", state.status()));
        }

        let tx = ctx.run("begin", DbTransaction::begin(&self.pool)).await?;
        *state = TxState::Active {
            tx,
            started_at: Utc::now(),
        };
        info!(transaction_id = %self.id, "Transaction started");
        Ok(())
    }

    /// Commit. The transaction is closed afterwards even if the commit fails.
    pub async fn commit(&self, ctx: &Context) -> DbResult<()> {
        self.finish(ctx, Outcome::Commit).await
    }

    /// Roll back. The transaction is closed afterwards even if the rollback
    /// fails.
    pub async fn rollback(&self, ctx: &Context) -> DbResult<()> {
        self.finish(ctx, Outcome::Rollback).await
    }

    /// Same as [`Transaction::commit`].
    pub async fn commit_and_close(&self, ctx: &Context) -> DbResult<()> {
        self.commit(ctx).await
    }

    /// Same as [`Transaction::rollback`].
    pub async fn rollback_and_close(&self, ctx: &Context) -> DbResult<()> {
        self.rollback(ctx).await
    }

    async fn finish(&self, ctx: &Context, outcome: Outcome) -> DbResult<()> {
        let operation = match outcome {
            Outcome::Commit => "commit",
            Outcome::Rollback => "rollback",
        };

        let mut state = self.state.lock().await;
        let tx = match std::mem::replace(&mut *state, TxState::Closed) {
            TxState::Active { tx, .. } => tx,
            other => {
                let status = other.status();
                *state = other;
                return Err(DbError::invalid_state(operation, status));
            }
        };
        drop(state);

        let result = ctx
            .run(operation, async move {
                match outcome {
                    Outcome::Commit => tx.commit().await,
                    Outcome::Rollback => tx.rollback().await,
                }
            })
            .await;

        match &result {
            Ok(()) => info!(transaction_id = %self.id, operation, "Transaction finished"),
            Err(e) => warn!(
                transaction_id = %self.id,
                operation,
                error = %e,
                "Transaction finish failed"
            ),
        }
        result
    }

    async fn fetch_all(
        &self,
        operation: &'static str,
        sql: &str,
        args: &[QueryParam],
    ) -> DbResult<RowCursor> {
        let mut state = self.state.lock().await;
        let tx = state.active(operation)?;
        impl_tx_dispatch!(tx, |backend, exec| {
            backend::fetch_all(exec, operation, sql, args).await
        })
    }

    async fn fetch_optional(&self, sql: &str, args: &[QueryParam]) -> DbResult<Option<Row>> {
        let mut state = self.state.lock().await;
        let tx = state.active("query_row")?;
        impl_tx_dispatch!(tx, |backend, exec| {
            backend::fetch_optional(exec, "query_row", sql, args).await
        })
    }

    async fn execute(&self, sql: &str, args: &[QueryParam]) -> DbResult<ExecResult> {
        let mut state = self.state.lock().await;
        let tx = state.active("exec")?;
        impl_tx_dispatch!(tx, |backend, exec| backend::execute(exec, sql, args).await)
    }

    async fn describe(&self, sql: &str) -> DbResult<StatementInfo> {
        let mut state = self.state.lock().await;
        let tx = state.active("prepare")?;
        impl_tx_dispatch!(tx, |backend, exec| backend::prepare(exec, sql).await)
    }
}

impl Executor for Transaction {
    fn database_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    async fn query(&self, ctx: &Context, sql: &str, args: &[QueryParam]) -> DbResult<RowCursor> {
        ctx.run("query", self.fetch_all("query", sql, args)).await
    }

    async fn query_row(&self, ctx: &Context, sql: &str, args: &[QueryParam]) -> RowHandle {
        RowHandle::new(ctx.run("query_row", self.fetch_optional(sql, args)).await)
    }

    async fn exec(&self, ctx: &Context, sql: &str, args: &[QueryParam]) -> DbResult<ExecResult> {
        ctx.run("exec", self.execute(sql, args)).await
    }

    async fn prepare(&self, ctx: &Context, sql: &str) -> DbResult<PreparedStatement<Self>> {
        let info = ctx.run("prepare", self.describe(sql)).await?;
        Ok(PreparedStatement::new(self.handle(), sql, info))
    }
}
