//! Per-call deadline and cancellation.
//!
//! Every executor operation takes a [`Context`]. The context bounds the call
//! with an optional deadline and an optional cancellation signal; when either
//! fires, the in-flight driver future is dropped and the call returns
//! [`DbError::Timeout`] or [`DbError::Cancelled`]. Nothing else is done on the
//! caller's behalf: in particular a cancelled transaction is left in whatever
//! state the driver leaves it.

use crate::error::{DbError, DbResult};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every [`Context`] derived from [`Context::with_cancel`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context whose deadline is at most `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context with the earlier of the current and given deadlines.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    /// Derive a cancellable context.
    ///
    /// The child observes only the new handle; an existing signal on `self`
    /// is dropped, so derive cancellation first and deadlines after.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                deadline: self.deadline,
                cancel: Some(rx),
            },
            CancelHandle { tx },
        )
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Drive `fut` to completion unless the deadline passes or the context is
    /// cancelled first.
    pub async fn run<T, F>(&self, operation: &'static str, fut: F) -> DbResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        if self.is_cancelled() {
            return Err(DbError::cancelled(operation));
        }

        let budget = self
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or_default();
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = fut => result,
            _ = deadline => Err(DbError::timeout(operation, budget)),
            _ = self.cancelled() => Err(DbError::cancelled(operation)),
        }
    }

    async fn cancelled(&self) {
        if let Some(rx) = &self.cancel {
            let mut rx = rx.clone();
            if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}
