//! Cancellable, deadline-bearing operation context.
//!
//! Every [`PostStorage`](crate::storage::PostStorage) method takes an
//! [`OpContext`]. The context is cheap to clone and carries:
//!
//! - an optional deadline ([`tokio::time::Instant`])
//! - an optional cancel signal, fired through the paired [`CancelHandle`]
//!
//! Stores call [`OpContext::check`] at safe points and race their waits
//! against [`OpContext::done`], so a cancelled caller stops waiting for locks
//! or I/O promptly.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use threadkeep::context::OpContext;
//!
//! let (ctx, handle) = OpContext::with_timeout(Duration::from_secs(5)).cancellable();
//! assert!(ctx.check().is_ok());
//! handle.cancel();
//! assert!(ctx.check().is_err());
//! ```

use crate::error::{Error, Result};
use std::future::{pending, Future};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Execution context passed to every storage operation.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Fires cancellation for every clone of the [`OpContext`] it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the associated context. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl OpContext {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// Attach a cancel signal, keeping any deadline.
    ///
    /// Replaces a previously attached signal.
    #[must_use]
    pub fn cancellable(self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                deadline: self.deadline,
                cancel: Some(rx),
            },
            CancelHandle { tx },
        )
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` means no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` if the cancel handle has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fail fast if the context is already cancelled or expired.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` or `Error::DeadlineExceeded`.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Resolve once the context is cancelled or expired, yielding the error
    /// the operation should report. Never resolves for a background context.
    pub async fn done(&self) -> Error {
        let cancelled = async {
            match &self.cancel {
                Some(rx) => {
                    let mut rx = rx.clone();
                    let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                    if !fired {
                        // Handle dropped without cancelling: this context can no longer be cancelled.
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            () = cancelled => Error::Cancelled,
            () = expired => Error::DeadlineExceeded,
        }
    }

    /// Run `fut` unless the context fires first.
    ///
    /// If the context fires, `fut` is dropped.
    ///
    /// # Errors
    ///
    /// Returns the future's own error, or the context error.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            result = fut => result,
        }
    }
}
