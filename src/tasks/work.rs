//! # Work items.
//!
//! [`Work`] wraps a one-shot closure `FnOnce(CancellationToken) -> WorkResult<V>`.
//! The closure runs outside the caller's stack (on Tokio's blocking pool, or
//! inline in synchronous mode), so it must own everything it touches.
//!
//! ## Cancellation
//! The token passed in is cancelled when the owner cancels the task. Long
//! running work should poll `ctx.is_cancelled()` and return
//! `Err(TaskError::Canceled)` early.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskfold::{Outcome, TaskError, Work};
//!
//! let work: Work<u64> = Work::new(|ctx: CancellationToken| {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok(Outcome::new().set("answer", 42))
//! });
//! # let _ = work;
//! ```

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::outcome::Outcome;

/// What a work item returns: an outcome, or the cause of a crash.
pub type WorkResult<V> = Result<Outcome<V>, TaskError>;

type BoxWork<V> = Box<dyn FnOnce(CancellationToken) -> WorkResult<V> + Send + 'static>;

/// A deferred, one-shot unit of work.
pub struct Work<V> {
    f: BoxWork<V>,
}

impl<V> Work<V> {
    /// Wraps a closure as a work item.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> WorkResult<V> + Send + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Consumes the work item and runs it on the current thread.
    pub fn run(self, ctx: CancellationToken) -> WorkResult<V> {
        (self.f)(ctx)
    }
}

impl<V> fmt::Debug for Work<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Work(<fn>)")
    }
}
