//! # Launch a work item and turn its termination into exactly one signal.
//!
//! Two execution modes, selected by [`Config::sync`](crate::Config::sync):
//!
//! ```text
//! Concurrent:
//!   spawn_blocking(work.run(ctx)) ──► job
//!   tokio::spawn(monitor):
//!       job.await
//!         ├─ Ok(Ok(outcome))  ─► Signal::Completion
//!         ├─ Ok(Err(cause))   ─► Signal::Crash(cause)
//!         ├─ Err(panic)       ─► Signal::Crash(Panicked)
//!         └─ Err(cancelled)   ─► Signal::Crash(Canceled)
//!       mailbox.send(signal)
//!
//! Synchronous:
//!   catch_unwind(work.run(ctx)) ─► signal returned to the caller
//! ```
//!
//! ## Rules
//! - Always produces **exactly one** terminal signal per launched work item.
//! - A closed mailbox (owner gone) drops the signal silently.
//! - Concurrent launches require a Tokio runtime context.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::core::registry::TaskHandle;
use crate::error::TaskError;
use crate::signal::{Mailbox, Signal};
use crate::tasks::{CompletionToken, Work, WorkResult};

/// Launches work items for one coordinator.
pub(crate) struct Runner<V, M> {
    mailbox: Mailbox<V, M>,
    sync: bool,
}

impl<V, M> Runner<V, M>
where
    V: Send + 'static,
    M: Send + 'static,
{
    pub(crate) fn new(mailbox: Mailbox<V, M>, sync: bool) -> Self {
        Self { mailbox, sync }
    }

    /// Returns a clone of the mailbox signals are delivered to.
    pub(crate) fn mailbox(&self) -> Mailbox<V, M> {
        self.mailbox.clone()
    }

    /// Starts `work` for `token`.
    ///
    /// In synchronous mode the work has already finished when this returns and
    /// its signal is handed back instead of being mailed.
    pub(crate) fn launch(
        &self,
        token: CompletionToken,
        work: Work<V>,
    ) -> (TaskHandle, Option<Signal<V, M>>) {
        if self.sync {
            let (handle, signal) = run_inline(token, work);
            (handle, Some(signal))
        } else {
            (self.spawn(token, work), None)
        }
    }

    fn spawn(&self, token: CompletionToken, work: Work<V>) -> TaskHandle {
        let stop = CancellationToken::new();
        let ctx = stop.clone();
        let job = tokio::task::spawn_blocking(move || work.run(ctx));
        let abort = job.abort_handle();

        let tx = self.mailbox.clone();
        let monitor = tokio::spawn(async move {
            let signal = match job.await {
                Ok(result) => into_signal(token, result),
                Err(e) => Signal::Crash {
                    token,
                    cause: join_error_cause(e),
                },
            };
            let _ = tx.send(signal);
        });

        TaskHandle::spawned(stop, abort, monitor)
    }
}

/// Runs `work` on the current thread, catching panics.
fn run_inline<V, M>(token: CompletionToken, work: Work<V>) -> (TaskHandle, Signal<V, M>) {
    let stop = CancellationToken::new();
    let ctx = stop.clone();
    let signal = match panic::catch_unwind(AssertUnwindSafe(move || work.run(ctx))) {
        Ok(result) => into_signal(token, result),
        Err(payload) => Signal::Crash {
            token,
            cause: TaskError::Panicked {
                message: panic_message(payload),
            },
        },
    };
    (TaskHandle::finished(stop), signal)
}

fn into_signal<V, M>(token: CompletionToken, result: WorkResult<V>) -> Signal<V, M> {
    match result {
        Ok(outcome) => Signal::Completion { token, outcome },
        Err(cause) => Signal::Crash { token, cause },
    }
}

fn join_error_cause(e: JoinError) -> TaskError {
    if e.is_panic() {
        TaskError::Panicked {
            message: panic_message(e.into_panic()),
        }
    } else {
        TaskError::Canceled
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
