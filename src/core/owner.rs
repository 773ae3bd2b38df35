//! # Owner: a single-threaded stateful process with background tasks.
//!
//! [`Owner`] bundles an [`Assigns`] container with a [`Coordinator`] and runs
//! the message loop that feeds the coordinator.
//!
//! ## Message loop
//! ```text
//! loop {
//!   select! {
//!     shutdown.cancelled()  ─► break
//!     inbox.recv()          ─► coordinator.reconcile(signal)
//!                                ├─ Consumed        ─► next message
//!                                ├─ NotMine(signal) ─► on_info(owner, signal)
//!                                └─ Err(fatal)      ─► break with error
//!   }
//! }
//! coordinator.shutdown()   (stop every outstanding task)
//! ```
//!
//! One signal is processed to completion before the next, so reconciliation
//! needs no locking.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::assigns::Assigns;
use crate::core::config::Config;
use crate::core::coordinator::Coordinator;
use crate::error::RuntimeError;
use crate::signal::{Dispatch, Inbox, Mailbox, Signal};
use crate::tasks::{CompletionToken, TaskKey, Work};

/// Owner state plus the coordinator of its background tasks.
pub struct Owner<A: Assigns, M = ()> {
    assigns: A,
    coordinator: Coordinator<A::Value, M>,
}

impl<A, M> Owner<A, M>
where
    A: Assigns,
    A::Value: Send + 'static,
    M: Send + 'static,
{
    /// Installs a fresh coordinator next to `assigns`.
    ///
    /// Returns the owner and its inbox; pass both to [`run`](Self::run).
    pub fn mount(assigns: A, cfg: Config) -> (Self, Inbox<A::Value, M>) {
        let (coordinator, inbox) = Coordinator::attach(cfg);
        (Self { assigns, coordinator }, inbox)
    }

    /// Starts `work` under `key`, superseding whatever runs there.
    pub fn start_async(
        &mut self,
        key: impl Into<TaskKey>,
        work: Work<A::Value>,
    ) -> Result<Option<CompletionToken>, RuntimeError> {
        self.coordinator.spawn_or_supersede(&mut self.assigns, key, work)
    }

    /// Cancels the task under `key`. Returns false if there was none.
    pub fn cancel_async(&mut self, key: &str) -> bool {
        self.coordinator.cancel(key)
    }

    /// Routes one signal through the coordinator.
    pub fn handle_signal(
        &mut self,
        signal: Signal<A::Value, M>,
    ) -> Result<Dispatch<A::Value, M>, RuntimeError> {
        self.coordinator.reconcile(&mut self.assigns, signal)
    }

    /// Runs the message loop until `shutdown` fires or a fatal error occurs.
    ///
    /// Signals the coordinator does not claim are handed to `on_info`; an
    /// error returned from it ends the loop as well. Outstanding tasks are
    /// canceled on exit and the final state is returned.
    pub async fn run<F>(
        mut self,
        mut inbox: Inbox<A::Value, M>,
        shutdown: CancellationToken,
        mut on_info: F,
    ) -> Result<A, RuntimeError>
    where
        F: FnMut(&mut Self, Signal<A::Value, M>) -> Result<(), RuntimeError>,
    {
        let result = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                msg = inbox.recv() => {
                    // The coordinator's runner holds a sender for as long as the
                    // owner lives, so the inbox only closes if that invariant breaks.
                    let Some(signal) = msg else { break Ok(()) };
                    match self.handle_signal(signal) {
                        Ok(Dispatch::Consumed) => {}
                        Ok(Dispatch::NotMine(signal)) => {
                            if let Err(e) = on_info(&mut self, signal) {
                                break Err(e);
                            }
                        }
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        self.coordinator.shutdown();
        match result {
            Ok(()) => {
                debug!("owner loop stopped");
                Ok(self.assigns)
            }
            Err(e) => {
                error!(label = e.as_label(), error = %e, "owner loop failed");
                Err(e)
            }
        }
    }

    /// Owner state.
    pub fn assigns(&self) -> &A {
        &self.assigns
    }

    /// Mutable owner state.
    pub fn assigns_mut(&mut self) -> &mut A {
        &mut self.assigns
    }

    /// The coordinator of this owner's tasks.
    pub fn coordinator(&self) -> &Coordinator<A::Value, M> {
        &self.coordinator
    }

    /// Sender for posting [`Signal::Other`] messages to this owner.
    pub fn mailbox(&self) -> Mailbox<A::Value, M> {
        self.coordinator.mailbox()
    }
}
