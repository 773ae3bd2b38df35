//! # Owner inbox messages.
//!
//! Everything the owner receives asynchronously arrives as a [`Signal`]:
//! - [`Signal::Completion`] a task finished and produced an outcome;
//! - [`Signal::Crash`] a task terminated without one;
//! - [`Signal::Other`] anything unrelated the owner also listens to.
//!
//! Hooks answer with a [`Dispatch`]: either the signal was consumed, or it is
//! handed back untouched so the next hook can look at it.

use std::fmt;

use tokio::sync::mpsc;

use crate::error::TaskError;
use crate::tasks::{CompletionToken, Outcome};

/// Sending half of an owner inbox.
pub type Mailbox<V, M = ()> = mpsc::UnboundedSender<Signal<V, M>>;

/// Receiving half of an owner inbox.
pub type Inbox<V, M = ()> = mpsc::UnboundedReceiver<Signal<V, M>>;

/// A message delivered to the owner process.
pub enum Signal<V, M = ()> {
    /// Task finished with an outcome.
    Completion {
        /// Token minted when the task was spawned.
        token: CompletionToken,
        /// Assignments to fold into owner state.
        outcome: Outcome<V>,
    },
    /// Task terminated without an outcome.
    Crash {
        /// Token minted when the task was spawned.
        token: CompletionToken,
        /// Why it terminated.
        cause: TaskError,
    },
    /// Unrelated owner message.
    Other(M),
}

impl<V, M> Signal<V, M> {
    /// Returns the completion token for task signals.
    pub fn token(&self) -> Option<CompletionToken> {
        match self {
            Signal::Completion { token, .. } | Signal::Crash { token, .. } => Some(*token),
            Signal::Other(_) => None,
        }
    }

    /// Short label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Signal::Completion { .. } => "completion",
            Signal::Crash { .. } => "crash",
            Signal::Other(_) => "other",
        }
    }
}

impl<V: fmt::Debug, M: fmt::Debug> fmt::Debug for Signal<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Completion { token, outcome } => f
                .debug_struct("Completion")
                .field("token", token)
                .field("outcome", outcome)
                .finish(),
            Signal::Crash { token, cause } => f
                .debug_struct("Crash")
                .field("token", token)
                .field("cause", cause)
                .finish(),
            Signal::Other(m) => f.debug_tuple("Other").field(m).finish(),
        }
    }
}

/// Answer of a dispatch hook.
#[derive(Debug)]
pub enum Dispatch<V, M = ()> {
    /// The hook handled the signal; stop dispatching.
    Consumed,
    /// Not this hook's signal; continue with the next one.
    NotMine(Signal<V, M>),
}

impl<V, M> Dispatch<V, M> {
    /// Returns true if the signal was consumed.
    #[inline]
    pub fn is_consumed(&self) -> bool {
        matches!(self, Dispatch::Consumed)
    }
}
