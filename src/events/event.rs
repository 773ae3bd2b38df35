//! # Events emitted by the coordinator.
//!
//! The [`EventKind`] enum classifies coordinator decisions:
//! - **Spawn path**: task spawned, spawn skipped, predecessor superseded, task canceled
//! - **Reconciliation**: outcome applied or discarded, crash absorbed or fatal
//!
//! The [`Event`] struct carries the key, token, and a reason where it applies.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use taskfold::{CompletionToken, Event, EventKind};
//!
//! let token = CompletionToken::mint();
//! let ev = Event::new(EventKind::CrashAbsorbed)
//!     .with_key("profile")
//!     .with_token(token)
//!     .with_reason("panic: boom");
//!
//! assert_eq!(ev.kind, EventKind::CrashAbsorbed);
//! assert_eq!(ev.key.as_deref(), Some("profile"));
//! assert_eq!(ev.token, Some(token));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::tasks::CompletionToken;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of coordinator events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Spawn path ===
    /// Task registered as active under a key.
    ///
    /// Sets: `key`, `token`.
    TaskSpawned,

    /// Spawn skipped because the owner is not connected.
    ///
    /// Sets: `key`.
    SpawnSkipped,

    /// Previous task under a key was demoted to ignored (left running).
    ///
    /// Sets: `key`, `token` (of the superseded task).
    TaskSuperseded,

    /// Task was stopped and demoted to canceled.
    ///
    /// Sets: `key`, `token`.
    TaskCanceled,

    // === Reconciliation ===
    /// Outcome of an active task folded into owner state.
    ///
    /// Sets: `key` (if still registered), `token`.
    ResultApplied,

    /// Outcome of a canceled or superseded task dropped.
    ///
    /// Sets: `token`.
    ResultDiscarded,

    /// Crash of a canceled or superseded task absorbed.
    ///
    /// Sets: `token`, `reason`.
    CrashAbsorbed,

    /// Active task crashed; fatal to the owner.
    ///
    /// Sets: `key` (if still registered), `token`, `reason`.
    TaskCrashed,
}

/// Coordinator event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Task key, if applicable.
    pub key: Option<Arc<str>>,
    /// Completion token, if applicable.
    pub token: Option<CompletionToken>,
    /// Human-readable reason (crash causes).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            token: None,
            reason: None,
        }
    }

    /// Attaches a task key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a completion token.
    #[inline]
    pub fn with_token(mut self, token: CompletionToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
