//! # Completion tokens.
//!
//! A [`CompletionToken`] correlates an asynchronous terminal signal with the
//! task instance that produced it. Tokens come from a process-wide counter,
//! so two tokens never compare equal, even across coordinators.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global counter for token minting. Starts at 1; `0` is never handed out.
static TOKEN_SEQ: AtomicU64 = AtomicU64::new(1);

/// Opaque, globally unique identifier of one task instance.
///
/// ## Example
/// ```rust
/// use taskfold::CompletionToken;
///
/// let a = CompletionToken::mint();
/// let b = CompletionToken::mint();
/// assert_ne!(a, b);
/// assert!(b.as_u64() > a.as_u64());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompletionToken(u64);

impl CompletionToken {
    /// Mints a fresh token. Never returns a previously minted value.
    pub fn mint() -> Self {
        Self(TOKEN_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw sequence number (for logs/metrics).
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
