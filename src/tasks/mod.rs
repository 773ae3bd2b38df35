//! # Task identities, work items and outcomes.
//!
//! This module provides the task-related types:
//! - [`CompletionToken`] - unique per-instance identifier minted at spawn time
//! - [`TaskKey`] - logical slot name; at most one active task per key
//! - [`Work`] - boxed closure producing an [`Outcome`]
//! - [`Outcome`] / [`Assign`] - ordered field assignments folded into owner state

mod key;
mod outcome;
mod token;
mod work;

pub use key::TaskKey;
pub use outcome::{Assign, Field, Outcome, UpdateFn};
pub use token::CompletionToken;
pub use work::{Work, WorkResult};
