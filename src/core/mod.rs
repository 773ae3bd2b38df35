//! Runtime core: task bookkeeping, launching and reconciliation.
//!
//! Public API from this module: [`Coordinator`], [`Owner`], [`TaskRegistry`]
//! and [`Config`].
//!
//! Internal modules:
//! - [`registry`]: tracks outstanding tasks by key and token in three lifecycle sets;
//! - [`runner`]: launches work on the blocking pool (or inline) and mails one terminal signal;
//! - [`coordinator`]: spawn-or-supersede, cancel, and the reconciliation table;
//! - [`owner`]: reference owner process and its message loop;
//! - [`config`]: coordinator configuration.

mod config;
mod coordinator;
mod owner;
mod registry;
mod runner;

pub use config::Config;
pub use coordinator::Coordinator;
pub use owner::Owner;
pub use registry::{TaskRegistry, TaskState};
