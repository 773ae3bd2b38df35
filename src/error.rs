//! Error types used by the coordinator and by background tasks.
//!
//! This module defines three enums:
//!
//! - [`RuntimeError`] errors that are fatal to the owner process.
//! - [`TaskError`] the cause carried by a task crash.
//! - [`ApplyError`] failures while folding a task outcome into owner state.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::borrow::Cow;

use thiserror::Error;

use crate::tasks::{CompletionToken, TaskKey};

/// # Errors that end the owner process.
///
/// A routinely discarded result (superseded or canceled task) is never an error.
/// Only failures of work the owner is still waiting for end up here.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// An active task terminated without producing an outcome.
    #[error("active task {token} (key={key:?}) crashed: {cause}")]
    TaskCrashed {
        /// Slot the task was registered under, if it still owned one.
        key: Option<TaskKey>,
        /// Token of the crashed task.
        token: CompletionToken,
        /// Why the task terminated.
        cause: TaskError,
    },

    /// A task outcome could not be applied to owner state.
    #[error("failed to apply task outcome: {0}")]
    Apply(#[from] ApplyError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskfold::{ApplyError, RuntimeError};
    ///
    /// let err = RuntimeError::from(ApplyError::MissingField { field: "count".into() });
    /// assert_eq!(err.as_label(), "runtime_apply_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::TaskCrashed { .. } => "runtime_task_crashed",
            RuntimeError::Apply(_) => "runtime_apply_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::TaskCrashed { key, token, cause } => match key {
                Some(key) => format!("task {token} under {key} crashed: {}", cause.as_message()),
                None => format!("task {token} crashed: {}", cause.as_message()),
            },
            RuntimeError::Apply(e) => format!("apply: {}", e.as_message()),
        }
    }
}

/// # Why a task terminated without an outcome.
///
/// Work that wants graceful degradation should encode its recoverable errors
/// into the [`Outcome`](crate::Outcome) instead of returning one of these.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Work returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Work panicked.
    #[error("panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// Work was stopped before it could run.
    #[error("task cancelled")]
    Canceled,
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use taskfold::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn fail(error: impl ToString) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { message } => format!("panic: {message}"),
            TaskError::Canceled => "cancelled".to_string(),
        }
    }
}

/// # Errors raised while applying an outcome.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// A relative update targeted a field the owner does not hold.
    #[error("no such field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: Cow<'static, str>,
    },
}

impl ApplyError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ApplyError::MissingField { .. } => "apply_missing_field",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ApplyError::MissingField { field } => format!("missing field {field:?}"),
        }
    }
}
