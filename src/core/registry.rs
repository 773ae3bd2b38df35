//! # Task registry - bookkeeping of outstanding tasks.
//!
//! The registry tracks every task the coordinator has spawned and not yet
//! reconciled:
//! - `tasks`: key → token of the **active** task under that key
//! - `handles`: token → runtime handle (stop token, job abort, monitor)
//! - `active` / `canceled` / `ignored`: disjoint lifecycle sets of tokens
//!
//! ## Lifecycle
//! ```text
//! spawn(key) ──► active ──┬─ ignore(key) ─► ignored ──┐
//!                         ├─ cancel(key) ─► canceled ─┤
//!                         │                           │
//!                         └───── terminal signal ─────┴─► remove(token) ─► gone
//! ```
//!
//! ## Rules
//! - Registry owns the task handles; nobody else stops or observes a task.
//! - `ignore` / `cancel` drop the key mapping immediately, the token stays
//!   known until its terminal signal is reconciled.
//! - `remove` is idempotent and releases the monitor registration.
//! - The three sets are pairwise disjoint at every point between calls.

use std::collections::{HashMap, HashSet};

use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::core::runner::Runner;
use crate::signal::Signal;
use crate::tasks::{CompletionToken, TaskKey, Work};

/// Runtime handle of one spawned task.
pub(crate) struct TaskHandle {
    /// Cooperative stop request handed to the work item.
    stop: CancellationToken,
    /// Abort handle of the blocking job (aborts it if it has not started yet).
    abort: Option<AbortHandle>,
    /// Monitor that turns job termination into a signal.
    monitor: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub(crate) fn spawned(
        stop: CancellationToken,
        abort: AbortHandle,
        monitor: JoinHandle<()>,
    ) -> Self {
        Self {
            stop,
            abort: Some(abort),
            monitor: Some(monitor),
        }
    }

    /// Handle of work that already ran inline.
    pub(crate) fn finished(stop: CancellationToken) -> Self {
        Self {
            stop,
            abort: None,
            monitor: None,
        }
    }

    /// Best-effort stop: the terminal signal may still arrive.
    fn request_stop(&self) {
        self.stop.cancel();
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Stops observing the task.
    fn release(self) {
        if let Some(monitor) = self.monitor {
            monitor.abort();
        }
    }
}

/// Lifecycle set a known token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Outcome will be applied when it arrives.
    Active,
    /// Explicitly stopped; its signal will be absorbed.
    Canceled,
    /// Superseded and left running; its signal will be absorbed.
    Ignored,
}

/// Bookkeeping of outstanding tasks for one owner.
///
/// Only a [`Coordinator`](crate::Coordinator) creates and fills a registry;
/// callers get read access through [`Coordinator::registry`](crate::Coordinator::registry).
///
/// ```compile_fail
/// let registry = taskfold::TaskRegistry::new();
/// ```
pub struct TaskRegistry {
    tasks: HashMap<TaskKey, CompletionToken>,
    handles: HashMap<CompletionToken, TaskHandle>,
    active: HashSet<CompletionToken>,
    canceled: HashSet<CompletionToken>,
    ignored: HashSet<CompletionToken>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            handles: HashMap::new(),
            active: HashSet::new(),
            canceled: HashSet::new(),
            ignored: HashSet::new(),
        }
    }

    /// Launches `work` and registers it as the active task under `key`.
    ///
    /// Does not look at an existing entry under `key`; callers supersede first.
    /// In synchronous mode the returned signal must be reconciled by the caller.
    pub(crate) fn spawn<V, M>(
        &mut self,
        key: TaskKey,
        work: Work<V>,
        runner: &Runner<V, M>,
    ) -> (CompletionToken, Option<Signal<V, M>>)
    where
        V: Send + 'static,
        M: Send + 'static,
    {
        let token = CompletionToken::mint();
        let (handle, inline) = runner.launch(token, work);

        self.tasks.insert(key, token);
        self.handles.insert(token, handle);
        self.active.insert(token);
        (token, inline)
    }

    /// Requests a stop of the task under `key` and marks it canceled.
    ///
    /// Returns the canceled token, or `None` if `key` is free.
    pub fn cancel(&mut self, key: &str) -> Option<CompletionToken> {
        let token = self.tasks.remove(key)?;
        if let Some(handle) = self.handles.get(&token) {
            handle.request_stop();
        }
        self.active.remove(&token);
        self.canceled.insert(token);
        Some(token)
    }

    /// Marks the task under `key` ignored without stopping it.
    ///
    /// Returns the ignored token, or `None` if `key` is free.
    pub fn ignore(&mut self, key: &str) -> Option<CompletionToken> {
        let token = self.tasks.remove(key)?;
        self.active.remove(&token);
        self.ignored.insert(token);
        Some(token)
    }

    /// Forgets `token` everywhere and releases its monitor. Idempotent.
    pub fn remove(&mut self, token: CompletionToken) {
        if let Some(handle) = self.handles.remove(&token) {
            handle.release();
        }
        self.active.remove(&token);
        self.canceled.remove(&token);
        self.ignored.remove(&token);
        self.tasks.retain(|_, t| *t != token);
    }

    /// Stops every active task (owner shutdown). Returns the canceled tokens.
    pub fn cancel_all(&mut self) -> Vec<CompletionToken> {
        let mut keys: Vec<TaskKey> = self.tasks.keys().cloned().collect();
        keys.sort_unstable();
        keys.iter().filter_map(|key| self.cancel(key.as_str())).collect()
    }

    /// Returns true if a task is registered under `key`.
    #[inline]
    pub fn has_key(&self, key: &str) -> bool {
        self.tasks.contains_key(key)
    }

    /// Returns true if `token`'s outcome would be applied.
    #[inline]
    pub fn is_active(&self, token: CompletionToken) -> bool {
        self.active.contains(&token)
    }

    /// Returns true if `token` belongs to any lifecycle set.
    #[inline]
    pub fn is_known(&self, token: CompletionToken) -> bool {
        self.state(token).is_some()
    }

    /// Returns the lifecycle set `token` is in.
    pub fn state(&self, token: CompletionToken) -> Option<TaskState> {
        if self.active.contains(&token) {
            Some(TaskState::Active)
        } else if self.canceled.contains(&token) {
            Some(TaskState::Canceled)
        } else if self.ignored.contains(&token) {
            Some(TaskState::Ignored)
        } else {
            None
        }
    }

    /// Returns the active token under `key`.
    pub fn token_for(&self, key: &str) -> Option<CompletionToken> {
        self.tasks.get(key).copied()
    }

    /// Returns the key `token` is active under.
    pub fn key_of(&self, token: CompletionToken) -> Option<&TaskKey> {
        self.tasks.iter().find(|(_, t)| **t == token).map(|(k, _)| k)
    }

    /// Returns sorted list of occupied keys.
    pub fn keys(&self) -> Vec<TaskKey> {
        let mut keys: Vec<TaskKey> = self.tasks.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of known (not yet reconciled) tasks.
    pub fn len(&self) -> usize {
        self.active.len() + self.canceled.len() + self.ignored.len()
    }

    /// Returns true if no task is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks)
            .field("active", &self.active)
            .field("canceled", &self.canceled)
            .field("ignored", &self.ignored)
            .finish()
    }
}
