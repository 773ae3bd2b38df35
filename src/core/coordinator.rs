//! # Coordinator: spawn-or-supersede and reconciliation.
//!
//! The [`Coordinator`] is the protocol layer on top of [`TaskRegistry`]. It
//! starts tasks under logical keys and decides, for every terminal signal the
//! owner receives, whether to apply it, drop it, or fail the owner.
//!
//! ## Reconciliation
//! ```text
//! Signal                 Registry says          Outcome
//! ─────────────────────  ─────────────────────  ──────────────────────────────────
//! Completion(tok, out)   active                 apply(out) ─► remove ─► Consumed
//! Completion(tok, _)     canceled / ignored     remove ─► Consumed
//! Crash(tok, cause)      active                 remove ─► Err(TaskCrashed)
//! Crash(tok, _)          canceled / ignored     remove ─► Consumed
//! any                    unknown                NotMine(signal)
//! Other(m)               -                      NotMine(signal)
//! ```
//!
//! "Unknown" always defers to other handlers: the coordinator never claims a
//! signal it did not originate.
//!
//! ## Example
//! ```rust
//! use taskfold::{Assigns, Config, Coordinator, Outcome, Socket, Work};
//!
//! # fn main() -> Result<(), taskfold::RuntimeError> {
//! let (mut coord, _inbox) = Coordinator::<i64>::attach(Config::synchronous());
//! let mut socket = Socket::connected().with("count", 5);
//!
//! coord.spawn_or_supersede(&mut socket, "bump", Work::new(|_| {
//!     Ok(Outcome::new().update("count", |n: i64| n + 1))
//! }))?;
//!
//! assert_eq!(socket.get("count"), Some(&6));
//! assert!(coord.registry().is_empty());
//! # Ok(())
//! # }
//! ```

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::assigns::{Assigns, apply_outcome};
use crate::core::config::Config;
use crate::core::registry::TaskRegistry;
use crate::core::runner::Runner;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::signal::{Dispatch, Inbox, Mailbox, Signal};
use crate::tasks::{CompletionToken, TaskKey, Work};

/// Starts background tasks for one owner and reconciles their signals.
pub struct Coordinator<V, M = ()> {
    cfg: Config,
    registry: TaskRegistry,
    runner: Runner<V, M>,
    bus: Bus,
}

impl<V, M> Coordinator<V, M>
where
    V: Send + 'static,
    M: Send + 'static,
{
    /// Creates a coordinator and the inbox its signals are delivered to.
    ///
    /// The owner keeps the [`Inbox`] and feeds every message it receives to
    /// [`reconcile`](Self::reconcile).
    pub fn attach(cfg: Config) -> (Self, Inbox<V, M>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let coord = Self {
            runner: Runner::new(tx, cfg.sync),
            bus: Bus::new(cfg.bus_capacity_clamped()),
            registry: TaskRegistry::new(),
            cfg,
        };
        (coord, rx)
    }

    /// Starts `work` under `key`, demoting any task already there to ignored.
    ///
    /// Returns `Ok(None)` without spawning when the owner is not connected.
    /// In synchronous mode the outcome is applied before this returns, so the
    /// fatal cases of [`reconcile`](Self::reconcile) apply here too.
    pub fn spawn_or_supersede<A>(
        &mut self,
        assigns: &mut A,
        key: impl Into<TaskKey>,
        work: Work<V>,
    ) -> Result<Option<CompletionToken>, RuntimeError>
    where
        A: Assigns<Value = V>,
    {
        let key = key.into();
        if !assigns.is_connected() {
            debug!(key = %key, "owner not connected; skipping spawn");
            self.bus.publish(Event::new(EventKind::SpawnSkipped).with_key(key.as_str()));
            return Ok(None);
        }

        if let Some(prior) = self.registry.ignore(key.as_str()) {
            debug!(key = %key, token = %prior, "superseding running task");
            self.bus.publish(
                Event::new(EventKind::TaskSuperseded)
                    .with_key(key.as_str())
                    .with_token(prior),
            );
        }

        let (token, inline) = self.registry.spawn(key.clone(), work, &self.runner);
        debug!(key = %key, token = %token, sync = self.cfg.sync, "task spawned");
        self.bus.publish(
            Event::new(EventKind::TaskSpawned)
                .with_key(key.as_str())
                .with_token(token),
        );

        if let Some(signal) = inline {
            self.reconcile(assigns, signal)?;
        }
        Ok(Some(token))
    }

    /// Stops the task under `key`. Its late signal will be absorbed.
    ///
    /// Returns false if no task was registered under `key`.
    pub fn cancel(&mut self, key: &str) -> bool {
        match self.registry.cancel(key) {
            Some(token) => {
                info!(key, token = %token, "task canceled");
                self.bus.publish(
                    Event::new(EventKind::TaskCanceled)
                        .with_key(key)
                        .with_token(token),
                );
                true
            }
            None => false,
        }
    }

    /// Classifies one incoming signal and acts on it.
    ///
    /// Returns [`Dispatch::NotMine`] with the untouched signal when it does not
    /// belong to this coordinator. Returns `Err` when the owner must stop: an
    /// active task crashed, or its outcome could not be applied.
    pub fn reconcile<A>(
        &mut self,
        assigns: &mut A,
        signal: Signal<V, M>,
    ) -> Result<Dispatch<V, M>, RuntimeError>
    where
        A: Assigns<Value = V>,
    {
        match signal {
            Signal::Completion { token, outcome } if self.registry.is_active(token) => {
                let key = self.registry.key_of(token).cloned();
                let applied = apply_outcome(assigns, outcome);
                self.registry.remove(token);
                applied?;

                debug!(key = ?key, token = %token, "outcome applied");
                let mut ev = Event::new(EventKind::ResultApplied).with_token(token);
                if let Some(key) = &key {
                    ev = ev.with_key(key.as_str());
                }
                self.bus.publish(ev);
                Ok(Dispatch::Consumed)
            }
            Signal::Completion { token, .. } if self.registry.is_known(token) => {
                self.registry.remove(token);
                debug!(token = %token, "stale outcome discarded");
                self.bus
                    .publish(Event::new(EventKind::ResultDiscarded).with_token(token));
                Ok(Dispatch::Consumed)
            }
            Signal::Crash { token, cause } if self.registry.is_active(token) => {
                let key = self.registry.key_of(token).cloned();
                self.registry.remove(token);

                error!(key = ?key, token = %token, cause = %cause, "active task crashed");
                let mut ev = Event::new(EventKind::TaskCrashed)
                    .with_token(token)
                    .with_reason(cause.as_message());
                if let Some(key) = &key {
                    ev = ev.with_key(key.as_str());
                }
                self.bus.publish(ev);
                Err(RuntimeError::TaskCrashed { key, token, cause })
            }
            Signal::Crash { token, cause } if self.registry.is_known(token) => {
                self.registry.remove(token);
                warn!(token = %token, cause = %cause, "crash of discarded task absorbed");
                self.bus.publish(
                    Event::new(EventKind::CrashAbsorbed)
                        .with_token(token)
                        .with_reason(cause.as_message()),
                );
                Ok(Dispatch::Consumed)
            }
            other => Ok(Dispatch::NotMine(other)),
        }
    }

    /// Stops every active task (owner shutdown).
    pub fn shutdown(&mut self) {
        let canceled = self.registry.cancel_all();
        if !canceled.is_empty() {
            info!(count = canceled.len(), "canceled outstanding tasks on shutdown");
        }
        for token in canceled {
            self.bus
                .publish(Event::new(EventKind::TaskCanceled).with_token(token));
        }
    }

    /// Returns a sender for posting messages to the owner's inbox.
    pub fn mailbox(&self) -> Mailbox<V, M> {
        self.runner.mailbox()
    }

    /// Subscribes to coordinator events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Read access to the task bookkeeping.
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Returns the configuration this coordinator was attached with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc as std_mpsc;

    use super::*;
    use crate::assigns::Socket;
    use crate::core::registry::TaskState;
    use crate::error::{ApplyError, TaskError};
    use crate::tasks::Outcome;

    type Coord = Coordinator<i64>;

    async fn next(inbox: &mut Inbox<i64>) -> Signal<i64> {
        inbox.recv().await.expect("inbox closed")
    }

    /// Work that blocks until `release` fires, then sets `field` to `value`.
    fn gated(field: &'static str, value: i64) -> (Work<i64>, std_mpsc::Sender<()>) {
        let (release, gate) = std_mpsc::channel::<()>();
        let work = Work::new(move |_| {
            let _ = gate.recv();
            Ok(Outcome::new().set(field, value))
        });
        (work, release)
    }

    #[tokio::test]
    async fn test_completion_of_active_task_is_applied() {
        let (mut coord, mut inbox) = Coord::attach(Config::default());
        let mut socket = Socket::connected().with("a", 0);

        let token = coord
            .spawn_or_supersede(&mut socket, "load", Work::new(|_| Ok(Outcome::new().set("a", 7))))
            .unwrap()
            .unwrap();

        let signal = next(&mut inbox).await;
        assert_eq!(signal.token(), Some(token));
        assert!(coord.reconcile(&mut socket, signal).unwrap().is_consumed());

        assert_eq!(socket.get("a"), Some(&7));
        assert!(coord.registry().is_empty());
    }

    #[tokio::test]
    async fn test_superseded_result_is_never_applied() {
        let (mut coord, mut inbox) = Coord::attach(Config::default());
        let mut socket = Socket::connected().with("v", 0);

        let (first, release_first) = gated("v", 1);
        let t1 = coord.spawn_or_supersede(&mut socket, "k", first).unwrap().unwrap();
        let (second, release_second) = gated("v", 2);
        let t2 = coord.spawn_or_supersede(&mut socket, "k", second).unwrap().unwrap();

        assert!(!coord.registry().is_active(t1));
        assert!(coord.registry().is_known(t1));
        assert_eq!(coord.registry().token_for("k"), Some(t2));

        release_second.send(()).unwrap();
        let signal = next(&mut inbox).await;
        assert_eq!(signal.token(), Some(t2));
        coord.reconcile(&mut socket, signal).unwrap();
        assert_eq!(socket.get("v"), Some(&2));

        release_first.send(()).unwrap();
        let signal = next(&mut inbox).await;
        assert_eq!(signal.token(), Some(t1));
        assert!(coord.reconcile(&mut socket, signal).unwrap().is_consumed());

        assert_eq!(socket.get("v"), Some(&2));
        assert!(coord.registry().is_empty());
    }

    #[tokio::test]
    async fn test_relative_update_sees_state_at_reconciliation() {
        let (mut coord, mut inbox) = Coord::attach(Config::default());
        let mut socket = Socket::connected().with("count", 5);

        let (release, gate) = std_mpsc::channel::<()>();
        let work = Work::new(move |_| {
            let _ = gate.recv();
            Ok(Outcome::new().update("count", |n: i64| n + 1))
        });
        coord.spawn_or_supersede(&mut socket, "inc", work).unwrap();

        socket.put("count", 10);
        release.send(()).unwrap();

        let signal = next(&mut inbox).await;
        coord.reconcile(&mut socket, signal).unwrap();
        assert_eq!(socket.get("count"), Some(&11));
    }

    #[tokio::test]
    async fn test_crash_of_active_task_is_fatal() {
        let (mut coord, mut inbox) = Coord::attach(Config::default());
        let mut socket = Socket::connected().with("a", 0);

        let token = coord
            .spawn_or_supersede(&mut socket, "boom", Work::new(|_| Err(TaskError::fail("db down"))))
            .unwrap()
            .unwrap();

        let signal = next(&mut inbox).await;
        match coord.reconcile(&mut socket, signal) {
            Err(RuntimeError::TaskCrashed { key, token: t, cause }) => {
                assert_eq!(key, Some(TaskKey::from("boom")));
                assert_eq!(t, token);
                assert_eq!(cause, TaskError::fail("db down"));
            }
            other => panic!("expected fatal crash, got {other:?}"),
        }
        assert_eq!(socket.get("a"), Some(&0));
        assert!(!coord.registry().is_known(token));
    }

    #[tokio::test]
    async fn test_crash_of_canceled_task_is_absorbed() {
        let (mut coord, mut inbox) = Coord::attach(Config::default());
        let mut socket = Socket::connected().with("a", 0);

        let (release, gate) = std_mpsc::channel::<()>();
        let work = Work::new(move |ctx: tokio_util::sync::CancellationToken| {
            let _ = gate.recv();
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            Ok(Outcome::new().set("a", 1))
        });
        let token = coord.spawn_or_supersede(&mut socket, "k", work).unwrap().unwrap();

        assert!(coord.cancel("k"));
        assert!(!coord.cancel("k"));
        release.send(()).unwrap_or(());

        let signal = next(&mut inbox).await;
        assert_eq!(signal.token(), Some(token));
        assert!(matches!(signal, Signal::Crash { .. }));
        assert!(coord.reconcile(&mut socket, signal).unwrap().is_consumed());

        assert_eq!(socket.get("a"), Some(&0));
        assert!(coord.registry().is_empty());
    }

    #[tokio::test]
    async fn test_completion_of_canceled_task_is_discarded() {
        let (mut coord, mut inbox) = Coord::attach(Config::default());
        let mut socket = Socket::connected().with("a", 0);

        let (started_tx, started) = tokio::sync::oneshot::channel::<()>();
        let (release, gate) = std_mpsc::channel::<()>();
        let work = Work::new(move |_| {
            let _ = started_tx.send(());
            let _ = gate.recv();
            Ok(Outcome::new().set("a", 9))
        });
        let token = coord.spawn_or_supersede(&mut socket, "k", work).unwrap().unwrap();

        started.await.unwrap();
        assert!(coord.cancel("k"));
        assert_eq!(coord.registry().state(token), Some(TaskState::Canceled));
        release.send(()).unwrap();

        let signal = next(&mut inbox).await;
        assert_eq!(signal.token(), Some(token));
        assert!(matches!(signal, Signal::Completion { .. }));
        assert!(coord.reconcile(&mut socket, signal).unwrap().is_consumed());

        assert_eq!(socket.get("a"), Some(&0));
        assert!(coord.registry().is_empty());
    }

    #[tokio::test]
    async fn test_crash_of_ignored_task_is_absorbed() {
        let (mut coord, mut inbox) = Coord::attach(Config::default());
        let mut socket = Socket::connected();

        let (release, gate) = std_mpsc::channel::<()>();
        let first = Work::new(move |_| -> Result<Outcome<i64>, TaskError> {
            let _ = gate.recv();
            panic!("late failure")
        });
        let t1 = coord.spawn_or_supersede(&mut socket, "k", first).unwrap().unwrap();
        let (second, release_second) = gated("v", 3);
        coord.spawn_or_supersede(&mut socket, "k", second).unwrap();

        release.send(()).unwrap();
        let signal = next(&mut inbox).await;
        assert_eq!(signal.token(), Some(t1));
        assert!(coord.reconcile(&mut socket, signal).unwrap().is_consumed());

        release_second.send(()).unwrap();
        let signal = next(&mut inbox).await;
        coord.reconcile(&mut socket, signal).unwrap();
        assert_eq!(socket.get("v"), Some(&3));
    }

    #[test]
    fn test_unknown_signals_pass_through() {
        let (mut coord, _inbox) = Coordinator::<i64, &'static str>::attach(Config::default());
        let mut socket = Socket::connected().with("a", 0);

        let stranger = CompletionToken::mint();
        let completion = Signal::Completion {
            token: stranger,
            outcome: Outcome::new().set("a", 99),
        };
        let crash = Signal::Crash {
            token: stranger,
            cause: TaskError::Canceled,
        };

        for signal in [completion, crash, Signal::Other("tick")] {
            match coord.reconcile(&mut socket, signal).unwrap() {
                Dispatch::NotMine(_) => {}
                Dispatch::Consumed => panic!("foreign signal consumed"),
            }
        }
        assert_eq!(socket.get("a"), Some(&0));
    }

    #[test]
    fn test_disconnected_owner_skips_spawn() {
        let (mut coord, _inbox) = Coord::attach(Config::synchronous());
        let mut socket = Socket::new().with("a", 0);

        let spawned = coord
            .spawn_or_supersede(&mut socket, "k", Work::new(|_| Ok(Outcome::new().set("a", 1))))
            .unwrap();

        assert_eq!(spawned, None);
        assert_eq!(socket.get("a"), Some(&0));
        assert!(coord.registry().is_empty());
    }

    #[test]
    fn test_sync_mode_applies_immediately() {
        let (mut coord, _inbox) = Coord::attach(Config::synchronous());
        let mut socket = Socket::connected().with("a", 0).with("b", 3);

        let work = Work::new(|_| Ok(Outcome::new().update("b", |x: i64| x * 2).set("a", 1)));
        coord.spawn_or_supersede(&mut socket, "k", work).unwrap();

        assert_eq!(socket.get("a"), Some(&1));
        assert_eq!(socket.get("b"), Some(&6));
        assert!(coord.registry().is_empty());
    }

    #[test]
    fn test_sync_mode_crash_is_fatal() {
        let (mut coord, _inbox) = Coord::attach(Config::synchronous());
        let mut socket = Socket::connected();

        let err = coord
            .spawn_or_supersede(&mut socket, "k", Work::new(|_| panic!("inline boom")))
            .unwrap_err();

        assert_eq!(err.as_label(), "runtime_task_crashed");
        assert!(coord.registry().is_empty());
    }

    #[test]
    fn test_missing_field_update_is_fatal_and_cleans_up() {
        let (mut coord, _inbox) = Coord::attach(Config::synchronous());
        let mut socket = Socket::connected();

        let work = Work::new(|_| Ok(Outcome::new().update("nope", |x: i64| x)));
        let err = coord.spawn_or_supersede(&mut socket, "k", work).unwrap_err();

        match err {
            RuntimeError::Apply(ApplyError::MissingField { field }) => assert_eq!(field, "nope"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(coord.registry().is_empty());
    }

    #[test]
    fn test_events_follow_decisions() {
        let (mut coord, _inbox) = Coord::attach(Config::synchronous());
        let mut events = coord.subscribe();
        let mut socket = Socket::connected();

        coord
            .spawn_or_supersede(&mut socket, "k", Work::new(|_| Ok(Outcome::new().set("a", 1))))
            .unwrap();

        let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::TaskSpawned, EventKind::ResultApplied]);
    }
}
