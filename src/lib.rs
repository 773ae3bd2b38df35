//! # taskfold
//!
//! **taskfold** lets a long-lived, single-threaded stateful process (the
//! *owner*) hand expensive work to background tasks and later fold each
//! result back into its own state, even though that state may have changed
//! while the task ran.
//!
//! Running work in the background is the easy part. This crate is about the
//! bookkeeping around it: task slots reused before their predecessor finishes,
//! completions racing with cancellation, and crashes that must be told apart
//! from results the owner already stopped caring about.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   owner code
//!     │ spawn_or_supersede(key, work)          cancel(key)
//!     ▼                                            │
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Coordinator                                                     │
//! │  - TaskRegistry (key → token, active / canceled / ignored)       │
//! │  - Runner (blocking pool or inline)                              │
//! │  - Bus (broadcast events)                                        │
//! └──────┬─────────────────────────────────────────────▲─────────────┘
//!        │ spawn_blocking(work) + monitor               │ reconcile(signal)
//!        ▼                                              │
//!   ┌──────────┐  ┌──────────┐  ┌──────────┐            │
//!   │  task #1 │  │  task #2 │  │  task #3 │            │
//!   └────┬─────┘  └────┬─────┘  └────┬─────┘            │
//!        │ Completion / Crash (exactly one each)         │
//!        ▼                                              │
//! ┌──────────────────────────────────────┐              │
//! │  Inbox (mpsc, arbitrary order)       │──────────────┘
//! │  + Signal::Other(m) from elsewhere   │   NotMine ─► owner's own handler
//! └──────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle of a token
//! ```text
//! spawn ──► active ──┬─ superseded ─► ignored  ─┐
//!                    ├─ cancel      ─► canceled ─┤
//!                    │                           ├─ terminal signal ─► removed (absorbed)
//!                    └─ terminal signal ─► removed
//!                         ├─ Completion ─► outcome applied
//!                         └─ Crash      ─► fatal RuntimeError
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                      |
//! |-------------------|------------------------------------------------------------------|-----------------------------------------|
//! | **Coordination**  | Spawn, supersede, cancel and reconcile background tasks.         | [`Coordinator`], [`TaskRegistry`]       |
//! | **Owner state**   | Boundary to the owner's state; overwrite vs relative update.     | [`Assigns`], [`Socket`], [`Outcome`]    |
//! | **Owner loop**    | Reference message loop routing signals through the coordinator.  | [`Owner`], [`Signal`], [`Dispatch`]     |
//! | **Errors**        | Fatal owner errors, crash causes, apply failures.                | [`RuntimeError`], [`TaskError`]         |
//! | **Events**        | Lifecycle decisions on a broadcast bus.                          | [`Event`], [`EventKind`]                |
//! | **Configuration** | Concurrent or synchronous execution.                             | [`Config`]                              |
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskfold::{Assigns, Config, Outcome, Owner, Socket, Work};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let socket = Socket::connected().with("user", String::new());
//!     let (mut owner, inbox) = Owner::<_, ()>::mount(socket, Config::default());
//!
//!     owner.start_async("user", Work::new(|_ctx: CancellationToken| {
//!         // expensive lookup...
//!         Ok(Outcome::new().set("user", "ada".to_string()))
//!     }))?;
//!
//!     let shutdown = CancellationToken::new();
//!     let stop = shutdown.clone();
//!     let mut events = owner.coordinator().subscribe();
//!     tokio::spawn(async move {
//!         // stop once the result has been applied
//!         while let Ok(ev) = events.recv().await {
//!             if ev.kind == taskfold::EventKind::ResultApplied {
//!                 stop.cancel();
//!             }
//!         }
//!     });
//!
//!     let socket = owner.run(inbox, shutdown, |_, _| Ok(())).await?;
//!     assert_eq!(socket.get("user").map(String::as_str), Some("ada"));
//!     Ok(())
//! }
//! ```
mod assigns;
mod core;
mod error;
mod events;
mod signal;
mod tasks;

// ---- Public re-exports ----

pub use assigns::{Assigns, Socket, apply_outcome};
pub use core::{Config, Coordinator, Owner, TaskRegistry, TaskState};
pub use error::{ApplyError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use signal::{Dispatch, Inbox, Mailbox, Signal};
pub use tasks::{Assign, CompletionToken, Field, Outcome, TaskKey, UpdateFn, Work, WorkResult};
