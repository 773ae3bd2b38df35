//! Coordinator events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! observe task lifecycle decisions made by the coordinator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: `Coordinator` (spawn, supersede, cancel, reconcile).
//! - **Consumers**: anything holding a receiver from `Coordinator::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
