//! # Coordinator configuration.
//!
//! Provides [`Config`], passed explicitly to
//! [`Coordinator::attach`](crate::Coordinator::attach). There is no
//! process-wide configuration: two coordinators in the same process may run in
//! different modes.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by the bus

/// Configuration of a coordinator.
///
/// ## Field semantics
/// - `sync`: run work inline, in the caller's context, and reconcile it immediately
/// - `bus_capacity`: event bus ring buffer size (min 1)
///
/// ## Example
/// ```rust
/// use taskfold::Config;
///
/// let cfg = Config::default();
/// assert!(!cfg.sync);
///
/// let test_cfg = Config::synchronous();
/// assert!(test_cfg.sync);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Execute every task synchronously at spawn time.
    ///
    /// The task is still registered as active and its signal goes through the
    /// regular reconciliation path, so owners observe the same behavior as in
    /// concurrent mode, minus the waiting. Meant for deterministic tests.
    pub sync: bool,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Default configuration with synchronous execution turned on.
    pub fn synchronous() -> Self {
        Self {
            sync: true,
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `sync = false` (tasks run concurrently)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            sync: false,
            bus_capacity: 1024,
        }
    }
}
