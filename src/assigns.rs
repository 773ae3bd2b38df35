//! # Owner state boundary.
//!
//! The coordinator never owns the owner's state. It talks to it through the
//! [`Assigns`] trait: read a field, overwrite a batch of fields, transform one
//! field in place, and ask whether the owner can receive asynchronous results
//! at all.
//!
//! [`Socket`] is a `HashMap`-backed implementation good enough for most owners
//! and for tests.
//!
//! ## Applying an outcome
//! ```text
//! Outcome [b: update x*2, a: 1]
//!   └─► partition ─► sets [a: 1]        ─► Assigns::assign (one batch)
//!                └─► updates [b: x*2]   ─► Assigns::update (in order)
//! ```

use std::collections::HashMap;

use crate::error::ApplyError;
use crate::tasks::{Field, Outcome, UpdateFn};

/// Mutable state container of an owner process.
pub trait Assigns {
    /// Type of the values stored in fields.
    type Value;

    /// Returns true once the owner can receive asynchronous results.
    ///
    /// Spawning is skipped while this is false.
    fn is_connected(&self) -> bool;

    /// Reads a field.
    fn get(&self, field: &str) -> Option<&Self::Value>;

    /// Overwrites a batch of fields.
    fn assign(&mut self, batch: Vec<(Field, Self::Value)>);

    /// Replaces `field` with `f(current)`.
    ///
    /// Fails with [`ApplyError::MissingField`] if the field is not present.
    fn update(&mut self, field: &str, f: UpdateFn<Self::Value>) -> Result<(), ApplyError>;
}

/// Folds `outcome` into `assigns`: overwrites first as one batch, then each
/// relative update in the order the task listed it.
///
/// Every update target is checked before anything is written, so a
/// [`ApplyError::MissingField`] leaves `assigns` untouched.
pub fn apply_outcome<A: Assigns>(
    assigns: &mut A,
    outcome: Outcome<A::Value>,
) -> Result<(), ApplyError> {
    let (sets, updates) = outcome.partition();
    for (field, _) in &updates {
        if assigns.get(field).is_none() && !sets.iter().any(|(set, _)| set == field) {
            return Err(ApplyError::MissingField { field: field.clone() });
        }
    }
    if !sets.is_empty() {
        assigns.assign(sets);
    }
    for (field, f) in updates {
        assigns.update(&field, f)?;
    }
    Ok(())
}

/// `HashMap`-backed owner state with a connection flag.
///
/// ## Example
/// ```rust
/// use taskfold::{Assigns, Socket};
///
/// let mut socket = Socket::connected().with("count", 5);
/// socket.update("count", Box::new(|n: i32| n + 1)).unwrap();
/// assert_eq!(socket.get("count"), Some(&6));
/// ```
#[derive(Debug, Clone)]
pub struct Socket<V> {
    connected: bool,
    fields: HashMap<Field, V>,
}

impl<V> Socket<V> {
    /// Creates an empty, not yet connected socket.
    pub fn new() -> Self {
        Self {
            connected: false,
            fields: HashMap::new(),
        }
    }

    /// Creates an empty, connected socket.
    pub fn connected() -> Self {
        Self {
            connected: true,
            fields: HashMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<Field>, value: V) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Inserts or overwrites a single field.
    pub fn put(&mut self, field: impl Into<Field>, value: V) {
        self.fields.insert(field.into(), value);
    }

    /// Marks the socket as connected (or disconnected).
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Number of fields held.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are held.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<V> Default for Socket<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Assigns for Socket<V> {
    type Value = V;

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn get(&self, field: &str) -> Option<&V> {
        self.fields.get(field)
    }

    fn assign(&mut self, batch: Vec<(Field, V)>) {
        self.fields.extend(batch);
    }

    fn update(&mut self, field: &str, f: UpdateFn<V>) -> Result<(), ApplyError> {
        let Some((name, current)) = self.fields.remove_entry(field) else {
            return Err(ApplyError::MissingField {
                field: Field::Owned(field.to_string()),
            });
        };
        self.fields.insert(name, f(current));
        Ok(())
    }
}
