//! # Task outcomes.
//!
//! An [`Outcome`] is what a finished task hands back to its owner: an ordered
//! list of field assignments. Each entry is either
//! - [`Assign::Set`] the value overwrites the field, or
//! - [`Assign::Update`] a function applied to the field's value **at
//!   reconciliation time**.
//!
//! Use `Update` whenever the owner may change the field while the task runs
//! (counters, appends). A value captured at spawn time would be stale.
//!
//! ## Example
//! ```rust
//! use taskfold::Outcome;
//!
//! let outcome: Outcome<i64> = Outcome::new()
//!     .update("count", |n: i64| n + 1)
//!     .set("loading", 0);
//! assert_eq!(outcome.len(), 2);
//! ```

use std::borrow::Cow;
use std::fmt;

/// Name of a field in owner state.
pub type Field = Cow<'static, str>;

/// Relative update applied to a field's current value.
pub type UpdateFn<V> = Box<dyn FnOnce(V) -> V + Send + 'static>;

/// One entry of an [`Outcome`].
pub enum Assign<V> {
    /// Replace the field with this value.
    Set(Field, V),
    /// Replace the field with `f(current)`.
    Update(Field, UpdateFn<V>),
}

impl<V> Assign<V> {
    /// Returns the targeted field.
    pub fn field(&self) -> &str {
        match self {
            Assign::Set(field, _) | Assign::Update(field, _) => field,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Assign<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assign::Set(field, value) => f.debug_tuple("Set").field(field).field(value).finish(),
            Assign::Update(field, _) => {
                f.debug_tuple("Update").field(field).field(&"<fn>").finish()
            }
        }
    }
}

/// Ordered collection of field assignments produced by a task.
pub struct Outcome<V> {
    assigns: Vec<Assign<V>>,
}

impl<V> Outcome<V> {
    /// Creates an empty outcome.
    pub fn new() -> Self {
        Self { assigns: Vec::new() }
    }

    /// Appends an overwrite.
    pub fn set(mut self, field: impl Into<Field>, value: V) -> Self {
        self.assigns.push(Assign::Set(field.into(), value));
        self
    }

    /// Appends a relative update.
    pub fn update<F>(mut self, field: impl Into<Field>, f: F) -> Self
    where
        F: FnOnce(V) -> V + Send + 'static,
    {
        self.assigns.push(Assign::Update(field.into(), Box::new(f)));
        self
    }

    /// Appends an already-built entry.
    pub fn push(&mut self, assign: Assign<V>) {
        self.assigns.push(assign);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.assigns.len()
    }

    /// Returns true if the outcome assigns nothing.
    pub fn is_empty(&self) -> bool {
        self.assigns.is_empty()
    }

    /// Iterates entries in the order the task produced them.
    pub fn iter(&self) -> impl Iterator<Item = &Assign<V>> {
        self.assigns.iter()
    }

    /// Splits into overwrites and updates, each keeping its original order.
    pub fn partition(self) -> (Vec<(Field, V)>, Vec<(Field, UpdateFn<V>)>) {
        let mut sets = Vec::new();
        let mut updates = Vec::new();
        for assign in self.assigns {
            match assign {
                Assign::Set(field, value) => sets.push((field, value)),
                Assign::Update(field, f) => updates.push((field, f)),
            }
        }
        (sets, updates)
    }
}

impl<V> Default for Outcome<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<Assign<V>> for Outcome<V> {
    fn from_iter<I: IntoIterator<Item = Assign<V>>>(iter: I) -> Self {
        Self {
            assigns: iter.into_iter().collect(),
        }
    }
}

impl<V> IntoIterator for Outcome<V> {
    type Item = Assign<V>;
    type IntoIter = std::vec::IntoIter<Assign<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.assigns.into_iter()
    }
}

impl<V: fmt::Debug> fmt::Debug for Outcome<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.assigns.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_keeps_relative_order() {
        let outcome: Outcome<i32> = Outcome::new()
            .update("b", |x: i32| x * 2)
            .set("a", 1)
            .update("c", |x: i32| x + 1)
            .set("d", 4);

        let (sets, updates) = outcome.partition();
        let set_fields: Vec<_> = sets.iter().map(|(f, v)| (f.as_ref(), *v)).collect();
        let update_fields: Vec<_> = updates.iter().map(|(f, _)| f.as_ref()).collect();

        assert_eq!(set_fields, vec![("a", 1), ("d", 4)]);
        assert_eq!(update_fields, vec!["b", "c"]);
    }

    #[test]
    fn test_debug_hides_closures() {
        let outcome: Outcome<i32> = Outcome::new().set("a", 1).update("b", |x: i32| x);
        assert_eq!(format!("{outcome:?}"), r#"[Set("a", 1), Update("b", "<fn>")]"#);
    }
}
