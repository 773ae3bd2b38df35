//! # Task keys.
//!
//! A [`TaskKey`] names a *slot* ("the task currently loading the profile"),
//! not a task instance. Many instances may occupy the same key over time.

use std::borrow::{Borrow, Cow};
use std::fmt;

/// Caller-chosen logical name of a task slot.
///
/// ## Example
/// ```rust
/// use taskfold::TaskKey;
///
/// let key = TaskKey::from("profile");
/// assert_eq!(key.as_str(), "profile");
/// assert_eq!(key, TaskKey::from(String::from("profile")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskKey(Cow<'static, str>);

impl TaskKey {
    /// Creates a key from a static or owned string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TaskKey {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for TaskKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl Borrow<str> for TaskKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
