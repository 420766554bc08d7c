//! Reactive Field Implementation
//!
//! A ReactiveField is the fundamental reactive primitive. It holds one
//! value and owns the dependency set that tracks which watchers depend
//! on it.
//!
//! # How Fields Work
//!
//! 1. When a field is read within an evaluation context, the field
//!    registers the evaluating watcher as a subscriber.
//!
//! 2. When a field's value changes, all subscribers are notified. Writing
//!    the current value back is a no-op: equality is the value type's
//!    `PartialEq`, no deeper comparison is attempted.
//!
//! 3. Notification drives re-evaluation of dependent watchers,
//!    synchronously, before the write returns.
//!
//! # Invariant
//!
//! A field has exactly one dependency set, created with the field and
//! never replaced.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use super::context::EvalContext;
use super::dep::Dep;

/// A reactive field holding a value of type T.
///
/// Clones share the same cell and dependency set, so a closure can own a
/// cheap handle to the field it reads.
///
/// # Example
///
/// ```rust,ignore
/// let count = ReactiveField::new(0);
///
/// // Read the value (registers a dependency inside an evaluation)
/// let value = count.get();
///
/// // Update the value (notifies subscribers; equal writes are no-ops)
/// count.set(5);
/// ```
pub struct ReactiveField<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// The current value.
    value: Arc<RwLock<T>>,

    /// The field's dependency set. Created once, never replaced.
    dep: Arc<Dep>,
}

impl<T> ReactiveField<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new field with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
            dep: Arc::new(Dep::new()),
        }
    }

    /// Get the current value.
    ///
    /// If called within an evaluation context, also registers the
    /// evaluating watcher against this field's dependency set.
    pub fn get(&self) -> T {
        if EvalContext::is_active() {
            self.dep.depend();
        }

        self.value.read().expect("value lock poisoned").clone()
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.read().expect("value lock poisoned").clone()
    }

    /// Set a new value and notify subscribers.
    ///
    /// Writing a value equal to the current one is a no-op: the store is
    /// skipped and no notification happens. Otherwise every subscriber
    /// re-evaluates before this call returns.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write().expect("value lock poisoned");
            if *guard == value {
                return;
            }
            *guard = value;
        }
        // Lock released before the cascade: subscribers re-read this field.

        tracing::trace!(dep_id = self.dep.id(), "field changed");
        self.dep.notify();
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.value.read().expect("value lock poisoned");
            f(&guard)
        };
        self.set(new_value);
    }

    /// The field's dependency set.
    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    /// Get the number of recorded subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.dep.subscriber_count()
    }
}

impl<T> Clone for ReactiveField<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            dep: Arc::clone(&self.dep),
        }
    }
}

impl<T> Debug for ReactiveField<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveField")
            .field("dep_id", &self.dep.id())
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
