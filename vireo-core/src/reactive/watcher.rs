//! Watcher Implementation
//!
//! A Watcher is a re-evaluatable computation, typically a render function.
//! It subscribes to every dependency set it reads during evaluation and is
//! re-invoked when any of them changes.
//!
//! # How Watchers Work
//!
//! 1. Construction evaluates the closure once to obtain the baseline value
//!    and perform the first dependency-discovery pass.
//!
//! 2. Evaluation runs inside an [`EvalContext`] scope: every reactive field
//!    read during the call registers this watcher via
//!    `Dep::depend` -> `add_dep`.
//!
//! 3. When a dependency notifies, `update` re-evaluates; if the computed
//!    value changed, the change callback runs with (new, old).
//!
//! # Subscription Lifetime
//!
//! A watcher subscribes to a given dep at most once, keyed by the dep's id,
//! and never unsubscribes; it lives for its owner's lifetime. Dependency
//! sets hold it weakly, so dropping the owner is the only teardown.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use super::context::EvalContext;
use super::dep::Dep;

/// Counter for generating unique watcher IDs.
static WATCHER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique watcher ID.
fn next_watcher_id() -> u64 {
    WATCHER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The face a watcher shows to dependency sets.
///
/// Deps hold `Weak<dyn Watch>` handles, so watchers of different value
/// types can share one subscriber list. `Arc<Self>` receivers keep the
/// trait object-safe while letting `add_dep` hand a weak self-handle back
/// to the dep.
pub trait Watch: Send + Sync {
    /// Get the watcher's unique ID.
    fn watcher_id(&self) -> u64;

    /// Subscribe to `dep`, at most once per watcher lifetime.
    fn add_dep(self: Arc<Self>, dep: &Dep);

    /// Re-evaluate in response to a dependency change.
    fn update(self: Arc<Self>);
}

/// Change callback, invoked with (new value, old value).
pub type ChangeCallback<T> = Arc<dyn Fn(&T, &T) + Send + Sync>;

/// A re-evaluatable computation subscribed to the fields it reads.
///
/// # Type Parameters
///
/// - `T`: the computed value. `PartialEq` is what lets `update` skip the
///   callback when a recomputation lands on the same value.
///
/// # Example
///
/// ```rust,ignore
/// let count = ReactiveField::new(0);
///
/// let count_reader = count.clone();
/// let watcher = Watcher::with_callback(
///     move || count_reader.get() * 2,
///     |new, old| println!("{old} -> {new}"),
/// );
///
/// count.set(5); // prints "0 -> 10"
/// ```
pub struct Watcher<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Unique identifier for this watcher.
    id: u64,

    /// The evaluation function.
    eval: Arc<dyn Fn() -> T + Send + Sync>,

    /// Invoked with (new, old) when a re-evaluation changes the value.
    on_change: Option<ChangeCallback<T>>,

    /// The last computed value. Always `Some` after construction.
    value: RwLock<Option<T>>,

    /// Ids of the deps this watcher is subscribed to. Registration is
    /// idempotent by id: a dep read twice in one evaluation, or read again
    /// in a later evaluation, subscribes only once.
    dep_ids: RwLock<HashSet<u64>>,
}

impl<T> Watcher<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a watcher with no change callback.
    ///
    /// The closure runs immediately to establish the baseline value and
    /// initial subscriptions.
    pub fn new<F>(eval: F) -> Arc<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(Arc::new(eval), None)
    }

    /// Create a watcher that invokes `on_change` with (new, old) whenever
    /// a re-evaluation produces a different value.
    pub fn with_callback<F, C>(eval: F, on_change: C) -> Arc<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
        C: Fn(&T, &T) + Send + Sync + 'static,
    {
        Self::build(Arc::new(eval), Some(Arc::new(on_change)))
    }

    fn build(
        eval: Arc<dyn Fn() -> T + Send + Sync>,
        on_change: Option<ChangeCallback<T>>,
    ) -> Arc<Self> {
        let watcher = Arc::new(Self {
            id: next_watcher_id(),
            eval,
            on_change,
            value: RwLock::new(None),
            dep_ids: RwLock::new(HashSet::new()),
        });

        // Baseline pass: compute the initial value and discover
        // dependencies. The change callback does not run for the baseline.
        let baseline = Self::evaluate(&watcher);
        *watcher.value.write().expect("value lock poisoned") = Some(baseline);

        watcher
    }

    /// Run the evaluation closure inside a fresh context scope.
    ///
    /// The scope guard clears the context on every exit path, so a
    /// panicking evaluation cannot leave the slot pointing at this watcher.
    fn evaluate(this: &Arc<Self>) -> T {
        let this_dyn: Arc<dyn Watch> = this.clone();
        let weak: Weak<dyn Watch> = Arc::downgrade(&this_dyn);
        let _ctx = EvalContext::enter(this.id, weak);
        (this.eval)()
    }

    /// Get the watcher's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Clone of the last computed value.
    pub fn value(&self) -> T {
        self.value
            .read()
            .expect("value lock poisoned")
            .clone()
            .expect("watcher evaluated at construction")
    }

    /// Number of dependency sets this watcher is subscribed to.
    pub fn dep_count(&self) -> usize {
        self.dep_ids.read().expect("dep id lock poisoned").len()
    }
}

impl<T> Watch for Watcher<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn watcher_id(&self) -> u64 {
        self.id
    }

    fn add_dep(self: Arc<Self>, dep: &Dep) {
        let newly_tracked = self
            .dep_ids
            .write()
            .expect("dep id lock poisoned")
            .insert(dep.id());

        if newly_tracked {
            tracing::trace!(watcher_id = self.id, dep_id = dep.id(), "subscribing");
            let self_dyn: Arc<dyn Watch> = self.clone();
            let weak: Weak<dyn Watch> = Arc::downgrade(&self_dyn);
            dep.add_sub(weak);
        }
    }

    fn update(self: Arc<Self>) {
        let new_value = Self::evaluate(&self);

        let old_value = {
            let mut slot = self.value.write().expect("value lock poisoned");
            if slot.as_ref() == Some(&new_value) {
                return;
            }
            slot.replace(new_value.clone())
        };
        // Lock released: the callback may write other reactive fields and
        // cascade back into this watcher.

        tracing::trace!(watcher_id = self.id, "value changed");
        if let (Some(on_change), Some(old_value)) = (&self.on_change, old_value) {
            on_change(&new_value, &old_value);
        }
    }
}

impl<T> Debug for Watcher<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("value", &self.value())
            .field("dep_count", &self.dep_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::field::ReactiveField;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn watcher_evaluates_on_construction() {
        let eval_count = Arc::new(AtomicI32::new(0));
        let eval_clone = eval_count.clone();

        let watcher = Watcher::new(move || {
            eval_clone.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert_eq!(eval_count.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.value(), 42);
    }

    #[test]
    fn watcher_subscribes_to_fields_read_during_evaluation() {
        let field = ReactiveField::new(10);

        let reader = field.clone();
        let watcher = Watcher::new(move || reader.get() * 2);

        assert_eq!(watcher.value(), 20);
        assert_eq!(watcher.dep_count(), 1);
        assert_eq!(field.dep().subscriber_count(), 1);
    }

    #[test]
    fn write_reruns_watcher_and_fires_callback_once() {
        let field = ReactiveField::new(1);
        let calls = Arc::new(AtomicI32::new(0));
        let last_seen = Arc::new(AtomicI32::new(0));

        let reader = field.clone();
        let calls_clone = calls.clone();
        let last_clone = last_seen.clone();
        let watcher = Watcher::with_callback(
            move || reader.get() + 100,
            move |new, old| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                last_clone.store(new - old, Ordering::SeqCst);
            },
        );
        assert_eq!(watcher.value(), 101);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        field.set(2);
        assert_eq!(watcher.value(), 102);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(last_seen.load(Ordering::SeqCst), 1);

        field.set(5);
        assert_eq!(watcher.value(), 105);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(last_seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unchanged_recomputation_does_not_fire_callback() {
        // The watcher collapses the field to a constant, so every
        // recomputation lands on the same value.
        let field = ReactiveField::new(1);
        let calls = Arc::new(AtomicI32::new(0));

        let reader = field.clone();
        let calls_clone = calls.clone();
        let watcher = Watcher::with_callback(
            move || {
                reader.get();
                0
            },
            move |_new: &i32, _old: &i32| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        field.set(2);
        field.set(3);
        assert_eq!(watcher.value(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_reads_subscribe_once() {
        let field = ReactiveField::new(4);

        let reader = field.clone();
        let watcher = Watcher::new(move || reader.get() + reader.get());

        assert_eq!(watcher.value(), 8);
        assert_eq!(watcher.dep_count(), 1);
        assert_eq!(field.dep().subscriber_count(), 1);

        // Later evaluations do not re-subscribe either.
        field.set(5);
        assert_eq!(watcher.value(), 10);
        assert_eq!(field.dep().subscriber_count(), 1);
    }

    #[test]
    fn untracked_field_does_not_rerun_watcher() {
        let tracked = ReactiveField::new(1);
        let untracked = ReactiveField::new(1);
        let eval_count = Arc::new(AtomicI32::new(0));

        let reader = tracked.clone();
        let eval_clone = eval_count.clone();
        let _watcher = Watcher::new(move || {
            eval_clone.fetch_add(1, Ordering::SeqCst);
            reader.get()
        });
        assert_eq!(eval_count.load(Ordering::SeqCst), 1);

        untracked.set(99);
        assert_eq!(eval_count.load(Ordering::SeqCst), 1);

        tracked.set(2);
        assert_eq!(eval_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropped_watcher_stops_receiving_updates() {
        let field = ReactiveField::new(1);
        let eval_count = Arc::new(AtomicI32::new(0));

        let reader = field.clone();
        let eval_clone = eval_count.clone();
        let watcher = Watcher::new(move || {
            eval_clone.fetch_add(1, Ordering::SeqCst);
            reader.get()
        });

        field.set(2);
        assert_eq!(eval_count.load(Ordering::SeqCst), 2);

        drop(watcher);
        field.set(3);
        assert_eq!(eval_count.load(Ordering::SeqCst), 2);
    }
}
