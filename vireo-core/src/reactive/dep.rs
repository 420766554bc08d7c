//! Dependency Set
//!
//! A Dep is the subscriber registry for one reactive field. Every field
//! owns exactly one Dep, created when the field is created and never
//! replaced.
//!
//! # How Deps Work
//!
//! 1. When a field is read inside an evaluation context, `depend` hands
//!    the Dep to the evaluating watcher, which decides whether to
//!    subscribe. De-duplication lives in the watcher, not here.
//!
//! 2. When the field's value changes, `notify` invokes `update` on every
//!    subscriber, synchronously, to completion.
//!
//! `notify` iterates a snapshot of the subscriber list: a watcher's
//! re-evaluation runs inside the loop and may subscribe to this same Dep,
//! which must not invalidate the iteration.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, Weak};

use smallvec::SmallVec;

use super::context::EvalContext;
use super::watcher::Watch;

/// Counter for generating unique dep IDs.
///
/// Process-wide, starts at zero, never reset. Watchers use these ids to
/// keep their subscriptions idempotent.
static DEP_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique dep ID.
fn next_dep_id() -> u64 {
    DEP_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Subscriber lists are overwhelmingly short (one render watcher per
/// field in the common case), so keep the first few entries inline.
type SubscriberList = SmallVec<[Weak<dyn Watch>; 4]>;

/// The subscriber registry for one reactive field.
pub struct Dep {
    /// Unique identifier for this dep.
    id: u64,

    /// Subscribed watchers, in subscription order. Weak so the registry
    /// never keeps a watcher alive past its owner; there is no teardown
    /// path that would otherwise unsubscribe it.
    subs: RwLock<SubscriberList>,
}

impl Dep {
    /// Create a new, empty dependency set.
    pub fn new() -> Self {
        Self {
            id: next_dep_id(),
            subs: RwLock::new(SmallVec::new()),
        }
    }

    /// Get the dep's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Append a subscriber.
    ///
    /// No de-duplication happens at this layer; the watcher's
    /// `add_dep` is responsible for subscribing at most once.
    pub fn add_sub(&self, watcher: Weak<dyn Watch>) {
        self.subs
            .write()
            .expect("subscriber lock poisoned")
            .push(watcher);
    }

    /// Register the currently evaluating watcher against this dep.
    ///
    /// Delegates to the watcher's `add_dep` so the watcher, not the dep,
    /// decides de-duplication. Outside an evaluation context this is a
    /// no-op.
    pub fn depend(&self) {
        if let Some(watcher) = EvalContext::current_watcher() {
            watcher.add_dep(self);
        }
    }

    /// Invoke `update` on every subscriber, synchronously, to completion.
    ///
    /// Iterates a snapshot of the subscriber list taken before the first
    /// `update` call: re-entrant subscriptions made during a watcher's
    /// re-evaluation land in the live list but not in this iteration.
    pub fn notify(&self) {
        let snapshot: SubscriberList = self
            .subs
            .read()
            .expect("subscriber lock poisoned")
            .clone();

        tracing::trace!(
            dep_id = self.id,
            subscribers = snapshot.len(),
            "notifying dependency set"
        );

        for sub in snapshot {
            if let Some(watcher) = sub.upgrade() {
                watcher.update();
            }
        }
    }

    /// Get the number of recorded subscriptions (including entries whose
    /// watcher has since been dropped).
    pub fn subscriber_count(&self) -> usize {
        self.subs.read().expect("subscriber lock poisoned").len()
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Test double that counts updates and optionally runs a hook.
    struct Recorder {
        id: u64,
        updates: AtomicU64,
        on_update: Option<Box<dyn Fn() + Send + Sync>>,
    }

    impl Recorder {
        fn new(id: u64) -> Arc<Self> {
            Arc::new(Self {
                id,
                updates: AtomicU64::new(0),
                on_update: None,
            })
        }

        fn with_hook<F>(id: u64, hook: F) -> Arc<Self>
        where
            F: Fn() + Send + Sync + 'static,
        {
            Arc::new(Self {
                id,
                updates: AtomicU64::new(0),
                on_update: Some(Box::new(hook)),
            })
        }

        fn update_count(&self) -> u64 {
            self.updates.load(Ordering::SeqCst)
        }
    }

    impl Watch for Recorder {
        fn watcher_id(&self) -> u64 {
            self.id
        }

        fn add_dep(self: Arc<Self>, dep: &Dep) {
            let self_dyn: Arc<dyn Watch> = self.clone();
            let weak: Weak<dyn Watch> = Arc::downgrade(&self_dyn);
            dep.add_sub(weak);
        }

        fn update(self: Arc<Self>) {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if let Some(hook) = &self.on_update {
                hook();
            }
        }
    }

    #[test]
    fn dep_ids_are_unique_and_monotonic() {
        let d1 = Dep::new();
        let d2 = Dep::new();
        let d3 = Dep::new();

        assert!(d1.id() < d2.id());
        assert!(d2.id() < d3.id());
    }

    #[test]
    fn notify_updates_subscribers_in_order() {
        let dep = Dep::new();
        let first = Recorder::new(1);
        let second = Recorder::new(2);

        dep.add_sub(Arc::downgrade(&first) as Weak<dyn Watch>);
        dep.add_sub(Arc::downgrade(&second) as Weak<dyn Watch>);
        assert_eq!(dep.subscriber_count(), 2);

        dep.notify();
        assert_eq!(first.update_count(), 1);
        assert_eq!(second.update_count(), 1);

        dep.notify();
        assert_eq!(first.update_count(), 2);
        assert_eq!(second.update_count(), 2);
    }

    #[test]
    fn add_sub_does_not_deduplicate() {
        let dep = Dep::new();
        let watcher = Recorder::new(1);

        dep.add_sub(Arc::downgrade(&watcher) as Weak<dyn Watch>);
        dep.add_sub(Arc::downgrade(&watcher) as Weak<dyn Watch>);

        // Two raw entries: one notify drives two updates. Keeping the
        // registration unique is the watcher's job.
        assert_eq!(dep.subscriber_count(), 2);
        dep.notify();
        assert_eq!(watcher.update_count(), 2);
    }

    #[test]
    fn notify_skips_dropped_subscribers() {
        let dep = Dep::new();
        let alive = Recorder::new(1);
        let dropped = Recorder::new(2);

        dep.add_sub(Arc::downgrade(&dropped) as Weak<dyn Watch>);
        dep.add_sub(Arc::downgrade(&alive) as Weak<dyn Watch>);
        drop(dropped);

        dep.notify();
        assert_eq!(alive.update_count(), 1);
    }

    #[test]
    fn notify_iterates_a_snapshot() {
        let dep = Arc::new(Dep::new());
        let late = Recorder::new(2);

        // This subscriber's update re-enters the dep and appends another
        // subscriber mid-notify.
        let dep_clone = Arc::clone(&dep);
        let late_clone = Arc::clone(&late);
        let reentrant = Recorder::with_hook(1, move || {
            dep_clone.add_sub(Arc::downgrade(&late_clone) as Weak<dyn Watch>);
        });
        dep.add_sub(Arc::downgrade(&reentrant) as Weak<dyn Watch>);

        dep.notify();

        // The appended subscriber joined the live list but not the
        // in-flight iteration.
        assert_eq!(dep.subscriber_count(), 2);
        assert_eq!(reentrant.update_count(), 1);
        assert_eq!(late.update_count(), 0);

        dep.notify();
        assert_eq!(late.update_count(), 1);
    }

    #[test]
    fn depend_outside_evaluation_is_a_noop() {
        let dep = Dep::new();
        dep.depend();
        assert_eq!(dep.subscriber_count(), 0);
    }
}
