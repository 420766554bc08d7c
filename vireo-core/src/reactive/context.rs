//! Evaluation Context
//!
//! The evaluation context tracks which watcher is currently evaluating.
//! This enables automatic dependency tracking: when a reactive field is
//! read, we can register the current watcher as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently evaluating watcher.
//! When a watcher starts evaluating, we push it onto the stack. When the
//! evaluation completes, we pop it.
//!
//! The stack supports nested evaluations (a watcher callback that writes
//! another field triggers further evaluations before the outer one has
//! unwound), and the pop happens in `Drop` so the slot is cleared on every
//! exit path, including panics. A stuck context would silently attach
//! later, unrelated reads to the wrong watcher.

use std::cell::RefCell;
use std::sync::{Arc, Weak};

use super::watcher::Watch;

/// The evaluation context stack.
///
/// Each thread has its own stack, so the common single-threaded cascade
/// needs no synchronization.
thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = RefCell::new(Vec::new());
}

/// An entry in the evaluation context stack.
struct ContextEntry {
    /// The id of the evaluating watcher.
    watcher_id: u64,
    /// Weak handle to the evaluating watcher, so the stack never keeps a
    /// watcher alive past its owner.
    watcher: Weak<dyn Watch>,
}

/// Guard that pops the context when dropped.
pub struct EvalContext {
    watcher_id: u64,
}

impl EvalContext {
    /// Enter a new evaluation context for the given watcher.
    ///
    /// While the context is active, any reactive field that is read will
    /// register the watcher as a dependent. The context is exited when the
    /// returned guard is dropped.
    pub fn enter(watcher_id: u64, watcher: Weak<dyn Watch>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                watcher_id,
                watcher,
            });
        });
        tracing::trace!(watcher_id, "entered evaluation context");

        Self { watcher_id }
    }

    /// Check if there is an active evaluation context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the currently evaluating watcher, if any.
    ///
    /// Returns the innermost entry: during a nested evaluation, reads
    /// attribute to the watcher actually executing, not the suspended
    /// outer one.
    pub fn current_watcher() -> Option<Arc<dyn Watch>> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.watcher.upgrade())
        })
    }

    /// Get the id of the currently evaluating watcher, if any.
    pub fn current_watcher_id() -> Option<u64> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().map(|entry| entry.watcher_id))
    }
}

impl Drop for EvalContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Verify we're popping the right context.
            // This helps catch bugs where contexts are mismatched.
            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.watcher_id, self.watcher_id,
                    "EvalContext mismatch: expected {}, got {}",
                    self.watcher_id, entry.watcher_id
                );
            }
        });
    }
}
