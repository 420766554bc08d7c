//! Reactive Primitives
//!
//! This module implements the core reactive system: fields, dependency
//! sets, and watchers. These primitives form the foundation of Vireo's
//! fine-grained reactivity.
//!
//! # Concepts
//!
//! ## Reactive Fields
//!
//! A ReactiveField is a container for mutable state. When a field's value
//! is read within an evaluation context (a running watcher), the field
//! automatically registers that watcher as a dependent. When the field's
//! value changes, all dependents re-evaluate, synchronously.
//!
//! ## Dependency Sets
//!
//! Every field owns one Dep: the registry of watchers subscribed to it.
//! Deps append subscribers without de-duplicating; keeping subscriptions
//! unique is the watcher's job, keyed by the dep's process-unique id.
//!
//! ## Watchers
//!
//! A Watcher is a re-evaluatable computation, typically a render function.
//! It subscribes to every dep it reads during evaluation and re-runs when
//! any of them notifies. If re-evaluation changes the computed value, the
//! watcher's change callback runs with (new, old).
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local evaluation-context stack to
//! detect dependencies. When a field is read, we check if there is an
//! active evaluation and, if so, register the dependency.
//!
//! This approach (sometimes called "automatic dependency tracking" or
//! "transparent reactivity") is used by SolidJS, Vue, and Leptos. Unlike
//! those systems there is no batching layer here: every write cascades to
//! completion before it returns.

mod context;
mod dep;
mod field;
mod record;
mod watcher;

pub use context::EvalContext;
pub use dep::Dep;
pub use field::ReactiveField;
pub use record::{DataRecord, Value};
pub use watcher::{ChangeCallback, Watch, Watcher};
