//! Vireo Core
//!
//! This crate provides the core runtime for the Vireo reactive UI
//! framework. It implements:
//!
//! - Reactive primitives (fields, dependency sets, watchers)
//! - A virtual node model and diff/patch reconciler
//! - A pluggable render-surface abstraction with an in-memory backend
//! - The root controller wiring a render watcher to the reconciler
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: fine-grained dependency tracking; fields own dependency
//!   sets, watchers subscribe to what they read and re-run on change
//! - `render`: virtual nodes, the reconciler, and render surfaces
//! - `app`: the mount lifecycle tying the two halves together
//! - `error`: the typed failure surface
//!
//! Data flows one way: a write to a reactive field notifies its
//! subscribers, each subscribed watcher re-evaluates, a render watcher's
//! evaluation produces a fresh vnode tree, and the reconciler turns the
//! old/new pair into minimal surface mutations. Everything happens
//! synchronously inside the write.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vireo_core::app::{App, AppConfig};
//! use vireo_core::render::{MemorySurface, VNode};
//!
//! let surface = Arc::new(MemorySurface::new());
//! surface.mount_point("app");
//!
//! let app = App::mount(
//!     surface.clone(),
//!     AppConfig::new("#app", |data| {
//!         VNode::text(data.get("count").to_string())
//!     })
//!     .data("count", 0),
//! )?;
//!
//! // The surface shows "0"; this write re-renders and patches it to "1"
//! // before returning.
//! app.set("count", 1);
//! ```

pub mod app;
pub mod error;
pub mod reactive;
pub mod render;

pub use app::{App, AppConfig};
pub use error::Error;
pub use reactive::{DataRecord, ReactiveField, Value, Watcher};
pub use render::{MemorySurface, NodeRef, RenderSurface, VNode};
