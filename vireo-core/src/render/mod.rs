//! Virtual Tree and Rendering Pipeline
//!
//! This module implements the rendering half of the runtime: the virtual
//! node model, the reconciler that diffs two trees into minimal surface
//! mutations, and the surface abstraction those mutations target.
//!
//! # Concepts
//!
//! ## VNodes
//!
//! A render function describes the desired UI as a tree of [`VNode`]s:
//! elements and text runs. Trees are cheap, immutable descriptions built
//! fresh on every render; only the reconciler decides what actually
//! touches the surface.
//!
//! ## The Reconciler
//!
//! [`patch`] compares the previous tree with the new one. Same-type nodes
//! are updated in place (text rewritten only on change, children compared
//! at index 0 only); a type change replaces the whole subtree at its
//! sibling position.
//!
//! ## Render Surfaces
//!
//! Mutations go through the [`RenderSurface`] trait. [`MemorySurface`] is
//! the in-memory reference backend used by tests and benches; a DOM or
//! terminal backend plugs in the same way.

pub mod memory;
pub mod patch;
pub mod surface;
pub mod vnode;

pub use memory::MemorySurface;
pub use patch::{patch, patch_in_place, same_type, update_children};
pub use surface::{NodeRef, RenderSurface};
pub use vnode::{attrs, realize, wrap_surface_node, Attrs, Children, VNode, VNodeKind};
