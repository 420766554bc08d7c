//! Render Surface Interface
//!
//! The reconciler does not mutate a concrete backend directly; it drives
//! the [`RenderSurface`] capability trait. Anything that can create,
//! parent, and mutate nodes (a browser DOM binding, a terminal tree, the
//! in-memory surface shipped in this crate) can sit behind it.
//!
//! Surface nodes are referred to by opaque [`NodeRef`] handles. A handle
//! says nothing about the node's contents; all inspection goes back
//! through the surface that issued it.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Opaque handle to one node of the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeRef(u64);

impl NodeRef {
    /// Allocate a fresh, process-unique handle.
    ///
    /// Backends call this when they create a node; the counter is shared
    /// so handles from different surfaces never collide.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeRef {
    fn default() -> Self {
        Self::new()
    }
}

/// The capability set a rendering backend must expose.
///
/// Mutating calls are infallible: once the reconciler's inputs are
/// validated it expects the surface to succeed, and a backend that cannot
/// (a detached parent, a foreign handle) should treat that as fatal.
pub trait RenderSurface: Send + Sync {
    /// Create an element node for `tag`.
    fn create_element_node(&self, tag: &str) -> NodeRef;

    /// Create a text node carrying `content`.
    fn create_text_node(&self, content: &str) -> NodeRef;

    /// Set one attribute on an element node.
    fn set_attribute(&self, node: NodeRef, key: &str, value: &str);

    /// Append `child` as the last child of `parent`.
    fn append_child(&self, parent: NodeRef, child: NodeRef);

    /// Insert `new_node` under `parent`, immediately before
    /// `reference_node`.
    fn insert_before(&self, parent: NodeRef, new_node: NodeRef, reference_node: NodeRef);

    /// Detach `child` from `parent`.
    fn remove_child(&self, parent: NodeRef, child: NodeRef);

    /// Replace the text carried by a text node.
    fn set_text_content(&self, node: NodeRef, content: &str);

    /// The node's own tag name (empty for text nodes).
    fn tag_name(&self, node: NodeRef) -> String;

    /// The node's parent, if attached.
    fn parent_node(&self, node: NodeRef) -> Option<NodeRef>;

    /// Resolve a mount selector to a node.
    ///
    /// Backends support at least `#id` (by `id` attribute) and bare
    /// tag-name selectors.
    fn query_selector(&self, selector: &str) -> Option<NodeRef>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_refs_are_unique() {
        let a = NodeRef::new();
        let b = NodeRef::new();
        let c = NodeRef::new();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }
}
