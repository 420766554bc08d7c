//! In-Memory Render Surface
//!
//! A DOM-like backend that keeps the whole node tree in a lock-guarded
//! arena. It is the reference implementation of [`RenderSurface`]: tests
//! and benches drive the reconciler against it, and embedders can use it
//! to inspect what a render cycle actually did.
//!
//! Every mutating call bumps a counter, so a test can assert that a
//! no-change patch produced zero surface mutations.
//!
//! Misusing the surface (a foreign handle, inserting before a node that is
//! not a child of the given parent) is fatal, not recoverable: the
//! reconciler validates its inputs and expects the backend to succeed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use indexmap::IndexMap;

use super::surface::{NodeRef, RenderSurface};

/// Payload of one arena node.
enum NodeData {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
        children: Vec<NodeRef>,
    },
    Text {
        content: String,
    },
}

/// One arena slot: payload plus the parent link.
struct Entry {
    data: NodeData,
    parent: Option<NodeRef>,
}

/// An in-memory DOM-like render surface.
pub struct MemorySurface {
    /// Insertion-ordered so selector resolution and markup output are
    /// deterministic.
    nodes: RwLock<IndexMap<NodeRef, Entry>>,

    /// Count of mutating calls (node creation included).
    mutations: AtomicU64,
}

impl MemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(IndexMap::new()),
            mutations: AtomicU64::new(0),
        }
    }

    /// Seed a minimal document and return a mount target: a `div` carrying
    /// the given `id`, parented under a `body` element.
    ///
    /// The parent matters: the reconciler's replace path inserts the new
    /// node next to the old one under its parent, so a mount target must
    /// not be a detached root.
    pub fn mount_point(&self, id: &str) -> NodeRef {
        let body = self.create_element_node("body");
        let target = self.create_element_node("div");
        self.set_attribute(target, "id", id);
        self.append_child(body, target);
        target
    }

    /// Total number of mutating calls so far. Tests assert on deltas.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Number of nodes in the arena (detached subtrees included).
    pub fn node_count(&self) -> usize {
        self.nodes.read().expect("node arena lock poisoned").len()
    }

    /// The text carried by a text node.
    pub fn text_of(&self, node: NodeRef) -> Option<String> {
        let nodes = self.nodes.read().expect("node arena lock poisoned");
        match &nodes.get(&node)?.data {
            NodeData::Text { content } => Some(content.clone()),
            NodeData::Element { .. } => None,
        }
    }

    /// One attribute of an element node.
    pub fn attr_of(&self, node: NodeRef, key: &str) -> Option<String> {
        let nodes = self.nodes.read().expect("node arena lock poisoned");
        match &nodes.get(&node)?.data {
            NodeData::Element { attrs, .. } => attrs.get(key).cloned(),
            NodeData::Text { .. } => None,
        }
    }

    /// The ordered children of an element node.
    pub fn children_of(&self, node: NodeRef) -> Vec<NodeRef> {
        let nodes = self.nodes.read().expect("node arena lock poisoned");
        match nodes.get(&node).map(|entry| &entry.data) {
            Some(NodeData::Element { children, .. }) => children.clone(),
            _ => Vec::new(),
        }
    }

    /// Whether a node is currently attached under the given parent.
    pub fn is_child_of(&self, parent: NodeRef, child: NodeRef) -> bool {
        self.children_of(parent).contains(&child)
    }

    /// HTML-like serialization of a subtree, for assertions.
    pub fn to_markup(&self, node: NodeRef) -> String {
        let nodes = self.nodes.read().expect("node arena lock poisoned");
        Self::markup_of(&nodes, node)
    }

    fn markup_of(nodes: &IndexMap<NodeRef, Entry>, node: NodeRef) -> String {
        let Some(entry) = nodes.get(&node) else {
            return String::new();
        };
        match &entry.data {
            NodeData::Text { content } => content.clone(),
            NodeData::Element {
                tag,
                attrs,
                children,
            } => {
                let mut out = String::new();
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs {
                    out.push_str(&format!(" {key}=\"{value}\""));
                }
                out.push('>');
                for child in children {
                    out.push_str(&Self::markup_of(nodes, *child));
                }
                out.push_str(&format!("</{tag}>"));
                out
            }
        }
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for MemorySurface {
    fn create_element_node(&self, tag: &str) -> NodeRef {
        self.record_mutation();
        let node = NodeRef::new();
        self.nodes.write().expect("node arena lock poisoned").insert(
            node,
            Entry {
                data: NodeData::Element {
                    tag: tag.to_owned(),
                    attrs: IndexMap::new(),
                    children: Vec::new(),
                },
                parent: None,
            },
        );
        node
    }

    fn create_text_node(&self, content: &str) -> NodeRef {
        self.record_mutation();
        let node = NodeRef::new();
        self.nodes.write().expect("node arena lock poisoned").insert(
            node,
            Entry {
                data: NodeData::Text {
                    content: content.to_owned(),
                },
                parent: None,
            },
        );
        node
    }

    fn set_attribute(&self, node: NodeRef, key: &str, value: &str) {
        self.record_mutation();
        let mut nodes = self.nodes.write().expect("node arena lock poisoned");
        let entry = nodes.get_mut(&node).expect("unknown surface node");
        match &mut entry.data {
            NodeData::Element { attrs, .. } => {
                attrs.insert(key.to_owned(), value.to_owned());
            }
            NodeData::Text { .. } => panic!("set_attribute on a text node"),
        }
    }

    fn append_child(&self, parent: NodeRef, child: NodeRef) {
        self.record_mutation();
        let mut nodes = self.nodes.write().expect("node arena lock poisoned");
        match &mut nodes.get_mut(&parent).expect("unknown surface node").data {
            NodeData::Element { children, .. } => children.push(child),
            NodeData::Text { .. } => panic!("append_child on a text node"),
        }
        nodes.get_mut(&child).expect("unknown surface node").parent = Some(parent);
    }

    fn insert_before(&self, parent: NodeRef, new_node: NodeRef, reference_node: NodeRef) {
        self.record_mutation();
        let mut nodes = self.nodes.write().expect("node arena lock poisoned");
        match &mut nodes.get_mut(&parent).expect("unknown surface node").data {
            NodeData::Element { children, .. } => {
                let index = children
                    .iter()
                    .position(|c| *c == reference_node)
                    .expect("reference node is not a child of parent");
                children.insert(index, new_node);
            }
            NodeData::Text { .. } => panic!("insert_before on a text node"),
        }
        nodes.get_mut(&new_node).expect("unknown surface node").parent = Some(parent);
    }

    fn remove_child(&self, parent: NodeRef, child: NodeRef) {
        self.record_mutation();
        let mut nodes = self.nodes.write().expect("node arena lock poisoned");
        match &mut nodes.get_mut(&parent).expect("unknown surface node").data {
            NodeData::Element { children, .. } => {
                let index = children
                    .iter()
                    .position(|c| *c == child)
                    .expect("removed node is not a child of parent");
                children.remove(index);
            }
            NodeData::Text { .. } => panic!("remove_child on a text node"),
        }
        nodes.get_mut(&child).expect("unknown surface node").parent = None;
    }

    fn set_text_content(&self, node: NodeRef, content: &str) {
        self.record_mutation();
        let mut nodes = self.nodes.write().expect("node arena lock poisoned");
        match &mut nodes.get_mut(&node).expect("unknown surface node").data {
            NodeData::Text { content: current } => *current = content.to_owned(),
            NodeData::Element { .. } => panic!("set_text_content on an element node"),
        }
    }

    fn tag_name(&self, node: NodeRef) -> String {
        let nodes = self.nodes.read().expect("node arena lock poisoned");
        match &nodes.get(&node).expect("unknown surface node").data {
            NodeData::Element { tag, .. } => tag.clone(),
            NodeData::Text { .. } => String::new(),
        }
    }

    fn parent_node(&self, node: NodeRef) -> Option<NodeRef> {
        let nodes = self.nodes.read().expect("node arena lock poisoned");
        nodes.get(&node).and_then(|entry| entry.parent)
    }

    fn query_selector(&self, selector: &str) -> Option<NodeRef> {
        let nodes = self.nodes.read().expect("node arena lock poisoned");

        if let Some(id) = selector.strip_prefix('#') {
            return nodes.iter().find_map(|(node, entry)| match &entry.data {
                NodeData::Element { attrs, .. } if attrs.get("id").map(String::as_str) == Some(id) => {
                    Some(*node)
                }
                _ => None,
            });
        }

        nodes.iter().find_map(|(node, entry)| match &entry.data {
            NodeData::Element { tag, .. } if tag == selector => Some(*node),
            _ => None,
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_inspect_nodes() {
        let surface = MemorySurface::new();

        let div = surface.create_element_node("div");
        surface.set_attribute(div, "class", "box");
        let text = surface.create_text_node("hi");
        surface.append_child(div, text);

        assert_eq!(surface.tag_name(div), "div");
        assert_eq!(surface.attr_of(div, "class").as_deref(), Some("box"));
        assert_eq!(surface.children_of(div), vec![text]);
        assert_eq!(surface.text_of(text).as_deref(), Some("hi"));
        assert_eq!(surface.parent_node(text), Some(div));
        assert_eq!(surface.to_markup(div), "<div class=\"box\">hi</div>");
    }

    #[test]
    fn insert_before_places_at_reference_position() {
        let surface = MemorySurface::new();

        let list = surface.create_element_node("ul");
        let first = surface.create_element_node("li");
        let third = surface.create_element_node("li");
        surface.append_child(list, first);
        surface.append_child(list, third);

        let second = surface.create_element_node("li");
        surface.insert_before(list, second, third);

        assert_eq!(surface.children_of(list), vec![first, second, third]);
        assert_eq!(surface.parent_node(second), Some(list));
    }

    #[test]
    fn remove_child_detaches() {
        let surface = MemorySurface::new();

        let parent = surface.create_element_node("div");
        let child = surface.create_element_node("span");
        surface.append_child(parent, child);
        assert!(surface.is_child_of(parent, child));

        surface.remove_child(parent, child);
        assert!(!surface.is_child_of(parent, child));
        assert_eq!(surface.parent_node(child), None);
    }

    #[test]
    fn query_selector_by_id_and_tag() {
        let surface = MemorySurface::new();

        let target = surface.mount_point("app");
        assert_eq!(surface.query_selector("#app"), Some(target));
        assert_eq!(surface.query_selector("div"), Some(target));
        assert!(surface.query_selector("#missing").is_none());
        assert!(surface.query_selector("span").is_none());
    }

    #[test]
    fn mutations_are_counted() {
        let surface = MemorySurface::new();
        assert_eq!(surface.mutation_count(), 0);

        let div = surface.create_element_node("div");
        let text = surface.create_text_node("x");
        surface.append_child(div, text);
        surface.set_text_content(text, "y");

        assert_eq!(surface.mutation_count(), 4);

        // Reads mutate nothing.
        let before = surface.mutation_count();
        let _ = surface.tag_name(div);
        let _ = surface.children_of(div);
        let _ = surface.to_markup(div);
        assert_eq!(surface.mutation_count(), before);
    }
}
