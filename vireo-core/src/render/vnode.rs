//! Virtual Node Model
//!
//! A VNode is an immutable description of one node of desired UI shape:
//! an element (tag, attributes, ordered children) or a text run. Render
//! functions build a fresh tree on every evaluation; trees are never
//! mutated in place. The single exception is `elm`, the back-reference to
//! the realized surface node, which is assigned exactly once: either when
//! the node is realized or when the in-place patch path carries the old
//! node's handle forward.
//!
//! The element/text split is a real sum type. The source design this
//! reimplements used "no tag" to mean "text node"; here the two shapes are
//! separate variants and the reconciler matches them exhaustively.

use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Error;

use super::surface::{NodeRef, RenderSurface};

/// Element attributes. Insertion-ordered so realization applies them
/// deterministically.
pub type Attrs = IndexMap<String, String>;

/// Build an attribute map from string pairs.
pub fn attrs<'a, I>(pairs: I) -> Attrs
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

/// One node of desired UI shape.
#[derive(Debug, Serialize)]
pub struct VNode {
    #[serde(flatten)]
    kind: VNodeKind,

    /// Back-reference to the realized surface node. Absent until the node
    /// is realized (or adopted by the in-place patch path); never
    /// reassigned.
    #[serde(skip)]
    elm: OnceLock<NodeRef>,
}

/// The two shapes a vnode can take.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VNodeKind {
    /// An element: tag, attributes, ordered children.
    Element {
        tag: String,
        attrs: Attrs,
        children: Vec<VNode>,
    },
    /// A text run.
    Text { content: String },
}

/// Children input to [`VNode::element`].
///
/// A bare string normalizes to a one-element sequence holding a text
/// vnode; a vnode sequence passes through as given.
pub enum Children {
    Text(String),
    Nodes(Vec<VNode>),
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(text.to_owned())
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(text)
    }
}

impl From<Vec<VNode>> for Children {
    fn from(nodes: Vec<VNode>) -> Self {
        Children::Nodes(nodes)
    }
}

impl VNode {
    /// Create an element vnode.
    ///
    /// No tag validation happens here; [`VNode::validate`] rejects empty
    /// tags at the mount/patch boundary.
    pub fn element(tag: impl Into<String>, attrs: Attrs, children: impl Into<Children>) -> Self {
        let children = match children.into() {
            Children::Text(text) => vec![VNode::text(text)],
            Children::Nodes(nodes) => nodes,
        };
        Self {
            kind: VNodeKind::Element {
                tag: tag.into(),
                attrs,
                children,
            },
            elm: OnceLock::new(),
        }
    }

    /// Create a text vnode.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: VNodeKind::Text {
                content: content.into(),
            },
            elm: OnceLock::new(),
        }
    }

    /// The node's shape, for exhaustive matching.
    pub fn kind(&self) -> &VNodeKind {
        &self.kind
    }

    /// The element tag, or `None` for a text vnode.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Element { tag, .. } => Some(tag),
            VNodeKind::Text { .. } => None,
        }
    }

    /// The text content, or `None` for an element vnode.
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Text { content } => Some(content),
            VNodeKind::Element { .. } => None,
        }
    }

    /// The element's attributes; empty for a text vnode.
    pub fn attrs(&self) -> Option<&Attrs> {
        match &self.kind {
            VNodeKind::Element { attrs, .. } => Some(attrs),
            VNodeKind::Text { .. } => None,
        }
    }

    /// The element's children; an empty slice for a text vnode.
    pub fn children(&self) -> &[VNode] {
        match &self.kind {
            VNodeKind::Element { children, .. } => children,
            VNodeKind::Text { .. } => &[],
        }
    }

    /// The realized surface node, if this vnode has been realized.
    pub fn elm(&self) -> Option<NodeRef> {
        self.elm.get().copied()
    }

    /// Record the realized surface node. Assigned exactly once per vnode.
    pub(crate) fn set_elm(&self, node: NodeRef) {
        self.elm
            .set(node)
            .expect("vnode realized or adopted twice");
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, VNodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, VNodeKind::Text { .. })
    }

    /// Reject shapes the reconciler refuses to realize.
    ///
    /// The sum type rules out most malformed vnodes at compile time; what
    /// remains is an element with an empty tag, at any depth.
    pub fn validate(&self) -> Result<(), Error> {
        match &self.kind {
            VNodeKind::Element { tag, children, .. } => {
                if tag.is_empty() {
                    return Err(Error::InvalidVNode {
                        reason: "element tag is empty".into(),
                    });
                }
                for child in children {
                    child.validate()?;
                }
                Ok(())
            }
            VNodeKind::Text { .. } => Ok(()),
        }
    }
}

impl PartialEq for VNode {
    /// Structural equality. `elm` is identity, not shape, and is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Clone for VNode {
    /// Clones are unrealized: the copy describes the same shape but holds
    /// no surface back-reference.
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            VNodeKind::Element {
                tag,
                attrs,
                children,
            } => VNodeKind::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: children.clone(),
            },
            VNodeKind::Text { content } => VNodeKind::Text {
                content: content.clone(),
            },
        };
        Self {
            kind,
            elm: OnceLock::new(),
        }
    }
}

/// Realize a vnode tree into surface nodes.
///
/// Elements get a surface element with every attribute applied and each
/// child realized and appended in sequence order; text vnodes get a
/// surface text node. Stores the created node in the vnode's `elm` and
/// returns it. This is the only place surface nodes are created.
pub fn realize(surface: &dyn RenderSurface, vnode: &VNode) -> NodeRef {
    let node = match vnode.kind() {
        VNodeKind::Element {
            tag,
            attrs,
            children,
        } => {
            let node = surface.create_element_node(tag);
            for (key, value) in attrs {
                surface.set_attribute(node, key, value);
            }
            for child in children {
                let child_node = realize(surface, child);
                surface.append_child(node, child_node);
            }
            node
        }
        VNodeKind::Text { content } => surface.create_text_node(content),
    };

    vnode.set_elm(node);
    node
}

/// Wrap an already-realized surface node in a placeholder vnode.
///
/// Used for the very first mount: the placeholder carries the node's own
/// tag, empty attrs/children, and `elm` pre-set, so the first patch treats
/// "real existing surface node" and "vnode from the prior cycle"
/// uniformly.
pub fn wrap_surface_node(surface: &dyn RenderSurface, node: NodeRef) -> VNode {
    let vnode = VNode::element(surface.tag_name(node), Attrs::new(), Vec::new());
    vnode.set_elm(node);
    vnode
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
