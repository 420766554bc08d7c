//! Reconciler
//!
//! The diff/patch engine. Given the vnode tree from the previous cycle and
//! the tree a re-render just produced, it applies the minimal set of
//! realize/insert/remove/update operations to the render surface.
//!
//! # Algorithm
//!
//! 1. Same type at the root of the pair (text/text, or element/element
//!    with equal tags): patch in place. Text content is rewritten only
//!    when it differs; element children recurse through
//!    [`update_children`].
//!
//! 2. Different type: full subtree replace. The new tree is realized from
//!    scratch, inserted at the old node's sibling position, and the old
//!    node is removed. Nothing of the old subtree is reused.
//!
//! Child reconciliation is deliberately single-child: only index 0 of each
//! children sequence is compared. There is no keyed reuse, no reordering,
//! no move detection. Siblings past the first are never inspected; a
//! general list diff is a different, larger design.
//!
//! The first patch of a freshly mounted instance has no previous tree; the
//! root controller wraps the live mount target with
//! [`wrap_surface_node`](super::vnode::wrap_surface_node) so this module
//! always compares two vnodes.

use crate::error::Error;

use super::surface::{NodeRef, RenderSurface};
use super::vnode::{realize, VNode, VNodeKind};

/// Whether two vnodes are reconcilable in place.
///
/// Two text vnodes always are, regardless of content; a text vnode never
/// matches an element; two elements match iff their tag strings are equal.
pub fn same_type(a: &VNode, b: &VNode) -> bool {
    a.tag() == b.tag()
}

/// Diff `old` against `new` and mutate the surface to match `new`.
///
/// `new` is validated first; an invalid tree fails here, before any
/// surface mutation, and the reconciliation internals below never
/// re-check. Returns the surface node that roots the patched region (the
/// carried-forward node for the in-place path, the freshly realized one
/// for the replace path).
pub fn patch(surface: &dyn RenderSurface, old: &VNode, new: &VNode) -> Result<NodeRef, Error> {
    new.validate()?;
    Ok(patch_unchecked(surface, old, new))
}

/// The infallible core of [`patch`]. Inputs are assumed valid and `old`
/// realized.
pub(crate) fn patch_unchecked(
    surface: &dyn RenderSurface,
    old: &VNode,
    new: &VNode,
) -> NodeRef {
    if same_type(old, new) {
        tracing::debug!(tag = ?new.tag(), "patching in place");
        patch_in_place(surface, old, new);
        new.elm().expect("in-place patch assigns elm")
    } else {
        tracing::debug!(old_tag = ?old.tag(), new_tag = ?new.tag(), "replacing subtree");
        let old_elm = old.elm().expect("old vnode realized before patching");
        let parent = surface
            .parent_node(old_elm)
            .expect("replaced node has a parent");

        let new_elm = realize(surface, new);
        surface.insert_before(parent, new_elm, old_elm);
        surface.remove_child(parent, old_elm);
        new_elm
    }
}

/// Reconcile two same-type vnodes, reusing the old surface node.
///
/// Carries `old`'s surface node into `new`, then applies the narrowest
/// mutation: rewrite text content if it differs, or descend into element
/// children. Requires `same_type(old, new)`.
pub fn patch_in_place(surface: &dyn RenderSurface, old: &VNode, new: &VNode) {
    let elm = old.elm().expect("old vnode realized before patching");
    new.set_elm(elm);

    match (old.kind(), new.kind()) {
        (
            VNodeKind::Text {
                content: old_content,
            },
            VNodeKind::Text {
                content: new_content,
            },
        ) => {
            if old_content != new_content {
                surface.set_text_content(elm, new_content);
            }
        }
        (
            VNodeKind::Element {
                children: old_children,
                ..
            },
            VNodeKind::Element {
                children: new_children,
                ..
            },
        ) => {
            update_children(surface, old_children, new_children);
        }
        _ => unreachable!("patch_in_place requires same-type vnodes"),
    }
}

/// Reconcile two children sequences at index 0 only.
///
/// Total: if either sequence is empty there is nothing to compare and the
/// call is a no-op. Otherwise the first pair reconciles in place or
/// replaces, and siblings past index 0 are never inspected or mutated.
pub fn update_children(surface: &dyn RenderSurface, old_ch: &[VNode], new_ch: &[VNode]) {
    let (Some(old_first), Some(new_first)) = (old_ch.first(), new_ch.first()) else {
        return;
    };

    if same_type(old_first, new_first) {
        patch_in_place(surface, old_first, new_first);
    } else {
        patch_unchecked(surface, old_first, new_first);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
