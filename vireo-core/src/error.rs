//! Error Types
//!
//! The runtime has a deliberately small failure surface: inputs are
//! validated at the mount/patch boundary, and reconciliation itself is
//! infallible once its inputs are valid. The variants here are the only
//! typed failures the public API produces.

use thiserror::Error;

/// Errors produced by mounting and patching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A vnode tree contains a shape the reconciler refuses to realize.
    ///
    /// The tagged `VNode` union makes most malformed shapes unrepresentable;
    /// what remains (an element with an empty tag, at any depth) is rejected
    /// here rather than failing deep inside the reconciler.
    #[error("invalid vnode: {reason}")]
    InvalidVNode { reason: String },

    /// The mount selector resolved to no surface node.
    #[error("mount target not found: {selector:?}")]
    MountTargetNotFound { selector: String },
}
