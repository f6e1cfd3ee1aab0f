#![forbid(unsafe_code)]

//! Error type for structural tree operations.

use core::fmt;

use crate::node::NodeId;

/// Result alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors returned by [`Forest`](crate::Forest) and the traversal helpers.
///
/// Only contract violations are errors. Data mismatches during facet
/// reconciliation are resolved by policy and never surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The id does not refer to a live node of this forest (it was never
    /// allocated here, or its subtree has been detached).
    UnknownNode(NodeId),
    /// A traversal that requires a target was handed none.
    MissingTarget(&'static str),
    /// Re-parenting `node` under `parent` would make it its own ancestor.
    Cycle {
        /// The node being moved.
        node: NodeId,
        /// The requested new parent.
        parent: NodeId,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node {id}"),
            Self::MissingTarget(what) => write!(f, "missing traversal target: {what}"),
            Self::Cycle { node, parent } => {
                write!(f, "cannot attach {node} under its own descendant {parent}")
            }
        }
    }
}

impl std::error::Error for TreeError {}
