#![forbid(unsafe_code)]

//! Tree change events.
//!
//! Every observable mutation of a [`Forest`](crate::Forest) pushes a
//! [`TreeEvent`] onto the forest's queue. Callers retrieve them with
//! [`Forest::drain_events`](crate::Forest::drain_events).
//!
//! # Invariants
//!
//! 1. A `NodeChanged` event is queued only when the field value actually
//!    changed. Setting a field to its current value queues nothing.
//! 2. `CheckedChanged` is queued at most once per user toggle, after the
//!    whole cascade has settled.
//! 3. Draining clears the queue; events are not replayed.

use crate::node::NodeId;

/// Which property of a node changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeField {
    /// Tri-state checked value.
    Checked,
    /// Expanded flag.
    Expanded,
    /// Selected flag.
    Selected,
    /// Enabled flag.
    Enabled,
    /// The node was attached to a different parent (or became a root).
    Parent,
    /// A child was added or removed.
    Children,
    /// Document count of a facet node.
    DocCount,
    /// Opaque payload of a facet node.
    Payload,
}

/// An event queued by a forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// A single field of a single node changed.
    NodeChanged {
        /// The node that changed.
        node: NodeId,
        /// The field that changed.
        field: NodeField,
    },
    /// A user toggle changed the checked selection somewhere in the forest.
    CheckedChanged,
    /// All roots were replaced at once.
    RootsReplaced,
}

impl TreeEvent {
    /// Shorthand for [`TreeEvent::NodeChanged`].
    #[must_use]
    pub const fn changed(node: NodeId, field: NodeField) -> Self {
        Self::NodeChanged { node, field }
    }

    /// The field tag, if this is a node change.
    #[must_use]
    pub const fn field(&self) -> Option<NodeField> {
        match self {
            Self::NodeChanged { field, .. } => Some(*field),
            _ => None,
        }
    }
}
