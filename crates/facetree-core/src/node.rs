#![forbid(unsafe_code)]

//! Checkable tree nodes.
//!
//! A [`Node`] lives inside a [`Forest`](crate::Forest) arena and is addressed
//! by a [`NodeId`]. Parent and child links are ids, never references, so a
//! child can point back at its parent without creating an ownership cycle.
//!
//! Every node also carries a [`NodeKey`]: a process-unique identity that
//! travels with the node when its subtree is detached from one forest and
//! grafted into another. Two nodes are equal iff their keys are equal; the
//! display label plays no part in equality.
//!
//! [`Subtree`] is the owned, recursive form of a node and its descendants.
//! It is how trees are built declaratively and how subtrees move between
//! forests.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle to a node inside one [`Forest`](crate::Forest).
///
/// An id is an arena index plus the generation of that slot. Freed slots are
/// reused with a bumped generation, so an id whose node has been detached
/// resolves to nothing instead of to the node that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Create a first-generation id from a raw arena index.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self::new(index, 0)
    }

    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The raw arena index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// How many times the slot had been freed when this id was handed out.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "#{}", self.index),
            generation => write!(f, "#{}v{generation}", self.index),
        }
    }
}

/// Stable identity of a node, independent of its arena slot and label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(u64);

impl NodeKey {
    /// Allocate a fresh, process-unique key.
    #[must_use]
    pub fn next() -> Self {
        static NEXT_KEY: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw key value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Tri-state checkbox value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckState {
    /// Checked.
    Checked,
    /// Unchecked (the initial state of every node).
    #[default]
    Unchecked,
    /// Some but not all descendants are checked.
    Indeterminate,
}

impl CheckState {
    /// Whether this is a definite value (checked or unchecked).
    #[inline]
    #[must_use]
    pub const fn is_defined(self) -> bool {
        !matches!(self, Self::Indeterminate)
    }

    /// `Some(true)`, `Some(false)` or `None` for indeterminate.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::Checked => Some(true),
            Self::Unchecked => Some(false),
            Self::Indeterminate => None,
        }
    }

    /// The state a user click moves to. Indeterminate resolves to checked.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Checked => Self::Unchecked,
            Self::Unchecked | Self::Indeterminate => Self::Checked,
        }
    }

    /// Roll a sequence of child states up into the parent state.
    ///
    /// All checked gives checked, all unchecked gives unchecked, and any
    /// mixture gives indeterminate. Scanning stops at the first child that
    /// differs from the running state. Returns `None` for an empty sequence.
    pub fn roll_up<I>(states: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut states = states.into_iter();
        let first = states.next()?;
        for state in states {
            if state != first {
                return Some(Self::Indeterminate);
            }
        }
        Some(first)
    }
}

impl From<bool> for CheckState {
    fn from(value: bool) -> Self {
        if value { Self::Checked } else { Self::Unchecked }
    }
}

impl From<Option<bool>> for CheckState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Indeterminate, Self::from)
    }
}

/// A node stored in a [`Forest`](crate::Forest).
///
/// Flags are read-only from the outside; they change through the forest so
/// that propagation and change events stay consistent.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub(crate) key: NodeKey,
    pub(crate) data: T,
    pub(crate) checked: CheckState,
    pub(crate) enabled: bool,
    pub(crate) expanded: bool,
    pub(crate) selected: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl<T> Node<T> {
    pub(crate) fn from_parts(key: NodeKey, data: T) -> Self {
        Self {
            key,
            data,
            checked: CheckState::Unchecked,
            enabled: true,
            expanded: false,
            selected: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Stable identity.
    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// The node payload.
    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Mutable access to the payload. Does not emit change events.
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Tri-state checked value.
    #[must_use]
    pub fn checked(&self) -> CheckState {
        self.checked
    }

    /// Whether the node accepts interaction.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the node is expanded.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Whether the node is selected.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// The owning parent, if any.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in display order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl<T> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Node<T> {}

/// An owned node together with all of its descendants.
///
/// # Example
///
/// ```
/// use facetree_core::{CheckState, Subtree};
///
/// let tree = Subtree::new("Type")
///     .child(Subtree::new("pdf").with_checked(CheckState::Checked))
///     .child(Subtree::new("docx"));
///
/// assert_eq!(*tree.data(), "Type");
/// assert_eq!(tree.children().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Subtree<T> {
    pub(crate) key: NodeKey,
    pub(crate) data: T,
    pub(crate) checked: CheckState,
    pub(crate) enabled: bool,
    pub(crate) expanded: bool,
    pub(crate) selected: bool,
    pub(crate) children: Vec<Subtree<T>>,
}

impl<T> Subtree<T> {
    /// Create a childless subtree with a fresh identity.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            key: NodeKey::next(),
            data,
            checked: CheckState::Unchecked,
            enabled: true,
            expanded: false,
            selected: false,
            children: Vec::new(),
        }
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: Subtree<T>) -> Self {
        self.children.push(child);
        self
    }

    /// Replace the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Subtree<T>>) -> Self {
        self.children = children;
        self
    }

    /// Set the checked state verbatim (no roll-up happens here).
    #[must_use]
    pub fn with_checked(mut self, checked: CheckState) -> Self {
        self.checked = checked;
        self
    }

    /// Set the expanded flag.
    #[must_use]
    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Set the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Stable identity.
    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// The payload.
    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Mutable payload.
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Checked state.
    #[must_use]
    pub fn checked(&self) -> CheckState {
        self.checked
    }

    /// Whether the subtree root is expanded.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Whether the subtree root is selected.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Children.
    #[must_use]
    pub fn children(&self) -> &[Subtree<T>] {
        &self.children
    }

    /// Mutable children.
    pub fn children_mut(&mut self) -> &mut Vec<Subtree<T>> {
        &mut self.children
    }

    /// Number of nodes in the subtree, including this one.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Subtree::len).sum::<usize>()
    }

    /// Always false: a subtree holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}
