#![forbid(unsafe_code)]

//! Arena-backed forest of checkable nodes.
//!
//! A [`Forest`] owns every node in a flat `Vec` of slots. Roots are kept in
//! display order, and each node keeps its children in display order.
//! Detaching a node frees its slot for reuse. Each slot carries a
//! generation that is bumped when it is freed, so stale ids resolve to
//! nothing and the arena stays as large as the live tree.
//!
//! # Example
//!
//! ```
//! use facetree_core::{Forest, Subtree};
//!
//! let mut forest = Forest::from_subtrees([Subtree::new("Type")
//!     .child(Subtree::new("pdf"))
//!     .child(Subtree::new("docx"))]);
//!
//! let category = forest.roots()[0];
//! let html = forest.add_child(category, "html").unwrap();
//!
//! assert_eq!(forest.children(category).len(), 3);
//! assert_eq!(forest.parent(html), Some(category));
//! ```

use crate::error::{Result, TreeError};
use crate::event::{NodeField, TreeEvent};
use crate::node::{Node, NodeId, NodeKey, Subtree};

/// A forest of checkable nodes carrying payloads of type `T`.
#[derive(Debug, Clone)]
pub struct Forest<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
    events: Vec<TreeEvent>,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Forest<T> {
    /// Create an empty forest.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Build a forest whose roots are the given subtrees, in order.
    ///
    /// Node flags are taken verbatim from the subtrees and no events are
    /// queued.
    #[must_use]
    pub fn from_subtrees<I>(trees: I) -> Self
    where
        I: IntoIterator<Item = Subtree<T>>,
    {
        let mut forest = Self::new();
        for tree in trees {
            let id = forest.alloc_subtree(tree, None);
            forest.roots.push(id);
        }
        forest
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Whether the forest has no roots.
    ///
    /// Detached nodes created with [`create`](Self::create) and not yet
    /// attached do not count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of live nodes, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Top-level nodes in display order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Whether `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Look up a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    /// Look up a node, failing with [`TreeError::UnknownNode`].
    pub fn node(&self, id: NodeId) -> Result<&Node<T>> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    /// The payload of a node.
    #[must_use]
    pub fn data(&self, id: NodeId) -> Option<&T> {
        self.get(id).map(Node::data)
    }

    /// Mutable payload of a node. Queues no event; see [`notify`](Self::notify).
    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slot_mut(id).map(Node::data_mut)
    }

    /// The parent of a node (`None` for roots, detached or unknown nodes).
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Children of a node in display order (empty for unknown nodes).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], Node::children)
    }

    /// Find the id of the live node with the given identity.
    #[must_use]
    pub fn find_key(&self, key: NodeKey) -> Option<NodeId> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            let node = slot.node.as_ref()?;
            (node.key == key).then(|| NodeId::new(index as u32, slot.generation))
        })
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Allocate a detached node.
    pub fn create(&mut self, data: T) -> NodeId {
        self.alloc(Node::from_parts(NodeKey::next(), data))
    }

    /// Allocate a node and append it to the roots.
    pub fn push_root(&mut self, data: T) -> NodeId {
        let id = self.create(data);
        self.roots.push(id);
        id
    }

    /// Allocate a node and append it as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, data: T) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.create(data);
        self.add(parent, id)?;
        Ok(id)
    }

    /// Append `child` to `parent`'s children.
    ///
    /// The parent's checked state is not recomputed; call
    /// [`recompute_checked`](Self::recompute_checked) if the new child
    /// should influence it.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.set_parent(child, Some(parent))
    }

    /// Move `node` under `parent`, or to the end of the roots for `None`.
    ///
    /// If the node is selected or expanded, the new ancestor chain is
    /// expanded up to the root.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownNode`] if either id is not live, and
    /// [`TreeError::Cycle`] if `parent` is `node` or one of its descendants.
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<()> {
        let current = self.node(node)?.parent;
        if let Some(parent) = parent {
            self.node(parent)?;
            if parent == node || self.ancestors(parent).any(|id| id == node) {
                return Err(TreeError::Cycle { node, parent });
            }
        }

        let needs_move = match parent {
            Some(_) => current != parent,
            None => current.is_some() || !self.roots.contains(&node),
        };
        if needs_move {
            self.unlink(node);
            self.link(node, parent);
            self.push_event(TreeEvent::changed(node, NodeField::Parent));
        }

        if let (Some(parent), Some(n)) = (parent, self.get(node)) {
            if n.selected || n.expanded {
                self.expand_to_root(parent);
            }
        }
        Ok(())
    }

    /// Graft an owned subtree under `parent` (or as a new root for `None`).
    ///
    /// Identities and flags inside the subtree are preserved. Returns the id
    /// of the grafted subtree root.
    pub fn insert(&mut self, parent: Option<NodeId>, tree: Subtree<T>) -> Result<NodeId> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }
        let id = self.alloc_subtree(tree, None);
        self.link(id, parent);
        if let (Some(parent), Some(n)) = (parent, self.get(id)) {
            if n.selected || n.expanded {
                self.expand_to_root(parent);
            }
        }
        Ok(id)
    }

    /// Remove a node and its descendants, handing them back as a subtree.
    ///
    /// The former parent's checked state is not recomputed.
    pub fn detach(&mut self, id: NodeId) -> Option<Subtree<T>> {
        self.get(id)?;
        self.unlink(id);
        self.take_subtree(id)
    }

    /// Replace every root at once.
    ///
    /// All previous ids become stale and the selection is cleared: the selected flag is dropped on every incoming
    /// node.
    pub fn set_roots<I>(&mut self, trees: I)
    where
        I: IntoIterator<Item = Subtree<T>>,
    {
        for index in 0..self.slots.len() {
            self.release(index);
        }
        self.roots.clear();
        for tree in trees {
            let id = self.alloc_subtree(tree, None);
            self.roots.push(id);
        }
        for node in self.slots.iter_mut().filter_map(|slot| slot.node.as_mut()) {
            node.selected = false;
        }
        self.push_event(TreeEvent::RootsReplaced);
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.set_roots(std::iter::empty());
    }

    /// Copy the attached nodes out as owned subtrees.
    #[must_use]
    pub fn to_subtrees(&self) -> Vec<Subtree<T>>
    where
        T: Clone,
    {
        self.roots
            .iter()
            .filter_map(|&id| self.copy_subtree(id))
            .collect()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Queue a change event for a field changed outside the forest, e.g.
    /// after editing the payload through [`data_mut`](Self::data_mut).
    pub fn notify(&mut self, id: NodeId, field: NodeField) {
        if self.contains(id) {
            self.push_event(TreeEvent::changed(id, field));
        }
    }

    /// Take all queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queued events, oldest first.
    #[must_use]
    pub fn pending_events(&self) -> &[TreeEvent] {
        &self.events
    }

    pub(crate) fn push_event(&mut self, event: TreeEvent) {
        self.events.push(event);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        while let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.node = Some(node);
                return NodeId::new(index, slot.generation);
            }
        }
        // Freed slots are reused first, so the index is bounded by the
        // number of live nodes.
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn release(&mut self, index: usize) -> Option<Node<T>> {
        let slot = self.slots.get_mut(index)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        Some(node)
    }

    fn alloc_subtree(&mut self, tree: Subtree<T>, parent: Option<NodeId>) -> NodeId {
        let Subtree {
            key,
            data,
            checked,
            enabled,
            expanded,
            selected,
            children,
        } = tree;
        let mut node = Node::from_parts(key, data);
        node.checked = checked;
        node.enabled = enabled;
        node.expanded = expanded;
        node.selected = selected;
        node.parent = parent;
        let id = self.alloc(node);

        let child_ids: Vec<NodeId> = children
            .into_iter()
            .map(|child| self.alloc_subtree(child, Some(id)))
            .collect();
        if let Some(node) = self.slot_mut(id) {
            node.children = child_ids;
        }
        id
    }

    fn take_subtree(&mut self, id: NodeId) -> Option<Subtree<T>> {
        self.get(id)?;
        let node = self.release(id.index())?;
        let children = node
            .children
            .iter()
            .filter_map(|&child| self.take_subtree(child))
            .collect();
        Some(Subtree {
            key: node.key,
            data: node.data,
            checked: node.checked,
            enabled: node.enabled,
            expanded: node.expanded,
            selected: node.selected,
            children,
        })
    }

    fn copy_subtree(&self, id: NodeId) -> Option<Subtree<T>>
    where
        T: Clone,
    {
        let node = self.get(id)?;
        Some(Subtree {
            key: node.key,
            data: node.data.clone(),
            checked: node.checked,
            enabled: node.enabled,
            expanded: node.expanded,
            selected: node.selected,
            children: node
                .children
                .iter()
                .filter_map(|&child| self.copy_subtree(child))
                .collect(),
        })
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.get(id).and_then(Node::parent);
        match parent {
            Some(parent) => {
                if let Some(p) = self.slot_mut(parent) {
                    p.children.retain(|&child| child != id);
                }
                self.push_event(TreeEvent::changed(parent, NodeField::Children));
            }
            None => self.roots.retain(|&root| root != id),
        }
        if let Some(node) = self.slot_mut(id) {
            node.parent = None;
        }
    }

    fn link(&mut self, id: NodeId, parent: Option<NodeId>) {
        match parent {
            Some(parent) => {
                if let Some(p) = self.slot_mut(parent) {
                    p.children.push(id);
                }
                if let Some(node) = self.slot_mut(id) {
                    node.parent = Some(parent);
                }
                self.push_event(TreeEvent::changed(parent, NodeField::Children));
            }
            None => self.roots.push(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Forest<&'static str> {
        Forest::from_subtrees([
            Subtree::new("Type")
                .child(Subtree::new("pdf"))
                .child(Subtree::new("docx")),
            Subtree::new("Modified").child(Subtree::new("Today")),
        ])
    }

    fn labels(forest: &Forest<&'static str>, ids: &[NodeId]) -> Vec<&'static str> {
        ids.iter().filter_map(|&id| forest.data(id).copied()).collect()
    }

    #[test]
    fn from_subtrees_preserves_order_and_links() {
        let forest = sample();
        assert_eq!(labels(&forest, forest.roots()), ["Type", "Modified"]);
        let ty = forest.roots()[0];
        assert_eq!(labels(&forest, forest.children(ty)), ["pdf", "docx"]);
        for &child in forest.children(ty) {
            assert_eq!(forest.parent(child), Some(ty));
        }
        assert_eq!(forest.len(), 5);
        assert!(forest.pending_events().is_empty());
    }

    #[test]
    fn add_appends_in_order() {
        let mut forest = sample();
        let ty = forest.roots()[0];
        let html = forest.create("html");
        forest.add(ty, html).unwrap();
        assert_eq!(labels(&forest, forest.children(ty)), ["pdf", "docx", "html"]);
        assert_eq!(forest.parent(html), Some(ty));
    }

    #[test]
    fn add_with_unknown_child_is_an_error() {
        let mut forest = sample();
        let ty = forest.roots()[0];
        let ghost = NodeId::from_raw(999);
        assert_eq!(forest.add(ty, ghost), Err(TreeError::UnknownNode(ghost)));
        assert_eq!(forest.add(ghost, ty), Err(TreeError::UnknownNode(ghost)));
    }

    #[test]
    fn set_parent_moves_between_parents() {
        let mut forest = sample();
        let ty = forest.roots()[0];
        let modified = forest.roots()[1];
        let pdf = forest.children(ty)[0];

        forest.set_parent(pdf, Some(modified)).unwrap();
        assert_eq!(labels(&forest, forest.children(ty)), ["docx"]);
        assert_eq!(labels(&forest, forest.children(modified)), ["Today", "pdf"]);

        forest.set_parent(pdf, None).unwrap();
        assert_eq!(labels(&forest, forest.roots()), ["Type", "Modified", "pdf"]);
        assert_eq!(forest.parent(pdf), None);
    }

    #[test]
    fn set_parent_rejects_cycles() {
        let mut forest = sample();
        let ty = forest.roots()[0];
        let pdf = forest.children(ty)[0];
        assert_eq!(
            forest.set_parent(ty, Some(pdf)),
            Err(TreeError::Cycle { node: ty, parent: pdf })
        );
        assert_eq!(
            forest.set_parent(ty, Some(ty)),
            Err(TreeError::Cycle { node: ty, parent: ty })
        );
    }

    #[test]
    fn set_parent_expands_ancestors_of_expanded_node() {
        let mut forest = Forest::from_subtrees([
            Subtree::new("a").child(Subtree::new("b")),
            Subtree::new("loose").with_expanded(true),
        ]);
        let a = forest.roots()[0];
        let b = forest.children(a)[0];
        let loose = forest.roots()[1];

        forest.set_parent(loose, Some(b)).unwrap();
        assert!(forest.get(a).unwrap().is_expanded());
        assert!(forest.get(b).unwrap().is_expanded());
    }

    #[test]
    fn set_parent_expands_ancestors_of_selected_node() {
        let mut forest = Forest::from_subtrees([
            Subtree::new("a").child(Subtree::new("b")),
            Subtree::new("loose"),
        ]);
        let a = forest.roots()[0];
        let b = forest.children(a)[0];
        let loose = forest.roots()[1];
        forest.select(Some(loose)).unwrap();
        assert!(!forest.get(loose).unwrap().is_expanded());

        forest.set_parent(loose, Some(b)).unwrap();
        assert!(forest.get(a).unwrap().is_expanded());
        assert!(forest.get(b).unwrap().is_expanded());
        assert!(!forest.get(loose).unwrap().is_expanded());
    }

    #[test]
    fn set_parent_leaves_ancestors_of_plain_node_collapsed() {
        let mut forest = Forest::from_subtrees([
            Subtree::new("a").child(Subtree::new("b")),
            Subtree::new("loose"),
        ]);
        let a = forest.roots()[0];
        let b = forest.children(a)[0];
        let loose = forest.roots()[1];

        forest.set_parent(loose, Some(b)).unwrap();
        assert!(!forest.get(a).unwrap().is_expanded());
        assert!(!forest.get(b).unwrap().is_expanded());
    }

    #[test]
    fn freed_slots_are_reused_with_a_new_generation() {
        let mut forest = sample();
        let ty = forest.roots()[0];
        let pdf = forest.children(ty)[0];
        forest.detach(pdf).unwrap();
        assert_eq!(forest.len(), 4);

        let html = forest.add_child(ty, "html").unwrap();
        assert_eq!(html.index(), pdf.index());
        assert_ne!(html, pdf);
        assert!(!forest.contains(pdf));
        assert_eq!(forest.data(html), Some(&"html"));
        assert_eq!(forest.len(), 5);
    }

    #[test]
    fn arena_stays_bounded_under_replacement() {
        let mut forest = sample();
        let ty = forest.roots()[0];
        for _ in 0..1000 {
            for child in forest.children(ty).to_vec() {
                forest.detach(child).unwrap();
            }
            forest.add_child(ty, "pdf").unwrap();
            forest.add_child(ty, "docx").unwrap();
        }
        assert_eq!(forest.len(), 5);
        let highest = forest.iter().map(NodeId::index).max().unwrap();
        assert!(highest < 5, "arena grew to index {highest}");
    }

    #[test]
    fn detach_returns_owned_subtree_and_stales_ids() {
        let mut forest = sample();
        let ty = forest.roots()[0];
        let pdf = forest.children(ty)[0];
        let key = forest.get(ty).unwrap().key();

        let sub = forest.detach(ty).unwrap();
        assert_eq!(*sub.data(), "Type");
        assert_eq!(sub.key(), key);
        assert_eq!(sub.children().len(), 2);
        assert!(!forest.contains(ty));
        assert!(!forest.contains(pdf));
        assert_eq!(labels(&forest, forest.roots()), ["Modified"]);
        assert!(forest.detach(ty).is_none());
    }

    #[test]
    fn insert_grafts_with_identity() {
        let mut source = sample();
        let ty = source.roots()[0];
        let key = source.get(ty).unwrap().key();
        let sub = source.detach(ty).unwrap();

        let mut target: Forest<&'static str> = Forest::from_subtrees([Subtree::new("root")]);
        let root = target.roots()[0];
        let grafted = target.insert(Some(root), sub).unwrap();

        assert_eq!(target.get(grafted).unwrap().key(), key);
        assert_eq!(target.find_key(key), Some(grafted));
        assert_eq!(labels(&target, target.children(grafted)), ["pdf", "docx"]);
        assert_eq!(target.parent(grafted), Some(root));
    }

    #[test]
    fn set_roots_clears_selection_and_stales_ids() {
        let mut forest = sample();
        let old = forest.roots()[0];
        forest.set_roots([Subtree::new("x").child(Subtree::new("y"))]);
        assert_eq!(labels(&forest, forest.roots()), ["x"]);
        assert!(forest.iter().all(|id| !forest.get(id).unwrap().is_selected()));
        assert_eq!(forest.pending_events(), &[TreeEvent::RootsReplaced]);
        assert_eq!(forest.len(), 2);
        assert!(!forest.contains(old));
        forest.clear();
        assert!(forest.is_empty());
        assert_eq!(forest.len(), 0);
    }

    #[test]
    fn to_subtrees_round_trips() {
        let forest = sample();
        let copy = Forest::from_subtrees(forest.to_subtrees());
        let a: Vec<_> = forest.iter().map(|id| forest.get(id).unwrap().key()).collect();
        let b: Vec<_> = copy.iter().map(|id| copy.get(id).unwrap().key()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn notify_ignores_unknown_nodes() {
        let mut forest = sample();
        let ty = forest.roots()[0];
        forest.notify(NodeId::from_raw(42), NodeField::Payload);
        forest.notify(ty, NodeField::Payload);
        assert_eq!(
            forest.drain_events(),
            vec![TreeEvent::changed(ty, NodeField::Payload)]
        );
        assert!(forest.pending_events().is_empty());
    }
}
