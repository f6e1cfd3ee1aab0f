#![forbid(unsafe_code)]

//! Facet nodes and facet trees.
//!
//! A facet tree is a forest whose roots are *categories* (one per named
//! aggregation, e.g. `Type` or `Modified`) and whose children are the
//! category's *values* (one per bucket, e.g. `pdf`). Every node carries a
//! name, a document count and an opaque payload.
//!
//! # Invariants
//!
//! 1. Names are unique among siblings and are the key for merging.
//! 2. For any non-leaf node, `doc_count` equals the sum of its children's
//!    counts once [`FacetTree::roll_up_doc_counts`] (or a merge) has run.
//!    [`FacetTree::set_doc_count`] keeps it by re-summing the ancestors.
//! 3. `DocCount` events are queued only when the count actually changes.
//!    [`FacetTree::set_payload`] compares payloads; a merge treats them as
//!    opaque and reports every replacement.
//! 4. Names may contain `/`, so nodes are addressed by name segments
//!    ([`FacetTree::segments`], [`FacetTree::find_path`]). The slash-joined
//!    [`FacetTree::path`] is for display only.

use facetree_core::{
    CheckState, Forest, Node, NodeField, NodeId, Result, Subtree, TreeEvent, find_all, find_first,
};

/// Payload of a facet tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetNode<P> {
    name: String,
    doc_count: u64,
    payload: Option<P>,
}

impl<P> FacetNode<P> {
    /// A node without payload.
    #[must_use]
    pub fn new(name: impl Into<String>, doc_count: u64) -> Self {
        Self {
            name: name.into(),
            doc_count,
            payload: None,
        }
    }

    /// Attach the raw aggregation object this node was built from.
    #[must_use]
    pub fn with_payload(mut self, payload: P) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Facet label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of matching documents.
    #[must_use]
    pub fn doc_count(&self) -> u64 {
        self.doc_count
    }

    /// The raw aggregation object, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// Whether the name is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }

    pub(crate) fn take_payload(&mut self) -> Option<P> {
        self.payload.take()
    }
}

/// Build a facet subtree: `facet("Status", 0).child(facet("new", 2))`.
#[must_use]
pub fn facet<P>(name: impl Into<String>, doc_count: u64) -> Subtree<FacetNode<P>> {
    Subtree::new(FacetNode::new(name, doc_count))
}

/// A forest of facet categories and values.
#[derive(Debug, Clone)]
pub struct FacetTree<P> {
    forest: Forest<FacetNode<P>>,
    pub(crate) persistence_id: Option<String>,
}

impl<P> Default for FacetTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> From<Forest<FacetNode<P>>> for FacetTree<P> {
    fn from(forest: Forest<FacetNode<P>>) -> Self {
        Self {
            forest,
            persistence_id: None,
        }
    }
}

impl<P> FacetTree<P> {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::from(Forest::new())
    }

    /// A tree whose categories are the given subtrees, in order.
    #[must_use]
    pub fn from_subtrees<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = Subtree<FacetNode<P>>>,
    {
        Self::from(Forest::from_subtrees(categories))
    }

    /// Set the identifier used as the persistence key.
    #[must_use]
    pub fn with_persistence_id(mut self, id: impl Into<String>) -> Self {
        self.persistence_id = Some(id.into());
        self
    }

    /// The persistence identifier, if set.
    #[must_use]
    pub fn persistence_id(&self) -> Option<&str> {
        self.persistence_id.as_deref()
    }

    /// The underlying forest.
    #[must_use]
    pub fn forest(&self) -> &Forest<FacetNode<P>> {
        &self.forest
    }

    /// Mutable access to the underlying forest (checked/expanded/selected
    /// state, structure).
    pub fn forest_mut(&mut self) -> &mut Forest<FacetNode<P>> {
        &mut self.forest
    }

    /// Unwrap into the underlying forest.
    #[must_use]
    pub fn into_forest(self) -> Forest<FacetNode<P>> {
        self.forest
    }

    /// Whether the tree has no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Categories in display order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        self.forest.roots()
    }

    /// Look up a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node<FacetNode<P>>> {
        self.forest.get(id)
    }

    /// Name of a node.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.forest.data(id).map(FacetNode::name)
    }

    /// Document count of a node.
    #[must_use]
    pub fn doc_count(&self, id: NodeId) -> Option<u64> {
        self.forest.data(id).map(FacetNode::doc_count)
    }

    /// Slash-joined path from the category down to `id`, e.g. `"Status/new"`.
    ///
    /// Not unique when names contain `/`; use [`segments`](Self::segments)
    /// to address a node.
    #[must_use]
    pub fn path(&self, id: NodeId) -> Option<String> {
        self.forest.path(id, FacetNode::name)
    }

    /// Names from the category down to `id`, e.g. `["Status", "N/A"]`.
    #[must_use]
    pub fn segments(&self, id: NodeId) -> Option<Vec<String>> {
        let mut segments = vec![self.name(id)?.to_owned()];
        for ancestor in self.forest.ancestors(id) {
            segments.push(self.name(ancestor)?.to_owned());
        }
        segments.reverse();
        Some(segments)
    }

    /// Resolve name segments from [`segments`](Self::segments) back to a
    /// node.
    #[must_use]
    pub fn find_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<NodeId> {
        let (first, rest) = segments.split_first()?;
        let mut current = self.child_named(self.roots(), first.as_ref())?;
        for segment in rest {
            current = self.child_named(self.forest.children(current), segment.as_ref())?;
        }
        Some(current)
    }

    /// The top-level category with the given name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<NodeId> {
        find_first(&self.forest, Some(self.roots()), |node| {
            node.parent().is_none() && node.data().name() == name
        })
    }

    /// The value with the given name directly under `category`.
    #[must_use]
    pub fn value(&self, category: NodeId, name: &str) -> Option<NodeId> {
        self.child_named(self.forest.children(category), name)
    }

    /// Every checked node under the named category, pre-order.
    ///
    /// This is what a search trigger turns into filters. Empty when the
    /// category does not exist.
    #[must_use]
    pub fn checked_values(&self, category: &str) -> Vec<NodeId> {
        let items = self.category(category).map(|id| self.forest.children(id));
        find_all(&self.forest, items, |node| {
            node.checked() == CheckState::Checked
        })
    }

    /// Payloads of [`checked_values`](Self::checked_values), skipping nodes
    /// without one.
    #[must_use]
    pub fn checked_payloads(&self, category: &str) -> Vec<&P> {
        self.checked_values(category)
            .into_iter()
            .filter_map(|id| self.forest.data(id).and_then(FacetNode::payload))
            .collect()
    }

    /// Set a leaf's document count and re-sum every ancestor. Returns
    /// whether the leaf's count changed.
    ///
    /// The count of a node with children is the sum of theirs, so setting it
    /// directly is a no-op returning `Ok(false)`.
    pub fn set_doc_count(&mut self, id: NodeId, doc_count: u64) -> Result<bool> {
        if !self.forest.node(id)?.is_leaf() {
            return Ok(false);
        }
        if !write_doc_count(&mut self.forest, id, doc_count) {
            return Ok(false);
        }
        let ancestors: Vec<NodeId> = self.forest.ancestors(id).collect();
        for ancestor in ancestors {
            if let Some(sum) = children_sum(&self.forest, ancestor) {
                write_doc_count(&mut self.forest, ancestor, sum);
            }
        }
        Ok(true)
    }

    /// Replace a node's payload. Returns whether it changed.
    pub fn set_payload(&mut self, id: NodeId, payload: Option<P>) -> Result<bool>
    where
        P: PartialEq,
    {
        self.forest.node(id)?;
        Ok(write_payload(&mut self.forest, id, payload))
    }

    /// Restore the count invariant at every depth: each non-leaf node gets
    /// the sum of its children's counts, bottom-up.
    pub fn roll_up_doc_counts(&mut self) {
        let order: Vec<NodeId> = self.forest.iter().collect();
        for &id in order.iter().rev() {
            if let Some(sum) = children_sum(&self.forest, id) {
                write_doc_count(&mut self.forest, id, sum);
            }
        }
    }

    /// A user click on a node's checkbox. See [`Forest::toggle_checked`].
    pub fn toggle(&mut self, id: NodeId) -> Result<CheckState> {
        self.forest.toggle_checked(id)
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<TreeEvent> {
        self.forest.drain_events()
    }

    fn child_named(&self, ids: &[NodeId], name: &str) -> Option<NodeId> {
        ids.iter()
            .copied()
            .find(|&id| self.name(id) == Some(name))
    }
}

/// Sum of the children's counts, or `None` for a leaf.
pub(crate) fn children_sum<P>(forest: &Forest<FacetNode<P>>, id: NodeId) -> Option<u64> {
    let children = forest.children(id);
    if children.is_empty() {
        return None;
    }
    Some(
        children
            .iter()
            .filter_map(|&child| forest.data(child))
            .map(FacetNode::doc_count)
            .sum(),
    )
}

pub(crate) fn write_doc_count<P>(forest: &mut Forest<FacetNode<P>>, id: NodeId, doc_count: u64) -> bool {
    let Some(node) = forest.data_mut(id) else {
        return false;
    };
    if node.doc_count == doc_count {
        return false;
    }
    node.doc_count = doc_count;
    forest.notify(id, NodeField::DocCount);
    true
}

pub(crate) fn write_payload<P: PartialEq>(
    forest: &mut Forest<FacetNode<P>>,
    id: NodeId,
    payload: Option<P>,
) -> bool {
    let Some(node) = forest.data_mut(id) else {
        return false;
    };
    if node.payload == payload {
        return false;
    }
    node.payload = payload;
    forest.notify(id, NodeField::Payload);
    true
}

/// Assign without comparing; only a `None` to `None` write is silent.
pub(crate) fn replace_payload<P>(
    forest: &mut Forest<FacetNode<P>>,
    id: NodeId,
    payload: Option<P>,
) {
    let Some(node) = forest.data_mut(id) else {
        return;
    };
    if node.payload.is_none() && payload.is_none() {
        return;
    }
    node.payload = payload;
    forest.notify(id, NodeField::Payload);
}
