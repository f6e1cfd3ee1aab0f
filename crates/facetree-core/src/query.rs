#![forbid(unsafe_code)]

//! Depth-first traversal helpers.
//!
//! Every walk here is pre-order (a node before its descendants) and
//! depth-first (a subtree is finished before the next sibling starts), and
//! every child is visited regardless of its payload.
//!
//! Flat views such as [`Forest::visible_rows`] are computed on demand from
//! the arena; nothing here caches a flattened copy of the tree.

use crate::error::{Result, TreeError};
use crate::forest::Forest;
use crate::node::{Node, NodeId};

/// Pre-order iterator over a set of subtrees.
#[derive(Debug, Clone)]
pub struct Preorder<'a, T> {
    forest: &'a Forest<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> Preorder<'a, T> {
    fn new(forest: &'a Forest<T>, items: &[NodeId]) -> Self {
        Self {
            forest,
            stack: items.iter().rev().copied().collect(),
        }
    }
}

impl<T> Iterator for Preorder<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let id = self.stack.pop()?;
            if let Some(node) = self.forest.get(id) {
                self.stack.extend(node.children().iter().rev().copied());
                return Some(id);
            }
        }
    }
}

/// Iterator up the parent chain, nearest ancestor first.
#[derive(Debug, Clone)]
pub struct Ancestors<'a, T> {
    forest: &'a Forest<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.forest.parent(id);
        Some(id)
    }
}

/// A row of the expanded view of a forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRow {
    /// The node shown on this row.
    pub id: NodeId,
    /// Nesting depth (roots are 0).
    pub depth: usize,
}

impl<T> Forest<T> {
    /// Pre-order walk over every attached node.
    #[must_use]
    pub fn iter(&self) -> Preorder<'_, T> {
        Preorder::new(self, self.roots())
    }

    /// Pre-order walk over the given subtrees.
    #[must_use]
    pub fn preorder(&self, items: &[NodeId]) -> Preorder<'_, T> {
        Preorder::new(self, items)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            forest: self,
            next: self.parent(id),
        }
    }

    /// Number of ancestors of `id` (roots are at depth 0).
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Slash-joined labels from the root down to `id`, e.g. `"Status/new"`.
    #[must_use]
    pub fn path<F>(&self, id: NodeId, label: F) -> Option<String>
    where
        F: Fn(&T) -> &str,
    {
        let node = self.get(id)?;
        let mut segments = vec![label(node.data())];
        for ancestor in self.ancestors(id) {
            segments.push(label(self.get(ancestor)?.data()));
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Rows reachable from the roots through expanded nodes.
    ///
    /// Roots are always visible; a node's children are visible when the
    /// node itself is visible and expanded.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        fn walk<T>(forest: &Forest<T>, id: NodeId, depth: usize, out: &mut Vec<VisibleRow>) {
            let Some(node) = forest.get(id) else {
                return;
            };
            out.push(VisibleRow { id, depth });
            if node.is_expanded() {
                for &child in node.children() {
                    walk(forest, child, depth + 1, out);
                }
            }
        }

        let mut out = Vec::new();
        for &root in self.roots() {
            walk(self, root, 0, &mut out);
        }
        out
    }
}

/// First node (pre-order, depth-first) under `items` matching `predicate`.
///
/// An absent collection is treated as empty.
pub fn find_first<T, P>(forest: &Forest<T>, items: Option<&[NodeId]>, mut predicate: P) -> Option<NodeId>
where
    P: FnMut(&Node<T>) -> bool,
{
    let items = items?;
    forest
        .preorder(items)
        .find(|&id| forest.get(id).is_some_and(&mut predicate))
}

/// Every node (pre-order, depth-first) under `items` matching `predicate`.
///
/// An absent collection is treated as empty.
pub fn find_all<T, P>(forest: &Forest<T>, items: Option<&[NodeId]>, mut predicate: P) -> Vec<NodeId>
where
    P: FnMut(&Node<T>) -> bool,
{
    let Some(items) = items else {
        return Vec::new();
    };
    forest
        .preorder(items)
        .filter(|&id| forest.get(id).is_some_and(&mut predicate))
        .collect()
}

/// Visit every node under `items` pre-order, depth-first, calling `action`
/// with mutable access to the forest.
///
/// Children are read after `action` returns for their parent, so an action
/// may add or remove children of the node it is visiting.
///
/// # Errors
///
/// [`TreeError::MissingTarget`] if `items` is `None`.
pub fn apply<T, F>(forest: &mut Forest<T>, items: Option<&[NodeId]>, mut action: F) -> Result<()>
where
    F: FnMut(&mut Forest<T>, NodeId),
{
    fn visit<T, F>(forest: &mut Forest<T>, id: NodeId, action: &mut F)
    where
        F: FnMut(&mut Forest<T>, NodeId),
    {
        if !forest.contains(id) {
            return;
        }
        action(forest, id);
        let children = forest.children(id).to_vec();
        for child in children {
            visit(forest, child, action);
        }
    }

    let items = items.ok_or(TreeError::MissingTarget("items"))?;
    for &id in items {
        visit(forest, id, &mut action);
    }
    Ok(())
}
