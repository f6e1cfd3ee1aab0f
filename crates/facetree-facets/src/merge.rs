#![forbid(unsafe_code)]

//! Incremental facet merge.
//!
//! Every search returns a fresh aggregation tree. Replacing the displayed
//! tree with it would lose the user's checkboxes and make facets that the
//! current filter excludes disappear, so the user could never widen the
//! search again. Instead the fresh tree is merged into the displayed one:
//!
//! 1. The first result is installed as-is.
//! 2. Afterwards every displayed count is zeroed.
//! 3. Each incoming category is matched by name against the displayed
//!    categories. Within a matched category each incoming value either
//!    updates the displayed value of the same name (payload, count and the
//!    subtree below it) or is appended. Blank-named values are skipped.
//! 4. Each category's count is recomputed from its values.
//!
//! Displayed nodes are never removed: a value missing from the fresh result
//! stays with a count of zero. Matched nodes keep their identity and their
//! checked/expanded/selected state.
//!
//! ```
//! use facetree_facets::{FacetTree, facet, merge};
//!
//! let shown: FacetTree<()> = FacetTree::from_subtrees([facet("Status", 5)
//!     .child(facet("new", 2))
//!     .child(facet("draft", 1))
//!     .child(facet("unread", 2))]);
//! let fresh = FacetTree::from_subtrees([facet("Status", 10)
//!     .child(facet("new", 8))
//!     .child(facet("draft", 2))]);
//!
//! let merged = merge(shown, fresh);
//! let status = merged.category("Status").unwrap();
//! assert_eq!(merged.doc_count(status), Some(10));
//! let unread = merged.value(status, "unread").unwrap();
//! assert_eq!(merged.doc_count(unread), Some(0));
//! ```

use facetree_core::{Forest, Node, NodeId, Subtree, apply};

use crate::config::{MergeConfig, NewCategoryPolicy};
use crate::facet::{FacetNode, FacetTree, children_sum, replace_payload, write_doc_count};

/// Merge `incoming` into `existing` with the default configuration.
#[must_use]
pub fn merge<P>(existing: FacetTree<P>, incoming: FacetTree<P>) -> FacetTree<P> {
    MergeEngine::default().merge(existing, incoming)
}

/// What a merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    /// The displayed tree was empty and the incoming one was installed.
    pub passthrough: bool,
    /// Displayed values updated from a same-named incoming value.
    pub updated: usize,
    /// Incoming values appended to a displayed category.
    pub added: usize,
    /// Displayed values with no incoming counterpart (kept at zero).
    pub retained: usize,
    /// Incoming values skipped for a blank name.
    pub skipped_blank: usize,
    /// Incoming categories dropped under [`NewCategoryPolicy::Ignore`].
    pub dropped_categories: usize,
    /// Incoming categories appended under [`NewCategoryPolicy::Append`].
    pub appended_categories: usize,
}

/// Facet merge with a fixed configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine {
    config: MergeConfig,
}

impl MergeEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Create an engine configured from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(MergeConfig::from_env())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge `incoming` into `existing` and return the tree to display.
    #[must_use]
    pub fn merge<P>(
        &self,
        existing: FacetTree<P>,
        incoming: FacetTree<P>,
    ) -> FacetTree<P> {
        let mut merged = existing;
        self.merge_into(&mut merged, incoming);
        merged
    }

    /// Merge `incoming` into `existing` in place.
    ///
    /// When `existing` is empty it is replaced by `incoming`, keeping its
    /// persistence id if `incoming` has none.
    pub fn merge_into<P>(
        &self,
        existing: &mut FacetTree<P>,
        mut incoming: FacetTree<P>,
    ) -> MergeReport {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "facet_merge",
            existing_roots = existing.roots().len(),
            incoming_roots = incoming.roots().len(),
        )
        .entered();

        let mut report = MergeReport::default();

        if existing.is_empty() {
            if incoming.persistence_id.is_none() {
                incoming.persistence_id = existing.persistence_id.take();
            }
            *existing = incoming;
            report.passthrough = true;
            facetree_core::debug!(
                roots = existing.roots().len(),
                "facet merge installed first result"
            );
            return report;
        }

        let roots = existing.roots().to_vec();
        let displayed_values: usize = roots
            .iter()
            .map(|&root| existing.forest().children(root).len())
            .sum();

        // `apply` only fails for an absent target.
        let _ = apply(existing.forest_mut(), Some(roots.as_slice()), |forest, id| {
            write_doc_count(forest, id, 0);
        });

        for category in incoming.roots().to_vec() {
            self.merge_category(existing, &mut incoming, category, &mut report);
        }

        for root in existing.roots().to_vec() {
            let forest = existing.forest_mut();
            if let Some(sum) = children_sum(forest, root) {
                write_doc_count(forest, root, sum);
                let _ = forest.recompute_checked(root);
            }
        }

        report.retained = displayed_values.saturating_sub(report.updated);
        facetree_core::debug!(
            updated = report.updated,
            added = report.added,
            retained = report.retained,
            skipped_blank = report.skipped_blank,
            dropped_categories = report.dropped_categories,
            appended_categories = report.appended_categories,
            "facet merge complete"
        );
        report
    }

    fn merge_category<P>(
        &self,
        existing: &mut FacetTree<P>,
        incoming: &mut FacetTree<P>,
        category: NodeId,
        report: &mut MergeReport,
    ) {
        let Some(name) = incoming.name(category).map(str::to_owned) else {
            return;
        };
        let Some(found) = self.find_named(existing, existing.roots(), &name) else {
            match self.config.new_categories {
                NewCategoryPolicy::Ignore => {
                    facetree_core::debug!(category = %name, "dropping category not on display");
                    report.dropped_categories += 1;
                }
                NewCategoryPolicy::Append => {
                    if let Some(tree) = incoming.forest_mut().detach(category) {
                        self.append_category(existing, tree, report);
                    }
                }
            }
            return;
        };

        // A category without values carries its own count.
        if incoming.forest().children(category).is_empty()
            && existing.forest().children(found).is_empty()
        {
            if let Some(tree) = incoming.forest_mut().detach(category) {
                update_node(existing.forest_mut(), found, tree);
            }
            return;
        }

        for concrete in incoming.forest().children(category).to_vec() {
            let Some(value) = incoming.forest().data(concrete) else {
                continue;
            };
            if value.is_blank() {
                report.skipped_blank += 1;
                continue;
            }
            let value_name = value.name().to_owned();
            let matched = self.find_named(existing, existing.forest().children(found), &value_name);
            let Some(tree) = incoming.forest_mut().detach(concrete) else {
                continue;
            };
            match matched {
                None => {
                    if existing.forest_mut().insert(Some(found), tree).is_ok() {
                        report.added += 1;
                    }
                }
                Some(target) => {
                    update_node(existing.forest_mut(), target, tree);
                    report.updated += 1;
                }
            }
        }
    }

    /// Attach a category that is not on display, without its blank values.
    fn append_category<P>(
        &self,
        existing: &mut FacetTree<P>,
        mut tree: Subtree<FacetNode<P>>,
        report: &mut MergeReport,
    ) {
        let had_values = !tree.children().is_empty();
        let before = tree.children().len();
        tree.children_mut().retain(|value| !value.data().is_blank());
        report.skipped_blank += before - tree.children().len();

        let forest = existing.forest_mut();
        let Ok(id) = forest.insert(None, tree) else {
            return;
        };
        if had_values {
            let sum = children_sum(forest, id).unwrap_or(0);
            write_doc_count(forest, id, sum);
        }
        report.appended_categories += 1;
    }

    fn find_named<P>(&self, tree: &FacetTree<P>, ids: &[NodeId], name: &str) -> Option<NodeId> {
        ids.iter().copied().find(|&id| {
            tree.name(id)
                .is_some_and(|candidate| self.config.names_match(candidate, name))
        })
    }
}

/// Copy payload and count from `tree` onto `target` and replace everything
/// below `target` with `tree`'s children.
///
/// New children take `target`'s checked state when it is definite;
/// otherwise `target` recomputes its state from them.
fn update_node<P>(
    forest: &mut Forest<FacetNode<P>>,
    target: NodeId,
    mut tree: Subtree<FacetNode<P>>,
) {
    let doc_count = tree.data().doc_count();
    replace_payload(forest, target, tree.data_mut().take_payload());
    write_doc_count(forest, target, doc_count);

    let old_children = forest.children(target).to_vec();
    let new_children = std::mem::take(tree.children_mut());
    if old_children.is_empty() && new_children.is_empty() {
        return;
    }
    for child in old_children {
        forest.detach(child);
    }

    let state = forest.get(target).map(Node::checked).unwrap_or_default();
    for child in new_children {
        if let Ok(id) = forest.insert(Some(target), child) {
            if state.is_defined() {
                let _ = forest.set_checked(id, state, true, false);
            }
        }
    }
    if !state.is_defined() {
        let _ = forest.recompute_checked(target);
    }
}
