#![forbid(unsafe_code)]

//! Persisted user state for facet trees.
//!
//! Node ids do not survive a restart, so state is recorded by path: the
//! names from the category down, e.g. `["Status", "N/A"]`. Names are kept as
//! separate segments because they may themselves contain `/`. Only checked
//! *leaves* are stored: parents are derived by roll-up when the leaves are
//! re-applied.

use std::collections::BTreeSet;

use facetree_core::{CheckState, NodeId, StateKey, Stateful};

use crate::facet::FacetTree;

/// Saved checked/expanded/selected state of a [`FacetTree`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct FacetTreeState {
    /// Paths of checked leaves.
    pub checked: BTreeSet<FacetPath>,
    /// Paths of expanded nodes.
    pub expanded: BTreeSet<FacetPath>,
    /// Path of the selected node.
    pub selected: Option<FacetPath>,
}

/// Names from a category down to a node.
pub type FacetPath = Vec<String>;

impl<P> Stateful for FacetTree<P> {
    type State = FacetTreeState;

    fn state_key(&self) -> StateKey {
        StateKey::new("FacetTree", self.persistence_id().unwrap_or("default"))
    }

    fn save_state(&self) -> FacetTreeState {
        let mut state = FacetTreeState::default();
        for id in self.forest().iter() {
            let (Some(node), Some(path)) = (self.get(id), self.segments(id)) else {
                continue;
            };
            if node.is_leaf() && node.checked() == CheckState::Checked {
                state.checked.insert(path.clone());
            }
            if node.is_expanded() {
                state.expanded.insert(path.clone());
            }
            if node.is_selected() && state.selected.is_none() {
                state.selected = Some(path);
            }
        }
        state
    }

    fn restore_state(&mut self, state: FacetTreeState) {
        let order: Vec<NodeId> = self.forest().iter().collect();

        let selected = state.selected.as_deref().and_then(|path| self.find_path(path));
        let _ = self.forest_mut().select(selected);

        // Descendants first, so a collapsed ancestor is not re-expanded by a
        // saved child.
        for &id in order.iter().rev() {
            let Some(path) = self.segments(id) else {
                continue;
            };
            let _ = self
                .forest_mut()
                .set_expanded(id, state.expanded.contains(&path));
        }

        for &id in &order {
            let is_leaf = self.get(id).is_some_and(|node| node.is_leaf());
            let Some(path) = self.segments(id).filter(|_| is_leaf) else {
                continue;
            };
            let value = CheckState::from(state.checked.contains(&path));
            let _ = self.forest_mut().set_checked(id, value, false, true);
        }

        facetree_core::trace!(
            checked = state.checked.len(),
            expanded = state.expanded.len(),
            "restored facet tree state"
        );
    }
}
