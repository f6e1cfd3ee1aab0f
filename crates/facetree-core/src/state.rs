#![forbid(unsafe_code)]

//! Tri-state checkbox propagation and expand-to-root.
//!
//! # Checked propagation
//!
//! Setting a node's checked state may cascade in two directions:
//!
//! - **down**: a definite value (checked or unchecked) is copied to every
//!   descendant;
//! - **up**: the parent recomputes its state from its children, which may in
//!   turn make the grandparent recompute, and so on to the root.
//!
//! Every assignment is guarded by "is the value different?". That guard is
//! what terminates the mutual recursion between a node and its parent: once a
//! level no longer changes, nothing above it is revisited.
//!
//! # Expansion
//!
//! Expanding or selecting a node expands every ancestor, so the node is
//! actually visible. Neither propagates downwards.

use crate::error::Result;
use crate::event::{NodeField, TreeEvent};
use crate::forest::Forest;
use crate::node::{CheckState, NodeId};

impl<T> Forest<T> {
    /// Set a node's checked state with explicit propagation flags.
    ///
    /// A no-op (and no event) when the value is unchanged. Otherwise the
    /// value is assigned, pushed down to all descendants when
    /// `propagate_to_children` is set and the value is definite, and the
    /// parent recomputes its state when `propagate_to_parent` is set. The
    /// `Checked` event for this node is queued after the cascade settles.
    pub fn set_checked(
        &mut self,
        id: NodeId,
        value: CheckState,
        propagate_to_children: bool,
        propagate_to_parent: bool,
    ) -> Result<()> {
        self.node(id)?;
        self.apply_checked(id, value, propagate_to_children, propagate_to_parent);
        Ok(())
    }

    /// Recompute a node's checked state from its children and propagate the
    /// result upwards.
    ///
    /// Childless nodes are left alone: a leaf's state is authoritative.
    pub fn recompute_checked(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.recompute_from_children(id);
        Ok(())
    }

    /// A user click: set the checked state with full propagation and queue a
    /// single [`TreeEvent::CheckedChanged`] if anything changed.
    ///
    /// Returns whether the node's state changed.
    pub fn user_set_checked(&mut self, id: NodeId, value: CheckState) -> Result<bool> {
        self.node(id)?;
        let changed = self.apply_checked(id, value, true, true);
        crate::trace!(node = %id, ?value, changed, "user set checked");
        if changed {
            self.push_event(TreeEvent::CheckedChanged);
        }
        Ok(changed)
    }

    /// A user click that flips the current state (indeterminate becomes
    /// checked). Returns the new state.
    pub fn toggle_checked(&mut self, id: NodeId) -> Result<CheckState> {
        let next = self.node(id)?.checked().toggled();
        self.user_set_checked(id, next)?;
        Ok(next)
    }

    /// Set the expanded flag. Expanding also expands every ancestor.
    pub fn set_expanded(&mut self, id: NodeId, value: bool) -> Result<()> {
        self.node(id)?;
        self.apply_expanded(id, value);
        if value {
            if let Some(parent) = self.parent(id) {
                self.expand_to_root(parent);
            }
        }
        Ok(())
    }

    /// Set the selected flag. Selecting expands every ancestor (not the node
    /// itself) and leaves children untouched.
    pub fn set_selected(&mut self, id: NodeId, value: bool) -> Result<()> {
        let node = self.node(id)?;
        if node.selected != value {
            if let Some(node) = self.slot_mut(id) {
                node.selected = value;
            }
            self.push_event(TreeEvent::changed(id, NodeField::Selected));
        }
        if value {
            if let Some(parent) = self.parent(id) {
                self.expand_to_root(parent);
            }
        }
        Ok(())
    }

    /// Set the enabled flag.
    pub fn set_enabled(&mut self, id: NodeId, value: bool) -> Result<()> {
        let node = self.node(id)?;
        if node.enabled != value {
            if let Some(node) = self.slot_mut(id) {
                node.enabled = value;
            }
            self.push_event(TreeEvent::changed(id, NodeField::Enabled));
        }
        Ok(())
    }

    /// Make `id` the single selected node of the forest, or clear the
    /// selection with `None`.
    ///
    /// Any other selected node is deselected first.
    pub fn select(&mut self, id: Option<NodeId>) -> Result<()> {
        if let Some(id) = id {
            self.node(id)?;
        }
        let previous: Vec<NodeId> = self
            .iter()
            .filter(|&other| Some(other) != id)
            .filter(|&other| self.get(other).is_some_and(|n| n.is_selected()))
            .collect();
        for other in previous {
            self.set_selected(other, false)?;
        }
        if let Some(id) = id {
            self.set_selected(id, true)?;
        }
        Ok(())
    }

    /// The selected node, if any (first in pre-order when several are).
    #[must_use]
    pub fn selected_item(&self) -> Option<NodeId> {
        self.iter()
            .find(|&id| self.get(id).is_some_and(|n| n.is_selected()))
    }

    /// Expand `id` and all of its ancestors.
    pub(crate) fn expand_to_root(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.apply_expanded(node, true);
            current = self.parent(node);
        }
    }

    fn apply_expanded(&mut self, id: NodeId, value: bool) -> bool {
        let Some(node) = self.slot_mut(id) else {
            return false;
        };
        if node.expanded == value {
            return false;
        }
        node.expanded = value;
        self.push_event(TreeEvent::changed(id, NodeField::Expanded));
        true
    }

    fn apply_checked(
        &mut self,
        id: NodeId,
        value: CheckState,
        propagate_to_children: bool,
        propagate_to_parent: bool,
    ) -> bool {
        let Some(node) = self.slot_mut(id) else {
            return false;
        };
        if node.checked == value {
            return false;
        }
        // Assign before cascading so the parent's roll-up sees the new value.
        node.checked = value;

        if propagate_to_children && value.is_defined() {
            let children = node.children.clone();
            for child in children {
                self.apply_checked(child, value, true, false);
            }
        }

        if propagate_to_parent {
            if let Some(parent) = self.parent(id) {
                self.recompute_from_children(parent);
            }
        }

        self.push_event(TreeEvent::changed(id, NodeField::Checked));
        true
    }

    fn recompute_from_children(&mut self, id: NodeId) {
        let children = self.children(id);
        let state = CheckState::roll_up(
            children
                .iter()
                .filter_map(|&child| self.get(child).map(|n| n.checked())),
        );
        if let Some(state) = state {
            self.apply_checked(id, state, false, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Subtree;

    /// root
    /// ├── a
    /// │   ├── a1
    /// │   └── a2
    /// └── b
    fn sample() -> (Forest<&'static str>, [NodeId; 5]) {
        let forest = Forest::from_subtrees([Subtree::new("root")
            .child(
                Subtree::new("a")
                    .child(Subtree::new("a1"))
                    .child(Subtree::new("a2")),
            )
            .child(Subtree::new("b"))]);
        let root = forest.roots()[0];
        let a = forest.children(root)[0];
        let b = forest.children(root)[1];
        let a1 = forest.children(a)[0];
        let a2 = forest.children(a)[1];
        (forest, [root, a, a1, a2, b])
    }

    fn state(forest: &Forest<&'static str>, id: NodeId) -> CheckState {
        forest.get(id).unwrap().checked()
    }

    #[test]
    fn checking_a_parent_cascades_to_all_descendants() {
        let (mut forest, [root, a, a1, a2, b]) = sample();
        forest.user_set_checked(root, CheckState::Checked).unwrap();
        for id in [root, a, a1, a2, b] {
            assert_eq!(state(&forest, id), CheckState::Checked);
        }
    }

    #[test]
    fn checking_one_leaf_makes_ancestors_indeterminate() {
        let (mut forest, [root, a, a1, a2, b]) = sample();
        forest.user_set_checked(a1, CheckState::Checked).unwrap();
        assert_eq!(state(&forest, a1), CheckState::Checked);
        assert_eq!(state(&forest, a2), CheckState::Unchecked);
        assert_eq!(state(&forest, a), CheckState::Indeterminate);
        assert_eq!(state(&forest, root), CheckState::Indeterminate);
        assert_eq!(state(&forest, b), CheckState::Unchecked);
    }

    #[test]
    fn checking_all_leaves_rolls_up_to_checked() {
        let (mut forest, [root, a, a1, a2, b]) = sample();
        forest.user_set_checked(a1, CheckState::Checked).unwrap();
        forest.user_set_checked(a2, CheckState::Checked).unwrap();
        assert_eq!(state(&forest, a), CheckState::Checked);
        assert_eq!(state(&forest, root), CheckState::Indeterminate);
        forest.user_set_checked(b, CheckState::Checked).unwrap();
        assert_eq!(state(&forest, root), CheckState::Checked);
    }

    #[test]
    fn unchecking_everything_rolls_up_to_unchecked() {
        let (mut forest, [root, a, a1, _, _]) = sample();
        forest.user_set_checked(root, CheckState::Checked).unwrap();
        forest.user_set_checked(a1, CheckState::Unchecked).unwrap();
        assert_eq!(state(&forest, a), CheckState::Indeterminate);
        forest.user_set_checked(root, CheckState::Unchecked).unwrap();
        assert_eq!(state(&forest, a), CheckState::Unchecked);
        assert_eq!(state(&forest, a1), CheckState::Unchecked);
    }

    #[test]
    fn indeterminate_does_not_cascade_down() {
        let (mut forest, [_, a, a1, a2, _]) = sample();
        forest.user_set_checked(a1, CheckState::Checked).unwrap();
        forest
            .set_checked(a, CheckState::Indeterminate, true, false)
            .unwrap();
        assert_eq!(state(&forest, a1), CheckState::Checked);
        assert_eq!(state(&forest, a2), CheckState::Unchecked);
    }

    #[test]
    fn setting_the_current_value_is_silent() {
        let (mut forest, [root, ..]) = sample();
        forest.drain_events();
        let changed = forest.user_set_checked(root, CheckState::Unchecked).unwrap();
        assert!(!changed);
        assert!(forest.pending_events().is_empty());
    }

    #[test]
    fn user_toggle_emits_one_checked_changed_after_cascade() {
        let (mut forest, [root, _, a1, ..]) = sample();
        forest.toggle_checked(a1).unwrap();
        let events = forest.drain_events();
        let selection: Vec<_> = events
            .iter()
            .filter(|e| **e == TreeEvent::CheckedChanged)
            .collect();
        assert_eq!(selection.len(), 1);
        assert_eq!(events.last(), Some(&TreeEvent::CheckedChanged));
        assert!(events.contains(&TreeEvent::changed(root, NodeField::Checked)));
        assert!(events.contains(&TreeEvent::changed(a1, NodeField::Checked)));
    }

    #[test]
    fn engine_level_set_checked_does_not_raise_selection_event() {
        let (mut forest, [_, _, a1, ..]) = sample();
        forest.set_checked(a1, CheckState::Checked, true, true).unwrap();
        assert!(!forest.drain_events().contains(&TreeEvent::CheckedChanged));
    }

    #[test]
    fn set_checked_without_parent_propagation_leaves_parent_alone() {
        let (mut forest, [_, a, a1, ..]) = sample();
        forest.set_checked(a1, CheckState::Checked, true, false).unwrap();
        assert_eq!(state(&forest, a), CheckState::Unchecked);
        forest.recompute_checked(a).unwrap();
        assert_eq!(state(&forest, a), CheckState::Indeterminate);
    }

    #[test]
    fn recompute_on_leaf_is_a_noop() {
        let (mut forest, [_, _, _, _, b]) = sample();
        forest.set_checked(b, CheckState::Checked, false, false).unwrap();
        forest.recompute_checked(b).unwrap();
        assert_eq!(state(&forest, b), CheckState::Checked);
    }

    #[test]
    fn toggle_indeterminate_checks_subtree() {
        let (mut forest, [_, a, a1, a2, _]) = sample();
        forest.user_set_checked(a1, CheckState::Checked).unwrap();
        assert_eq!(forest.toggle_checked(a).unwrap(), CheckState::Checked);
        assert_eq!(state(&forest, a2), CheckState::Checked);
    }

    #[test]
    fn expanding_a_leaf_expands_to_root() {
        let (mut forest, [root, a, a1, _, b]) = sample();
        forest.set_expanded(a1, true).unwrap();
        for id in [root, a, a1] {
            assert!(forest.get(id).unwrap().is_expanded());
        }
        assert!(!forest.get(b).unwrap().is_expanded());
    }

    #[test]
    fn expanding_reaches_root_past_a_collapsed_ancestor() {
        let (mut forest, [root, a, a1, _, _]) = sample();
        forest.set_expanded(a1, true).unwrap();
        forest.set_expanded(root, false).unwrap();
        forest.set_expanded(a1, true).unwrap();
        assert!(forest.get(root).unwrap().is_expanded());
        assert!(forest.get(a).unwrap().is_expanded());
    }

    #[test]
    fn collapsing_does_not_touch_relatives() {
        let (mut forest, [root, a, a1, _, _]) = sample();
        forest.set_expanded(a1, true).unwrap();
        forest.set_expanded(a, false).unwrap();
        assert!(forest.get(root).unwrap().is_expanded());
        assert!(forest.get(a1).unwrap().is_expanded());
    }

    #[test]
    fn selecting_expands_ancestors_not_self() {
        let (mut forest, [root, a, a1, _, _]) = sample();
        forest.set_selected(a1, true).unwrap();
        assert!(forest.get(a1).unwrap().is_selected());
        assert!(!forest.get(a1).unwrap().is_expanded());
        assert!(forest.get(a).unwrap().is_expanded());
        assert!(forest.get(root).unwrap().is_expanded());
    }

    #[test]
    fn select_keeps_a_single_selected_item() {
        let (mut forest, [_, a, a1, _, b]) = sample();
        forest.select(Some(a1)).unwrap();
        assert_eq!(forest.selected_item(), Some(a1));
        forest.select(Some(b)).unwrap();
        assert_eq!(forest.selected_item(), Some(b));
        assert!(!forest.get(a1).unwrap().is_selected());
        forest.select(None).unwrap();
        assert_eq!(forest.selected_item(), None);
        assert!(forest.get(a).unwrap().is_expanded());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let (mut forest, _) = sample();
        let ghost = NodeId::from_raw(99);
        assert!(forest.set_checked(ghost, CheckState::Checked, true, true).is_err());
        assert!(forest.set_expanded(ghost, true).is_err());
        assert!(forest.select(Some(ghost)).is_err());
        assert!(forest.toggle_checked(ghost).is_err());
    }

    #[test]
    fn enabled_flag_emits_once() {
        let (mut forest, [root, ..]) = sample();
        forest.set_enabled(root, false).unwrap();
        forest.set_enabled(root, false).unwrap();
        assert_eq!(
            forest.drain_events(),
            vec![TreeEvent::changed(root, NodeField::Enabled)]
        );
        assert!(!forest.get(root).unwrap().is_enabled());
    }
}
