#![forbid(unsafe_code)]

//! Opt-in trait for trees with persistable UI state.
//!
//! A tree's user-facing state (checked leaves, expanded nodes, the selected
//! node) should survive a restart even though the tree itself is rebuilt
//! from a fresh search result. [`Stateful`] is the contract for extracting
//! that state and re-applying it to a rebuilt tree.
//!
//! # Invariants
//!
//! 1. **Round-trip fidelity**: `restore_state(save_state())` on the same
//!    tree produces the same observable checked/expanded/selected state.
//! 2. **Graceful mismatch**: state that names nodes which no longer exist is
//!    ignored; a version mismatch in [`VersionedState`] falls back to
//!    `State::default()`.
//! 3. **No side effects**: `save_state` is a pure read.
//!
//! # Feature Gate
//!
//! [`VersionedState`] derives `Serialize`/`Deserialize` with the
//! `state-persistence` feature.

use core::fmt;

/// Unique identifier for a tree's persisted state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    /// The tree kind (e.g. `"FacetTree"`).
    pub kind: &'static str,
    /// Instance-unique identifier.
    pub instance_id: String,
}

impl StateKey {
    /// Create a new state key.
    #[must_use]
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            kind,
            instance_id: id.into(),
        }
    }

    /// Canonical string representation: `"kind::instance_id"`.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.kind, self.instance_id)
    }
}

/// Save and restore user-facing tree state.
pub trait Stateful: Sized {
    /// The persisted state. `Default` is the fallback for missing or
    /// mismatched state.
    type State: Default;

    /// Unique key of this instance.
    fn state_key(&self) -> StateKey;

    /// Extract the current state. Must be a pure read.
    fn save_state(&self) -> Self::State;

    /// Re-apply a saved state, ignoring entries that no longer resolve.
    fn restore_state(&mut self, state: Self::State);

    /// Schema version; bump when `State` changes incompatibly.
    fn state_version() -> u32 {
        1
    }
}

/// Version-tagged envelope for persisted state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct VersionedState<S> {
    /// Schema version (from [`Stateful::state_version`]).
    pub version: u32,
    /// The state payload.
    pub data: S,
}

impl<S> VersionedState<S> {
    /// Pack an instance's state with its current version.
    pub fn pack<W: Stateful<State = S>>(widget: &W) -> Self {
        Self {
            version: W::state_version(),
            data: widget.save_state(),
        }
    }

    /// Unpack, or `None` on version mismatch.
    pub fn unpack<W: Stateful<State = S>>(self) -> Option<S> {
        (self.version == W::state_version()).then_some(self.data)
    }

    /// Unpack, falling back to `S::default()` on version mismatch.
    pub fn unpack_or_default<W: Stateful<State = S>>(self) -> S
    where
        S: Default,
    {
        self.unpack::<W>().unwrap_or_default()
    }
}
