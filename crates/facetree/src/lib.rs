#![forbid(unsafe_code)]

//! facetree public facade crate.
//!
//! Re-exports the tree model and the facet layer, and offers a prelude for
//! the usual cycle of a faceted search screen:
//!
//! ```
//! use facetree::prelude::*;
//!
//! // First result: installed as-is.
//! let fresh = FacetTree::from_aggregations([(
//!     "Type",
//!     Aggregation::new(vec![Bucket::new("pdf", 3), Bucket::new("docx", 1)]),
//! )]);
//! let mut shown = merge(FacetTree::new(), fresh);
//!
//! // The user ticks a value; the search trigger is told once.
//! let ty = shown.category("Type").unwrap();
//! let pdf = shown.value(ty, "pdf").unwrap();
//! shown.toggle(pdf).unwrap();
//! assert!(shown.drain_events().contains(&TreeEvent::CheckedChanged));
//!
//! // The filtered result no longer contains docx, but it stays on display.
//! let filtered = FacetTree::from_aggregations([(
//!     "Type",
//!     Aggregation::new(vec![Bucket::new("pdf", 3)]),
//! )]);
//! let shown = merge(shown, filtered);
//! let docx = shown.value(ty, "docx").unwrap();
//! assert_eq!(shown.doc_count(docx), Some(0));
//! assert_eq!(shown.checked_values("Type"), vec![pdf]);
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use facetree_core::{
    Ancestors, CheckState, Forest, Node, NodeField, NodeId, NodeKey, Preorder, StateKey, Stateful,
    Subtree, TreeError, TreeEvent, VersionedState, VisibleRow, apply, find_all, find_first,
};

// --- Facet re-exports ------------------------------------------------------

pub use facetree_facets::{
    Aggregation, Bucket, ConfigError, FacetNode, FacetPath, FacetTree, FacetTreeState,
    MergeConfig, MergeEngine, MergeReport, NewCategoryPolicy, facet, merge,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A structural tree operation failed.
    Tree(TreeError),
    /// A configuration value was rejected.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for facetree APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Merge configuration from the environment, failing on the first rejected
/// value instead of falling back to its default.
pub fn merge_config_from_env() -> Result<MergeConfig> {
    let parsed = MergeConfig::from_env_with_diagnostics();
    match parsed.errors.into_iter().next() {
        Some(err) => Err(err.into()),
        None => Ok(parsed.config),
    }
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Aggregation, Bucket, CheckState, Error, FacetTree, MergeConfig, MergeEngine, NodeId,
        Result, Stateful, Subtree, TreeEvent, facet, merge,
    };

    pub use crate::{core, facets};
}

pub use facetree_core as core;
pub use facetree_facets as facets;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_wraps_both_sources() {
        let tree: Error = TreeError::UnknownNode(NodeId::from_raw(3)).into();
        assert_eq!(tree.to_string(), "unknown node #3");
        assert!(std::error::Error::source(&tree).is_some());

        let config = MergeConfig::from_env_with_diagnostics();
        assert!(config.errors.iter().all(|err| !Error::from(err.clone()).to_string().is_empty()));
    }
}
