#![forbid(unsafe_code)]

//! Facet trees for faceted search.
//!
//! - [`FacetTree`] is a [`facetree_core::Forest`] of [`FacetNode`]s: a
//!   name, a document count and an opaque payload per node.
//! - [`merge`] / [`MergeEngine`] reconcile the displayed tree with a fresh
//!   search result without losing the user's selection.
//! - [`FacetTree::from_aggregations`] converts raw [`Aggregation`]s.
//! - [`FacetTreeState`] persists checked/expanded/selected state by name path.

pub mod aggregation;
pub mod config;
pub mod facet;
pub mod merge;
pub mod persist;

pub use aggregation::{Aggregation, Bucket};
pub use config::{ConfigError, MergeConfig, MergeConfigParse, NewCategoryPolicy};
pub use facet::{FacetNode, FacetTree, facet};
pub use merge::{MergeEngine, MergeReport, merge};
pub use persist::{FacetPath, FacetTreeState};
