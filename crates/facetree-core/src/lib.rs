#![forbid(unsafe_code)]

//! Core: an arena-backed forest of checkable nodes.
//!
//! - [`Forest`] owns the nodes and the structural operations (add, move,
//!   graft, detach).
//! - Tri-state checkbox propagation and expand-to-root live on `Forest` too
//!   (see the `state` module docs).
//! - [`query`] provides pre-order, depth-first find/find-all/apply.
//! - Every observable change is queued as a [`TreeEvent`].

pub mod error;
pub mod event;
pub mod forest;
pub mod logging;
pub mod node;
pub mod query;
mod state;
pub mod stateful;

pub use error::{Result, TreeError};
pub use event::{NodeField, TreeEvent};
pub use forest::Forest;
pub use node::{CheckState, Node, NodeId, NodeKey, Subtree};
pub use query::{Ancestors, Preorder, VisibleRow, apply, find_all, find_first};
pub use stateful::{StateKey, Stateful, VersionedState};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, trace_span, warn};
