#![forbid(unsafe_code)]

//! Conversion from search aggregation results.
//!
//! A search backend answers with named aggregations, each holding buckets,
//! and each bucket may nest further named aggregations (a date range
//! wrapping `Today`/`Yesterday`/`Older` sub-ranges, say). The conversion
//! keeps bucket order, makes one category per aggregation and one value per
//! bucket, and carries the bucket itself as the value's payload so a search
//! trigger can turn checked values back into filters.

use facetree_core::Subtree;

use crate::facet::{FacetNode, FacetTree};

/// A named aggregation result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Aggregation {
    /// Documents in the aggregation's scope, if the backend reports it.
    pub doc_count: u64,
    /// Buckets in backend order.
    pub buckets: Vec<Bucket>,
}

/// One bucket of an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Bucket {
    /// Bucket key (term, range label). May be empty.
    pub key: String,
    /// Documents in the bucket. Zero for wrapper buckets that only nest
    /// sub-aggregations.
    pub doc_count: u64,
    /// Nested named aggregations, in backend order.
    pub aggregations: Vec<(String, Aggregation)>,
}

impl Aggregation {
    /// An aggregation over the given buckets.
    #[must_use]
    pub fn new(buckets: Vec<Bucket>) -> Self {
        Self {
            doc_count: 0,
            buckets,
        }
    }

    /// Set the reported document count.
    #[must_use]
    pub fn with_doc_count(mut self, doc_count: u64) -> Self {
        self.doc_count = doc_count;
        self
    }

    /// The reported count, or the sum of the buckets' effective counts when
    /// none was reported.
    #[must_use]
    pub fn effective_doc_count(&self) -> u64 {
        if self.doc_count > 0 {
            return self.doc_count;
        }
        self.buckets.iter().map(Bucket::effective_doc_count).sum()
    }
}

impl Bucket {
    /// A bucket with a key and count.
    #[must_use]
    pub fn new(key: impl Into<String>, doc_count: u64) -> Self {
        Self {
            key: key.into(),
            doc_count,
            aggregations: Vec::new(),
        }
    }

    /// Nest a named sub-aggregation.
    #[must_use]
    pub fn with_aggregation(mut self, name: impl Into<String>, aggregation: Aggregation) -> Self {
        self.aggregations.push((name.into(), aggregation));
        self
    }

    /// The bucket's own count, or the sum over its sub-aggregations when
    /// that is zero.
    #[must_use]
    pub fn effective_doc_count(&self) -> u64 {
        if self.doc_count > 0 {
            return self.doc_count;
        }
        self.aggregations
            .iter()
            .map(|(_, aggregation)| aggregation.effective_doc_count())
            .sum()
    }
}

impl FacetTree<Bucket> {
    /// Build a facet tree from named aggregations.
    ///
    /// One category per aggregation, one value per bucket (empty keys
    /// included), order preserved. A category's count is the sum of its
    /// values' counts.
    #[must_use]
    pub fn from_aggregations<I, S>(aggregations: I) -> Self
    where
        I: IntoIterator<Item = (S, Aggregation)>,
        S: Into<String>,
    {
        Self::from_subtrees(
            aggregations
                .into_iter()
                .map(|(name, aggregation)| category(name.into(), aggregation)),
        )
    }
}

fn category(name: String, aggregation: Aggregation) -> Subtree<FacetNode<Bucket>> {
    let values: Vec<_> = aggregation.buckets.into_iter().map(value).collect();
    let doc_count = values.iter().map(|value| value.data().doc_count()).sum();
    Subtree::new(FacetNode::new(name, doc_count)).with_children(values)
}

fn value(bucket: Bucket) -> Subtree<FacetNode<Bucket>> {
    let doc_count = bucket.effective_doc_count();
    Subtree::new(FacetNode::new(bucket.key.clone(), doc_count).with_payload(bucket))
}
