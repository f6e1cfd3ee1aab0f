#![forbid(unsafe_code)]

//! Tracing integration tests for the facet merge.
//!
//! Merge spans and events enabled:
//!   cargo test -p facetree-facets --features tracing --test tracing_tests
//!
//! Zero-overhead verification (no feature):
//!   cargo test -p facetree-facets --test tracing_tests -- zero_overhead

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use facetree_facets::{FacetTree, MergeEngine, facet};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// A captured span or event with its fields.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct Captured {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

/// A tracing Layer that records spans and events.
struct Capture {
    spans: Arc<Mutex<Vec<Captured>>>,
    events: Arc<Mutex<Vec<Captured>>>,
}

/// Handle to read what was captured.
struct CaptureHandle {
    spans: Arc<Mutex<Vec<Captured>>>,
    events: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<Captured> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<Captured> {
        self.events.lock().unwrap().clone()
    }
}

/// Visitor that extracts fields.
struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.spans.lock().unwrap().push(Captured {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let parent_name = ctx
            .event_span(event)
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(Captured {
            name: event.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }
}

/// Set up a subscriber with capture and run a closure.
fn with_capture<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let spans = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = Capture {
        spans: spans.clone(),
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    CaptureHandle { spans, events }
}

fn status(values: &[(&str, u64)]) -> FacetTree<()> {
    let total = values.iter().map(|(_, count)| count).sum();
    let category = values
        .iter()
        .fold(facet("Status", total), |cat, &(name, count)| {
            cat.child(facet(name, count))
        });
    FacetTree::from_subtrees([category])
}

// ============================================================================
// Tests
// ============================================================================

#[test]
#[cfg(feature = "tracing")]
fn merge_opens_span_with_root_counts() {
    let handle = with_capture(|| {
        let _ = MergeEngine::default().merge(
            status(&[("new", 2), ("draft", 1)]),
            status(&[("new", 8), ("draft", 2), ("unread", 2)]),
        );
    });

    let spans = handle.spans();
    let merge_span = spans
        .iter()
        .find(|s| s.name == "facet_merge")
        .expect("facet_merge span");
    assert_eq!(merge_span.fields.get("existing_roots").map(String::as_str), Some("1"));
    assert_eq!(merge_span.fields.get("incoming_roots").map(String::as_str), Some("1"));
}

#[test]
#[cfg(feature = "tracing")]
fn merge_reports_summary_inside_span() {
    let handle = with_capture(|| {
        let mut shown = status(&[("new", 2), ("draft", 1), ("unread", 2)]);
        MergeEngine::default().merge_into(&mut shown, status(&[("new", 8), ("", 1)]));
    });

    let events = handle.events();
    let summary = events
        .iter()
        .find(|e| e.fields.get("message").is_some_and(|m| m.contains("facet merge complete")))
        .expect("merge summary event");
    assert_eq!(summary.parent_name.as_deref(), Some("facet_merge"));
    assert_eq!(summary.fields.get("updated").map(String::as_str), Some("1"));
    assert_eq!(summary.fields.get("retained").map(String::as_str), Some("2"));
    assert_eq!(summary.fields.get("skipped_blank").map(String::as_str), Some("1"));
}

#[test]
#[cfg(feature = "tracing")]
fn dropped_category_is_logged() {
    let handle = with_capture(|| {
        let incoming = FacetTree::from_subtrees([facet("Type", 1).child(facet("pdf", 1))]);
        let _ = MergeEngine::default().merge(status(&[("new", 2)]), incoming);
    });

    let events = handle.events();
    assert!(
        events
            .iter()
            .any(|e| e.fields.get("category").is_some_and(|c| c == "Type")),
        "expected a dropped-category event, got: {events:?}"
    );
}

#[test]
#[cfg(feature = "tracing")]
fn user_toggle_is_traced() {
    let handle = with_capture(|| {
        let mut tree = status(&[("new", 2)]);
        let new = tree.find_path(&["Status", "new"]).unwrap();
        tree.toggle(new).unwrap();
    });

    let events = handle.events();
    assert!(
        events
            .iter()
            .any(|e| e.fields.get("message").is_some_and(|m| m.contains("user set checked"))),
        "expected a toggle event, got: {events:?}"
    );
}

#[test]
#[cfg(not(feature = "tracing"))]
fn zero_overhead_no_spans_without_feature() {
    let handle = with_capture(|| {
        let merged = MergeEngine::default().merge(
            status(&[("new", 2)]),
            status(&[("new", 8)]),
        );
        assert_eq!(merged.doc_count(merged.roots()[0]), Some(8));
    });

    assert!(handle.spans().iter().all(|s| s.name != "facet_merge"));
    assert!(handle.events().is_empty());
}
