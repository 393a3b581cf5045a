#![forbid(unsafe_code)]

//! Tracing instrumentation tests.
//!
//! Verifies the span structure the renderer emits: a `sprig.work_loop` span
//! per slice, a `sprig.commit` span nested in the slice that commits, and
//! the recorded effect counts.
//!
//!   cargo test -p sprig-runtime --test tracing_tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sprig_core::{Component, Element, Event, EventHandler, Props};
use sprig_headless::{HostOpKind, MemoryHost, UnitBudget};
use sprig_runtime::Renderer;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// A captured span with its fields (including ones recorded later).
#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

/// A captured event.
#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
}

#[derive(Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    by_id: HashMap<tracing::span::Id, usize>,
    events: Vec<CapturedEvent>,
}

struct SpanCapture {
    inner: Arc<Mutex<Captured>>,
}

struct CaptureHandle {
    inner: Arc<Mutex<Captured>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.inner.lock().unwrap().spans.clone()
    }

    fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
        self.spans().into_iter().filter(|s| s.name == name).collect()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.inner.lock().unwrap().events.clone()
    }
}

/// Visitor that extracts fields as strings.
struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);

        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        let mut captured = self.inner.lock().unwrap();
        let index = captured.spans.len();
        captured.spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
        captured.by_id.insert(id.clone(), index);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        values.record(&mut visitor);
        let mut captured = self.inner.lock().unwrap();
        if let Some(&index) = captured.by_id.get(id) {
            captured.spans[index].fields.extend(visitor.0);
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .into_iter()
            .find(|(name, _)| name == "message")
            .map(|(_, value)| value)
            .unwrap_or_default();
        self.inner.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            message,
        });
    }
}

/// Run `f` with a capturing subscriber installed.
fn with_captured_spans<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let inner = Arc::new(Mutex::new(Captured::default()));
    let layer = SpanCapture {
        inner: Arc::clone(&inner),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    CaptureHandle { inner }
}

fn sample_tree() -> Element {
    Element::host("div")
        .child(Element::host("h1").child("a"))
        .child(Element::host("h2"))
        .build()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn each_slice_gets_a_work_loop_span() {
    let handle = with_captured_spans(|| {
        let mut renderer = Renderer::new(MemoryHost::new());
        let root = renderer.host().root();
        renderer.render(sample_tree(), root);
        let _ = renderer.work_loop(&UnitBudget::new(2)).unwrap();
        let _ = renderer.work_loop(&UnitBudget::new(2)).unwrap();
        let _ = renderer.work_loop(&UnitBudget::new(2)).unwrap();
    });

    let slices = handle.spans_named("sprig.work_loop");
    assert_eq!(slices.len(), 3);
    let units: Vec<&str> = slices
        .iter()
        .map(|s| s.fields.get("units").map(String::as_str).unwrap_or(""))
        .collect();
    assert_eq!(units, vec!["2", "2", "1"]);
    assert_eq!(
        slices[2].fields.get("committed").map(String::as_str),
        Some("true")
    );
}

#[test]
fn commit_span_nests_in_work_loop_and_records_counts() {
    let handle = with_captured_spans(|| {
        let mut renderer = Renderer::new(MemoryHost::new());
        let root = renderer.host().root();
        renderer.render(sample_tree(), root);
        renderer.flush().unwrap();
    });

    let commits = handle.spans_named("sprig.commit");
    assert_eq!(commits.len(), 1);
    let commit = &commits[0];
    assert_eq!(commit.parent_name.as_deref(), Some("sprig.work_loop"));
    assert_eq!(commit.fields.get("placements").map(String::as_str), Some("4"));
    assert_eq!(commit.fields.get("updates").map(String::as_str), Some("0"));
    assert_eq!(commit.fields.get("deletions").map(String::as_str), Some("0"));
}

#[test]
fn render_pass_span_and_supersede_event() {
    let handle = with_captured_spans(|| {
        let mut renderer = Renderer::new(MemoryHost::new());
        let root = renderer.host().root();
        renderer.render(sample_tree(), root);
        let _ = renderer.work_loop(&Duration::ZERO).unwrap();
        renderer.render(sample_tree(), root);
    });

    assert_eq!(handle.spans_named("sprig.render_pass").len(), 2);
    assert!(
        handle
            .events()
            .iter()
            .any(|e| e.level == tracing::Level::DEBUG && e.message.contains("superseding"))
    );
}

#[test]
fn state_update_restart_is_logged() {
    let handle = with_captured_spans(|| {
        let button = Component::new("Button", |_, hooks| {
            let (count, set) = hooks.use_state(0_i64);
            Element::host("button")
                .on(
                    "onClick",
                    EventHandler::new(move |_| set.update(|c| c + 1)),
                )
                .child(count)
                .build()
        });
        let mut renderer = Renderer::new(MemoryHost::new());
        let root = renderer.host().root();
        renderer.render(button.element(Props::new()), root);
        renderer.flush().unwrap();

        let node = renderer.host().find_by_tag("button")[0];
        renderer.host().dispatch(node, &Event::new("click"));
        renderer.flush().unwrap();
    });

    assert!(
        handle
            .events()
            .iter()
            .any(|e| e.message.contains("restarting pass"))
    );
    assert_eq!(handle.spans_named("sprig.commit").len(), 2);
}

#[test]
fn aborted_pass_emits_warning() {
    let handle = with_captured_spans(|| {
        let mut renderer = Renderer::new(MemoryHost::new());
        renderer.host_mut().fail_on(HostOpKind::CreateNode);
        let root = renderer.host().root();
        renderer.render(sample_tree(), root);
        assert!(renderer.flush().is_err());
    });

    let warnings: Vec<_> = handle
        .events()
        .into_iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("aborted"));
}

#[test]
fn no_subscriber_is_required() {
    let mut renderer = Renderer::new(MemoryHost::new());
    let root = renderer.host().root();
    renderer.render(sample_tree(), root);
    assert!(renderer.flush().unwrap().is_some());
}
