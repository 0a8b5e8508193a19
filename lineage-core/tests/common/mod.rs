//! Shared fixtures for the lineage core integration tests.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use lineage_core::{ClusterAssignment, PointSet};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// Star centred on "0" at (0,0) with leaves (0,-1), (1,1) and (-1,1).
pub fn star() -> PointSet {
    PointSet::try_from_rows(vec![
        vec![0.0, 0.0],
        vec![0.0, -1.0],
        vec![1.0, 1.0],
        vec![-1.0, 1.0],
    ])
    .and_then(|points| points.with_row_names((0..4).map(|index| index.to_string()).collect()))
    .expect("star fixture is valid")
}

/// Three loose 2-D blobs of eight points each, labelled "a", "b", "c".
pub fn blobs() -> (PointSet, ClusterAssignment) {
    let offsets = [
        (0.0, 0.0),
        (1.0, 0.3),
        (0.2, 1.1),
        (1.3, 1.0),
        (0.6, -0.4),
        (-0.5, 0.5),
        (0.9, 0.6),
        (0.1, -0.8),
    ];
    let centres = [("a", 0.0, 0.0), ("b", 8.0, 1.0), ("c", 3.0, 9.0)];
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (label, x, y) in centres {
        for (dx, dy) in offsets {
            rows.push(vec![x + dx, y + dy]);
            labels.push(label.to_owned());
        }
    }
    let points = PointSet::try_from_rows(rows).expect("blob fixture is valid");
    (points, ClusterAssignment::Hard(labels))
}

/// Closed span snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    pub name: String,
    pub fields: HashMap<String, String>,
}

/// Emitted event snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub level: Level,
    pub fields: HashMap<String, String>,
}

/// Layer capturing spans and events for assertions.
#[derive(Clone, Default)]
pub struct RecordingLayer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    events: Arc<Mutex<Vec<EventRecord>>>,
}

impl RecordingLayer {
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().expect("lock poisoned").clone()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Returns the messages of all events at `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .filter_map(|event| event.fields.get("message").cloned())
            .collect()
    }
}

impl<S> Layer<S> for RecordingLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            let mut record = SpanRecord {
                name: attrs.metadata().name().to_owned(),
                fields: HashMap::new(),
            };
            attrs.record(&mut FieldRecorder {
                fields: &mut record.fields,
            });
            span.extensions_mut().insert(record);
        }
    }

    fn on_close(&self, id: tracing::span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let Some(record) = span.extensions_mut().remove::<SpanRecord>() else {
            return;
        };
        self.spans.lock().expect("lock poisoned").push(record);
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldRecorder {
            fields: &mut fields,
        });
        self.events
            .lock()
            .expect("lock poisoned")
            .push(EventRecord {
                level: *event.metadata().level(),
                fields,
            });
    }
}

struct FieldRecorder<'a> {
    fields: &'a mut HashMap<String, String>,
}

impl Visit for FieldRecorder<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields
            .insert(field.name().to_owned(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .insert(field.name().to_owned(), value.to_owned());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_owned(), value.to_string());
    }
}
