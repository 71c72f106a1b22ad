//! Event capture for asserting on access logs in unit tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

#[derive(Debug, Clone, Default)]
pub struct CapturedEvent {
    pub message: String,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct CapturedEvents {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedEvents {
    pub fn count(&self, message: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.message == message)
            .count()
    }

    /// Field of the first event carrying `message`.
    pub fn field(&self, message: &str, field: &str) -> Option<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.message == message)
            .and_then(|e| e.fields.get(field).cloned())
    }

    /// Field recorded when the first span named `name` was opened.
    pub fn span_field(&self, name: &str, field: &str) -> Option<String> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.message == name)
            .and_then(|s| s.fields.get(field).cloned())
    }
}

struct CaptureLayer {
    events: CapturedEvents,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut captured = CapturedEvent::default();
        attrs.record(&mut captured);
        captured.message = attrs.metadata().name().to_string();
        self.events.spans.lock().unwrap().push(captured);
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut captured = CapturedEvent::default();
        event.record(&mut captured);
        self.events.events.lock().unwrap().push(captured);
    }
}

impl Visit for CapturedEvent {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_debug(field, &format_args!("{value}"));
    }
}

/// Route this thread's events into `events` until the guard drops.
pub fn capture_events(events: &CapturedEvents) -> DefaultGuard {
    let subscriber = tracing_subscriber::registry().with(CaptureLayer {
        events: events.clone(),
    });
    tracing::subscriber::set_default(subscriber)
}
