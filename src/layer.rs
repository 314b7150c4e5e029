use crate::exc::ExcInfo;
use crate::handler::LogHandler;
use crate::message::Message;
use crate::record::LogRecord;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

thread_local! {
    static EMITTING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as emitting until dropped, unwinding included.
struct EmittingGuard;

impl EmittingGuard {
    fn enter() -> Self {
        EMITTING.with(|flag| flag.set(true));
        EmittingGuard
    }
}

impl Drop for EmittingGuard {
    fn drop(&mut self) {
        EMITTING.with(|flag| flag.set(false));
    }
}

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`LogHandler`] on the thread that produced the event.
///
/// Events below `level` are ignored. An event with a `message` becomes a
/// text record; an event with fields but no message becomes a structured
/// record whose message is the object of those fields. A field recorded as
/// `&dyn Error` is attached as exception context.
///
/// Events raised by the handler itself while it is emitting are dropped.
pub struct HandlerLayer {
    handler: Arc<dyn LogHandler>,
    level: LevelFilter,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Records accepted by the handler.
    pub emitted_events: Arc<AtomicU64>,
    /// Records the handler failed to store.
    pub failed_events: Arc<AtomicU64>,
}

impl HandlerLayer {
    pub fn new(handler: Arc<dyn LogHandler>, level: impl Into<LevelFilter>) -> Self {
        HandlerLayer {
            handler,
            level: level.into(),
            total_events: Arc::new(AtomicU64::new(0)),
            emitted_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Close the wrapped handler; later events count as failures.
    pub fn close(&self) {
        self.handler.close();
    }

    fn dispatch(&self, record: &LogRecord) {
        let result = {
            let _guard = EmittingGuard::enter();
            panic::catch_unwind(AssertUnwindSafe(|| self.handler.emit(record)))
        };

        match result {
            Ok(Ok(())) => {
                self.emitted_events.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log handler failed, dropping record from {}: {}", record.name, e);
            }
            Err(_) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log handler panicked, dropping record from {}", record.name);
            }
        }
    }
}

impl<S> Layer<S> for HandlerLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.level || EMITTING.with(Cell::get) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let (msg, fields) = match visitor.message {
            Some(text) => (Message::Text(text), visitor.fields),
            None if !visitor.fields.is_empty() => {
                let object = visitor.fields.into_iter().collect::<serde_json::Map<_, _>>();
                (Message::Structured(serde_json::Value::Object(object)), BTreeMap::new())
            }
            None => (Message::default(), visitor.fields),
        };

        let mut record = LogRecord::new(meta.target(), *meta.level(), msg)
            .with_location(meta.module_path(), meta.file(), meta.line())
            .with_fields(fields);
        if let Some(exc_info) = visitor.exc_info {
            record = record.with_exc_info(exc_info);
        }

        self.dispatch(&record);
    }
}

#[derive(Default)]
pub struct FieldVisitor {
    pub fields: BTreeMap<String, serde_json::Value>,
    pub message: Option<String>,
    pub exc_info: Option<ExcInfo>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: serde_json::Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if self.exc_info.is_none() {
            self.exc_info = Some(ExcInfo::from_dyn(value));
        }
        self.insert(field, serde_json::Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `tracing` macros record the formatted message through this path.
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
