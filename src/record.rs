use crate::exc::ExcInfo;
use crate::message::Message;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::Level;

/// One log event as seen by a [`LogHandler`](crate::handler::LogHandler).
///
/// Records are plain owned data produced by the logging side ([`Logger`]
/// or [`HandlerLayer`]) and are never modified by handlers.
///
/// [`Logger`]: crate::logger::Logger
/// [`HandlerLayer`]: crate::layer::HandlerLayer
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub created: DateTime<Utc>,
    pub level: Level,
    /// Logger name, or the event target for `tracing` events.
    pub name: String,
    pub msg: Message,
    pub exc_info: Option<ExcInfo>,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub process: u32,
    pub thread: String,
    pub thread_name: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Create a record stamped with the current time, process and thread.
    pub fn new(name: impl Into<String>, level: Level, msg: impl Into<Message>) -> Self {
        let thread = std::thread::current();
        LogRecord {
            created: Utc::now(),
            level,
            name: name.into(),
            msg: msg.into(),
            exc_info: None,
            module_path: None,
            file: None,
            line: None,
            process: std::process::id(),
            thread: format!("{:?}", thread.id()),
            thread_name: thread.name().map(str::to_string),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_exc_info(mut self, exc_info: ExcInfo) -> Self {
        self.exc_info = Some(exc_info);
        self
    }

    pub fn with_location(
        mut self,
        module_path: Option<&str>,
        file: Option<&str>,
        line: Option<u32>,
    ) -> Self {
        self.module_path = module_path.map(str::to_string);
        self.file = file.map(str::to_string);
        self.line = line;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, serde_json::Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn levelname(&self) -> &'static str {
        self.level.as_str()
    }

    /// Numeric severity, spaced so that documents can be range-queried.
    pub fn levelno(&self) -> i32 {
        levelno(&self.level)
    }
}

pub fn levelno(level: &Level) -> i32 {
    match *level {
        Level::ERROR => 40,
        Level::WARN => 30,
        Level::INFO => 20,
        Level::DEBUG => 10,
        _ => 5,
    }
}
