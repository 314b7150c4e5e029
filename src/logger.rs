use crate::error::HandlerError;
use crate::exc::ExcInfo;
use crate::handler::LogHandler;
use crate::message::Message;
use crate::record::LogRecord;
use std::error::Error;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::Level;

struct Registration {
    handler: Arc<dyn LogHandler>,
    level: LevelFilter,
}

/// A named logger with an explicit set of handlers.
///
/// There is no process-wide registry: each logger owns its threshold and
/// the handlers registered on it. Records pass the logger threshold first
/// and then each handler's own threshold.
///
/// Errors returned by handlers are contained: [`Logger::handle`] reports
/// them on stderr and carries on with the remaining handlers, so a failing
/// backend never breaks the logging call site. Use [`Logger::try_handle`]
/// to receive the error instead.
pub struct Logger {
    name: String,
    level: LevelFilter,
    handlers: Vec<Registration>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Logger {
            name: name.into(),
            level: LevelFilter::INFO,
            handlers: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: impl Into<LevelFilter>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn LogHandler>) -> Self {
        self.add_handler(handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn set_level(&mut self, level: impl Into<LevelFilter>) {
        self.level = level.into();
    }

    /// Register a handler that accepts every record passing the logger
    /// threshold.
    pub fn add_handler(&mut self, handler: Arc<dyn LogHandler>) {
        self.add_handler_with_level(handler, LevelFilter::TRACE);
    }

    pub fn add_handler_with_level(&mut self, handler: Arc<dyn LogHandler>, level: impl Into<LevelFilter>) {
        self.handlers.push(Registration {
            handler,
            level: level.into(),
        });
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn log(&self, level: Level, msg: impl Into<Message>) {
        if self.is_enabled_for(level) {
            self.handle(&LogRecord::new(self.name.as_str(), level, msg));
        }
    }

    /// Log with the exception context of `err` attached.
    pub fn log_with_exc<E: Error + 'static>(&self, level: Level, msg: impl Into<Message>, err: &E) {
        if self.is_enabled_for(level) {
            let record = LogRecord::new(self.name.as_str(), level, msg).with_exc_info(ExcInfo::capture(err));
            self.handle(&record);
        }
    }

    /// `ERROR` record carrying the exception context of `err`.
    pub fn exception<E: Error + 'static>(&self, msg: impl Into<Message>, err: &E) {
        self.log_with_exc(Level::ERROR, msg, err);
    }

    pub fn trace(&self, msg: impl Into<Message>) {
        self.log(Level::TRACE, msg);
    }

    pub fn debug(&self, msg: impl Into<Message>) {
        self.log(Level::DEBUG, msg);
    }

    pub fn info(&self, msg: impl Into<Message>) {
        self.log(Level::INFO, msg);
    }

    pub fn warn(&self, msg: impl Into<Message>) {
        self.log(Level::WARN, msg);
    }

    pub fn error(&self, msg: impl Into<Message>) {
        self.log(Level::ERROR, msg);
    }

    /// Dispatch a prepared record to every handler whose threshold admits
    /// it. Handler errors are reported on stderr, never returned.
    pub fn handle(&self, record: &LogRecord) {
        for registration in self.admitting(record) {
            if let Err(e) = registration.handler.emit(record) {
                self.report(record, &e);
            }
        }
    }

    /// Like [`Logger::handle`] but stops at and returns the first handler
    /// error.
    pub fn try_handle(&self, record: &LogRecord) -> Result<(), HandlerError> {
        for registration in self.admitting(record) {
            registration.handler.emit(record)?;
        }
        Ok(())
    }

    /// Close every registered handler.
    pub fn close(&self) {
        for registration in &self.handlers {
            registration.handler.close();
        }
    }

    fn admitting<'a>(&'a self, record: &'a LogRecord) -> impl Iterator<Item = &'a Registration> + 'a {
        self.handlers
            .iter()
            .filter(move |registration| record.level <= registration.level)
    }

    fn report(&self, record: &LogRecord, err: &HandlerError) {
        eprintln!(
            "--- Logging error ---\n{}\nlogger: {}, level: {}, message: {}",
            err, self.name, record.level, record.msg
        );
    }
}
