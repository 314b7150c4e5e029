use crate::error::HandlerError;
use crate::record::LogRecord;
use std::sync::Arc;

/// Destination for [`LogRecord`]s produced by a [`Logger`] or a
/// [`HandlerLayer`].
///
/// Implementations perform one side effect per record (for
/// [`MongoHandler`], a single insert) on the calling thread.
///
/// [`Logger`]: crate::logger::Logger
/// [`HandlerLayer`]: crate::layer::HandlerLayer
/// [`MongoHandler`]: crate::mongo::MongoHandler
pub trait LogHandler: Send + Sync {
    /// Persist or forward a single record.
    ///
    /// **Returns**
    /// - `Ok(())` once the backend accepted the record.
    /// - `Err(..)` on connection, serialization or insertion failure. The
    ///   handler does not retry; containing the error is up to the caller
    ///   ([`Logger::handle`](crate::logger::Logger::handle) reports it on
    ///   stderr).
    fn emit(&self, record: &LogRecord) -> Result<(), HandlerError>;

    /// Release backend resources. Records emitted afterwards fail with
    /// [`HandlerError::Closed`]. Default implementation is a no-op.
    fn close(&self) {}
}

impl<H: LogHandler + ?Sized> LogHandler for Arc<H> {
    fn emit(&self, record: &LogRecord) -> Result<(), HandlerError> {
        (**self).emit(record)
    }

    fn close(&self) {
        (**self).close()
    }
}

impl<H: LogHandler + ?Sized> LogHandler for Box<H> {
    fn emit(&self, record: &LogRecord) -> Result<(), HandlerError> {
        (**self).emit(record)
    }

    fn close(&self) {
        (**self).close()
    }
}
