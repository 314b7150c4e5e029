use crate::config::MongoHandlerConfig;
use crate::document::to_document;
use crate::error::HandlerError;
use crate::handler::LogHandler;
use crate::record::LogRecord;
use mongodb::bson::Document;
use mongodb::sync::{Client, Collection};
use std::sync::{PoisonError, RwLock};

/// MongoDB implementation of [`LogHandler`].
///
/// Each record becomes one document, inserted with a single synchronous
/// `insert_one` into `database_name.collection_name`. The collection handle
/// is acquired once at construction and shared by every thread that emits
/// through this handler; the driver handle is `Send + Sync` and needs no
/// extra locking. No batching or retries happen here.
pub struct MongoHandler {
    config: MongoHandlerConfig,
    collection: RwLock<Option<Collection<Document>>>,
}

impl MongoHandler {
    /// Construct a handler against the driver's default local server.
    ///
    /// **Parameters**
    /// - `collection_name`: target collection.
    /// - `database_name`: target database.
    ///
    /// **Returns**
    /// - `Err(HandlerError::Config(..))` when either name is empty or
    ///   invalid; nothing is connected in that case.
    pub fn new(
        collection_name: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Result<Self, HandlerError> {
        Self::connect(MongoHandlerConfig::new(collection_name, database_name))
    }

    /// Validate `config`, create the driver client and resolve the target
    /// collection.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the
    /// first [`emit`](LogHandler::emit) as [`HandlerError::Connection`].
    pub fn connect(config: MongoHandlerConfig) -> Result<Self, HandlerError> {
        config.validate()?;

        let uri = config.target.uri();
        let client = off_runtime(|| {
            Client::with_uri_str(&uri).map_err(|e| HandlerError::from_client_setup(&uri, e))
        })?;
        let collection = client
            .database(&config.database_name)
            .collection::<Document>(&config.collection_name);

        tracing::debug!(
            database = %config.database_name,
            collection = %config.collection_name,
            "mongo log handler ready"
        );

        Ok(MongoHandler {
            config,
            collection: RwLock::new(Some(collection)),
        })
    }

    pub fn config(&self) -> &MongoHandlerConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.collection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn collection(&self) -> Result<Collection<Document>, HandlerError> {
        self.collection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(HandlerError::Closed)
    }
}

impl LogHandler for MongoHandler {
    fn emit(&self, record: &LogRecord) -> Result<(), HandlerError> {
        let collection = self.collection()?;
        let doc = to_document(record)?;

        off_runtime(|| {
            collection
                .insert_one(doc)
                .run()
                .map(|_| ())
                .map_err(HandlerError::from_driver)
        })
    }

    fn close(&self) {
        let released = self
            .collection
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(released);
    }
}

/// Run a blocking driver call on the current thread, or on a scoped helper
/// thread when the current thread is inside a Tokio runtime. The blocking
/// driver API enters its own runtime and must not be nested in another one.
/// The caller blocks until `f` finishes either way.
fn off_runtime<T, F>(f: F) -> Result<T, HandlerError>
where
    T: Send,
    F: FnOnce() -> Result<T, HandlerError> + Send,
{
    if tokio::runtime::Handle::try_current().is_err() {
        return f();
    }

    std::thread::scope(|scope| {
        scope
            .spawn(f)
            .join()
            .unwrap_or(Err(HandlerError::InsertPanicked))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_construction_rejects_empty_names() {
        assert!(matches!(
            MongoHandler::new("", "_mongolog_test"),
            Err(HandlerError::Config(ConfigError::MissingCollectionName))
        ));
        assert!(matches!(
            MongoHandler::new("log", ""),
            Err(HandlerError::Config(ConfigError::MissingDatabaseName))
        ));
    }

    #[test]
    fn test_construction_rejects_foreign_scheme() {
        let config = MongoHandlerConfig::new("log", "db").with_uri("clickhouse://127.0.0.1:8123");
        assert!(matches!(
            MongoHandler::connect(config),
            Err(HandlerError::Config(ConfigError::UnknownScheme(_)))
        ));
    }

    #[test]
    fn test_unparseable_uri_fails_as_configuration() {
        let config = MongoHandlerConfig::new("log", "db").with_uri("mongodb://");
        assert!(matches!(
            MongoHandler::connect(config),
            Err(HandlerError::Config(ConfigError::InvalidUri(_)))
        ));
    }

    #[test]
    fn test_host_port_targets() {
        let empty = MongoHandlerConfig::new("log", "db").with_host_port("", 27017);
        assert!(matches!(
            MongoHandler::connect(empty),
            Err(HandlerError::Config(ConfigError::MissingHost))
        ));

        let ipv6 = MongoHandlerConfig::new("log", "db").with_host_port("::1", 27017);
        assert!(MongoHandler::connect(ipv6).is_ok());
    }

    #[test]
    fn test_closed_handler_reports_closed_before_serializing() {
        let handler = MongoHandler::new("log", "_mongolog_test").unwrap();
        handler.close();

        let record = LogRecord::new("log", tracing::Level::INFO, serde_json::json!({"n": u64::MAX}));
        assert!(matches!(handler.emit(&record), Err(HandlerError::Closed)));
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_emit() {
        // Client creation is lazy, so no server is needed here.
        let handler = MongoHandler::new("log", "_mongolog_test").unwrap();
        assert!(!handler.is_closed());

        handler.close();
        handler.close();
        assert!(handler.is_closed());

        let record = LogRecord::new("log", tracing::Level::INFO, "after close");
        assert!(matches!(handler.emit(&record), Err(HandlerError::Closed)));
    }

    #[test]
    fn test_off_runtime_runs_inline_without_runtime() {
        let caller = std::thread::current().id();
        let ran_on = off_runtime(|| Ok(std::thread::current().id())).unwrap();
        assert_eq!(ran_on, caller);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_off_runtime_moves_to_helper_thread_inside_runtime() {
        let caller = std::thread::current().id();
        let ran_on = off_runtime(|| Ok(std::thread::current().id())).unwrap();
        assert_ne!(ran_on, caller);
    }
}
