//! Round-trip tests against a MongoDB server on `localhost:27017`.
//!
//! Run with `cargo test -- --ignored` while a server is available. Each
//! test works in its own database, dropped before and after the test.

use std::sync::Arc;

use mongodb::bson::{doc, Document};
use mongodb::sync::{Client, Collection};
use serde_json::json;
use tracing::Level;
use tracing_mongo_sink::{ConfigError, HandlerError, LogHandler, LogRecord, Logger, MongoHandler};

const COLLECTION: &str = "log";

struct TestDb {
    client: Client,
    name: String,
}

impl TestDb {
    fn new(suffix: &str) -> Self {
        let client = Client::with_uri_str("mongodb://localhost:27017").unwrap();
        let db = TestDb {
            client,
            name: format!("_mongolog_test_{}", suffix),
        };
        db.drop_database();
        db
    }

    fn collection(&self) -> Collection<Document> {
        self.client.database(&self.name).collection(COLLECTION)
    }

    fn logger(&self, name: &str) -> Logger {
        let handler = MongoHandler::new(COLLECTION, self.name.as_str()).unwrap();
        Logger::new(name)
            .with_level(Level::DEBUG)
            .with_handler(Arc::new(handler))
    }

    fn drop_database(&self) {
        self.client.database(&self.name).drop().run().unwrap();
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = self.client.database(&self.name).drop().run();
    }
}

#[test]
#[ignore = "requires a running MongoDB on localhost:27017"]
fn test_logging() {
    let db = TestDb::new("logging");
    let log = db.logger("log");

    log.debug("test");

    let stored = db
        .collection()
        .find_one(doc! {"levelname": "DEBUG", "msg": "test"})
        .run()
        .unwrap()
        .unwrap();
    assert_eq!(stored.get_str("msg").unwrap(), "test");
}

#[test]
#[ignore = "requires a running MongoDB on localhost:27017"]
fn test_logging_exception() {
    let db = TestDb::new("exception");
    let log = db.logger("exception");

    match "1/0".parse::<i32>() {
        Ok(_) => unreachable!(),
        Err(e) => log.exception("test zero division", &e),
    }
    log.error("no exception");

    let collection = db.collection();
    let with_exc = collection
        .find_one(doc! {"levelname": "ERROR", "msg": "test zero division"})
        .run()
        .unwrap()
        .unwrap();
    assert!(with_exc.get_str("exc_info").unwrap().starts_with("Traceback"));

    let without_exc = collection
        .find_one(doc! {"msg": "no exception"})
        .run()
        .unwrap()
        .unwrap();
    assert!(!without_exc.contains_key("exc_info"));
}

#[test]
#[ignore = "requires a running MongoDB on localhost:27017"]
fn test_queryable_messages() {
    let db = TestDb::new("query");
    let log = db.logger("query");

    log.info(json!({"address": "340 N 12th St", "state": "PA", "country": "US"}));
    log.info(json!({"address": "340 S 12th St", "state": "PA", "country": "US"}));
    log.info(json!({"address": "1234 Market St", "state": "PA", "country": "US"}));

    let collection = db.collection();
    let query = doc! {"levelname": "INFO", "msg.address": "340 N 12th St"};
    let count = collection.count_documents(query.clone()).run().unwrap();
    assert_eq!(count, 1, "Expected query to return 1 message; it returned {}", count);

    let first = collection.find_one(query).run().unwrap().unwrap();
    assert_eq!(
        first.get_document("msg").unwrap().get_str("address").unwrap(),
        "340 N 12th St"
    );

    let count = collection
        .count_documents(doc! {"levelname": "INFO", "msg.state": "PA"})
        .run()
        .unwrap();
    assert_eq!(count, 3, "Didn't find all three documents");
}

#[test]
#[ignore = "requires a running MongoDB on localhost:27017"]
fn test_each_call_inserts_one_document() {
    let db = TestDb::new("repeat");
    let log = db.logger("repeat");
    let collection = db.collection();

    for expected in 1..=3u64 {
        log.info("same message");
        assert_eq!(collection.count_documents(doc! {}).run().unwrap(), expected);
    }
}

#[test]
#[ignore = "requires a running MongoDB on localhost:27017"]
fn test_emit_from_async_context() {
    let db = TestDb::new("async");
    let handler = Arc::new(MongoHandler::new(COLLECTION, db.name.as_str()).unwrap());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let emitted = runtime.block_on({
        let handler = handler.clone();
        async move { handler.emit(&LogRecord::new("async", Level::WARN, "from a task")) }
    });

    assert!(emitted.is_ok());
    assert_eq!(db.collection().count_documents(doc! {"levelname": "WARN"}).run().unwrap(), 1);
}

#[test]
fn test_unreachable_server_surfaces_error() {
    let handler = MongoHandler::connect(
        tracing_mongo_sink::MongoHandlerConfig::new(COLLECTION, "_mongolog_unreachable")
            .with_uri("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200"),
    )
    .unwrap();

    let result = handler.emit(&LogRecord::new("log", Level::ERROR, "nobody listens"));
    assert!(matches!(result, Err(HandlerError::Connection(_))));
}

#[test]
fn test_construction_requires_names() {
    assert!(matches!(
        MongoHandler::new("", "_mongolog_test"),
        Err(HandlerError::Config(ConfigError::MissingCollectionName))
    ));
    assert!(matches!(
        MongoHandler::new(COLLECTION, ""),
        Err(HandlerError::Config(ConfigError::MissingDatabaseName))
    ));
}
