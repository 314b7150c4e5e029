use std::sync::Arc;

use serde_json::json;
use tracing::Level;
use tracing_mongo_sink::{Logger, MongoHandler, MongoHandlerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Point this at your MongoDB instance, e.g. via `MONGO_URI`.
    let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let config = MongoHandlerConfig::new("log", "mongolog_demo").with_uri(uri);
    let handler = Arc::new(MongoHandler::connect(config)?);

    let log = Logger::new("orders").with_level(Level::DEBUG).with_handler(handler);

    log.info("service started");
    log.info(json!({"address": "340 N 12th St", "state": "PA", "country": "US"}));

    if let Err(e) = "12x".parse::<u32>() {
        log.exception("could not parse quantity", &e);
    }

    // Query with: db.log.find({"msg.state": "PA"})
    log.close();
    Ok(())
}
