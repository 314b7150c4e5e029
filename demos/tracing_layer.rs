use std::sync::Arc;

use tracing::{error, info};
use tracing_mongo_sink::init::{init_tracing_with_config, LayerConfig};
use tracing_mongo_sink::{LogHandler, MongoHandler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let handler: Arc<dyn LogHandler> = Arc::new(MongoHandler::new("service_logs", "mongolog_demo")?);

    init_tracing_with_config(handler, LayerConfig::default())?;

    info!("tracing bridge started");

    // No message: stored with `msg` as a sub-document of these fields.
    info!(user_id = 42, action = "login", region = "eu-west");

    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out");
    error!(error = &err as &dyn std::error::Error, order_id = 123, "order failed");

    Ok(())
}
