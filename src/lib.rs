pub mod config;
pub mod document;
pub mod error;
pub mod exc;
pub mod handler;
pub mod message;
pub mod record;

pub mod layer;
pub mod logger;
pub mod memory;
pub mod mongo;

pub mod init;

pub use config::{ConnectionTarget, MongoHandlerConfig};
pub use error::{ConfigError, HandlerError, InitError};
pub use handler::LogHandler;
pub use logger::Logger;
pub use message::Message;
pub use mongo::MongoHandler;
pub use record::LogRecord;
