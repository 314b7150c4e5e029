use mongodb::error::ErrorKind;

/// Invalid handler configuration, detected before any record is accepted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("collection name is missing or empty")]
    MissingCollectionName,

    #[error("database name is missing or empty")]
    MissingDatabaseName,

    #[error("invalid collection name {0:?}")]
    InvalidCollectionName(String),

    #[error("invalid database name {0:?}")]
    InvalidDatabaseName(String),

    #[error("unknown or unsupported connection URI scheme in {0:?}")]
    UnknownScheme(String),

    #[error("connection host is missing or empty")]
    MissingHost,

    #[error("invalid connection URI: {0}")]
    InvalidUri(String),
}

/// Error returned by [`LogHandler::emit`](crate::handler::LogHandler::emit)
/// and by handler construction.
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Connection(#[source] mongodb::error::Error),

    #[error("insert failed: {0}")]
    Insert(#[source] mongodb::error::Error),

    #[error("record cannot be stored as a document: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),

    #[error("handler is closed")]
    Closed,

    #[error("database call panicked")]
    InsertPanicked,
}

impl HandlerError {
    /// Classify a driver error as a connection problem or an insert failure.
    pub(crate) fn from_driver(err: mongodb::error::Error) -> Self {
        match *err.kind {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. } => HandlerError::Connection(err),
            _ => HandlerError::Insert(err),
        }
    }

    /// Classify a driver error raised while building the client. Anything
    /// other than a network failure means the target itself is unusable.
    pub(crate) fn from_client_setup(uri: &str, err: mongodb::error::Error) -> Self {
        match *err.kind {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
                HandlerError::Connection(err)
            }
            _ => HandlerError::Config(ConfigError::InvalidUri(format!("{:?}: {}", uri, err))),
        }
    }
}

/// Error returned when installing the global `tracing` subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("global tracing subscriber already set: {0}")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}
