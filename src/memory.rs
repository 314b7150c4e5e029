use crate::document::to_document;
use crate::error::HandlerError;
use crate::handler::LogHandler;
use crate::record::LogRecord;
use mongodb::bson::{Bson, Document};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// A handler that keeps the documents it would have inserted in memory.
///
/// Documents are built with the same mapping as
/// [`MongoHandler`](crate::mongo::MongoHandler), so tests can assert on the
/// stored layout and run equality queries on dotted paths without a
/// database.
#[derive(Default)]
pub struct MemoryHandler {
    documents: Mutex<Vec<Document>>,
    closed: AtomicBool,
}

impl MemoryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Documents whose fields equal every value in `filter`. Keys may be
    /// dotted paths into embedded documents (`msg.address`) or arrays
    /// (`msg.0`).
    pub fn find(&self, filter: &Document) -> Vec<Document> {
        self.lock()
            .iter()
            .filter(|doc| matches(doc, filter))
            .cloned()
            .collect()
    }

    pub fn find_one(&self, filter: &Document) -> Option<Document> {
        self.lock().iter().find(|doc| matches(doc, filter)).cloned()
    }

    pub fn count(&self, filter: &Document) -> usize {
        self.lock().iter().filter(|doc| matches(doc, filter)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Document>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogHandler for MemoryHandler {
    fn emit(&self, record: &LogRecord) -> Result<(), HandlerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HandlerError::Closed);
        }
        let doc = to_document(record)?;
        self.lock().push(doc);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(path, expected)| lookup(doc, path) == Some(expected))
}

fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
