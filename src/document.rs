use crate::message::Message;
use crate::record::LogRecord;
use mongodb::bson::{self, Document};
use serde::Serialize;
use std::collections::BTreeMap;

/// Layout of a stored log document.
///
/// Key order is part of the layout: `levelname` and `msg` come first so the
/// documents read well in a shell. Unknown metadata is omitted rather than
/// stored as null, and `exc_info` exists only when an error was attached.
#[derive(Serialize)]
struct StoredDocument<'a> {
    levelname: &'static str,
    levelno: i32,
    name: &'a str,
    msg: &'a Message,
    created: bson::DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pathname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lineno: Option<i64>,
    process: i64,
    thread: &'a str,
    #[serde(rename = "threadName", skip_serializing_if = "Option::is_none")]
    thread_name: Option<&'a str>,
    #[serde(skip_serializing_if = "no_fields")]
    fields: &'a BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exc_info: Option<String>,
}

fn no_fields(fields: &&BTreeMap<String, serde_json::Value>) -> bool {
    fields.is_empty()
}

/// Map a [`LogRecord`] into the BSON document that gets inserted.
///
/// Structured messages keep their shape: objects become embedded documents,
/// arrays stay arrays. Fails when a value has no BSON representation, e.g.
/// an unsigned integer above `i64::MAX`.
pub fn to_document(record: &LogRecord) -> Result<Document, bson::ser::Error> {
    let stored = StoredDocument {
        levelname: record.levelname(),
        levelno: record.levelno(),
        name: &record.name,
        msg: &record.msg,
        created: bson::DateTime::from_millis(record.created.timestamp_millis()),
        module: record.module_path.as_deref(),
        pathname: record.file.as_deref(),
        lineno: record.line.map(i64::from),
        process: i64::from(record.process),
        thread: &record.thread,
        thread_name: record.thread_name.as_deref(),
        fields: &record.fields,
        exc_info: record.exc_info.as_ref().map(|exc| exc.format_traceback()),
    };
    bson::to_document(&stored)
}
