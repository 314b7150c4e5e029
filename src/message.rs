use serde::Serialize;
use std::fmt;

/// Payload of a log call.
///
/// Text messages are stored as the fully formatted string. Structured
/// messages are stored with their shape intact, so a mapping becomes an
/// embedded document that can be queried by dotted path (`msg.address`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Structured(serde_json::Value),
}

impl Message {
    /// Build a structured message from any serializable value.
    pub fn structured<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Message::Structured)
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Message::Structured(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            Message::Structured(_) => None,
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Message::Text(String::new())
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<fmt::Arguments<'_>> for Message {
    fn from(args: fmt::Arguments<'_>) -> Self {
        Message::Text(args.to_string())
    }
}

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        Message::Structured(value)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.write_str(text),
            Message::Structured(value) => write!(f, "{}", value),
        }
    }
}
