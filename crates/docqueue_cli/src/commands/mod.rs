//! CLI command implementations.

pub mod get;
pub mod init;
pub mod put;
pub mod set;

use docqueue_core::{Config, DocumentCodec, DocumentStore, IoEvent, IoManager};
use serde_json::{Map, Value};
use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::Receiver;
use thiserror::Error;

/// Errors specific to the CLI.
#[derive(Debug, Error)]
pub enum CommandError {
    /// `--format` named no known format.
    #[error("unknown format '{0}' (expected json, text or binary)")]
    UnknownFormat(String),

    /// A dotted key was given for a non-JSON document.
    #[error("keys are only supported for json documents")]
    KeyRequiresJson,

    /// A dotted key crossed a value that is not an object.
    #[error("'{key}' is not an object")]
    NotAnObject {
        /// The prefix that resolved to a non-object.
        key: String,
    },

    /// A dotted key is empty or has an empty segment.
    #[error("invalid key '{0}'")]
    InvalidKey(String),

    /// The worker reported a failed write.
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// How the document file is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    /// Pretty-printed JSON.
    Json,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Binary,
}

impl FromStr for DocFormat {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "binary" => Ok(Self::Binary),
            _ => Err(CommandError::UnknownFormat(s.to_string())),
        }
    }
}

/// Opens a manager over `path` for a one-shot command.
pub fn open<C: DocumentCodec>(
    path: &Path,
    codec: C,
) -> Result<IoManager<C>, Box<dyn std::error::Error>> {
    Ok(IoManager::open_with_codec(path, codec, Config::default())?)
}

/// Waits until every queued write has run and reports the first failure.
///
/// A plain read is queued behind the writes, so once it returns they have
/// all executed.
pub fn flush<C, S>(
    io: &IoManager<C, S>,
    events: &Receiver<IoEvent>,
) -> Result<(), Box<dyn std::error::Error>>
where
    C: DocumentCodec,
    S: DocumentStore + 'static,
{
    io.read(None)?;
    if let Some(failure) = events.try_iter().find(IoEvent::is_failure) {
        let message = match failure.status {
            docqueue_core::EventStatus::Failed(message) => message,
            other => format!("{other:?}"),
        };
        return Err(CommandError::WriteFailed(message).into());
    }
    Ok(())
}

fn segments(key: &str) -> Result<Vec<&str>, CommandError> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(CommandError::InvalidKey(key.to_string()));
    }
    Ok(parts)
}

/// Looks up a dotted key. Numeric segments index into arrays.
pub fn lookup<'a>(document: &'a Value, key: &str) -> Result<Option<&'a Value>, CommandError> {
    let mut current = document;
    for part in segments(key)? {
        let next = match current {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Sets a dotted key, creating missing objects along the way.
pub fn assign(document: &mut Value, key: &str, value: Value) -> Result<(), CommandError> {
    let parts = segments(key)?;
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| CommandError::InvalidKey(key.to_string()))?;

    let mut current = document;
    for (depth, part) in parents.iter().enumerate() {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        let map = current.as_object_mut().ok_or_else(|| CommandError::NotAnObject {
            key: parts[..depth].join("."),
        })?;
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    let map = current.as_object_mut().ok_or_else(|| CommandError::NotAnObject {
        key: parents.join("."),
    })?;
    map.insert((*last).to_string(), value);
    Ok(())
}

/// Parses a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
