//! Put command implementation.

use super::{flush, open, parse_value, DocFormat};
use docqueue_codec::{BinaryCodec, JsonCodec, TextCodec};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Runs the put command.
///
/// In json mode `value` is parsed as JSON (or stored as a JSON string if it
/// does not parse); otherwise it is written verbatim.
pub fn run(path: &Path, format: DocFormat, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        DocFormat::Json => {
            let io = open(path, JsonCodec::<Value>::new())?;
            let events = io.subscribe();
            io.write(parse_value(value), None);
            flush(&io, &events)?;
        }
        DocFormat::Text => {
            let io = open(path, TextCodec)?;
            let events = io.subscribe();
            io.write(value.to_string(), None);
            flush(&io, &events)?;
        }
        DocFormat::Binary => {
            let io = open(path, BinaryCodec)?;
            let events = io.subscribe();
            io.write(value.as_bytes().to_vec(), None);
            flush(&io, &events)?;
        }
    }
    info!(path = %path.display(), "document replaced");
    Ok(())
}
