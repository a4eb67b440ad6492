//! Get command implementation.

use super::{lookup, open, CommandError, DocFormat};
use docqueue_codec::{BinaryCodec, JsonCodec, TextCodec};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

/// Runs the get command.
pub fn run(
    path: &Path,
    format: DocFormat,
    key: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if key.is_some() && format != DocFormat::Json {
        return Err(CommandError::KeyRequiresJson.into());
    }

    match format {
        DocFormat::Json => {
            let io = open(path, JsonCodec::<Value>::new())?;
            let document = io.read(None)?;
            let selected = match key {
                Some(key) => lookup(&document, key)?
                    .ok_or_else(|| format!("Key '{}' not found", key))?,
                None => &document,
            };
            println!("{}", serde_json::to_string_pretty(selected)?);
        }
        DocFormat::Text => {
            let io = open(path, TextCodec)?;
            print!("{}", io.read(None)?);
        }
        DocFormat::Binary => {
            let io = open(path, BinaryCodec)?;
            let bytes = io.read(None)?;
            std::io::stdout().write_all(&bytes)?;
        }
    }
    Ok(())
}
