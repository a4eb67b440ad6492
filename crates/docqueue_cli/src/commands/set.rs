//! Set command implementation.

use super::{assign, flush, open, parse_value, CommandError, DocFormat};
use docqueue_codec::JsonCodec;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Runs the set command.
///
/// The read, the change and the write form one transaction, so concurrent
/// writers to other keys are not lost.
pub fn run(
    path: &Path,
    format: DocFormat,
    key: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if format != DocFormat::Json {
        return Err(CommandError::KeyRequiresJson.into());
    }

    let io = open(path, JsonCodec::<Value>::new())?;
    let events = io.subscribe();
    let value = parse_value(value);

    io.update(|document| {
        let mut changed = document.clone();
        assign(&mut changed, key, value)?;
        *document = changed;
        Ok::<(), CommandError>(())
    })??;
    flush(&io, &events)?;

    info!(path = %path.display(), key, "key updated");
    Ok(())
}
