//! Init command implementation.

use super::DocFormat;
use docqueue_codec::{BinaryCodec, DocumentCodec, JsonCodec, TextCodec};
use docqueue_storage::{DocumentStore, FileStore};
use std::path::Path;

/// Runs the init command.
///
/// Creates the file with the format's empty document; an existing file is
/// left untouched.
pub fn run(path: &Path, format: DocFormat) -> Result<(), Box<dyn std::error::Error>> {
    let empty = match format {
        DocFormat::Json => JsonCodec::<serde_json::Value>::new().empty(),
        DocFormat::Text => TextCodec.empty(),
        DocFormat::Binary => BinaryCodec.empty(),
    };

    let store = FileStore::new(path);
    if store.initialize(&empty)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists", path.display());
    }
    Ok(())
}
