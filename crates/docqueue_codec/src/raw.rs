//! Opaque text and binary documents.

use crate::error::{CodecError, CodecResult};
use crate::DocumentCodec;

/// Stores a `String` verbatim. Content must be valid UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl DocumentCodec for TextCodec {
    type Document = String;

    fn decode(&self, bytes: &[u8]) -> CodecResult<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::InvalidUtf8 {
            valid_up_to: e.utf8_error().valid_up_to(),
        })
    }

    fn encode(&self, document: &String) -> CodecResult<Vec<u8>> {
        Ok(document.as_bytes().to_vec())
    }

    fn empty(&self) -> Vec<u8> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

/// Stores bytes verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl DocumentCodec for BinaryCodec {
    type Document = Vec<u8>;

    fn decode(&self, bytes: &[u8]) -> CodecResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn encode(&self, document: &Vec<u8>) -> CodecResult<Vec<u8>> {
        Ok(document.clone())
    }

    fn empty(&self) -> Vec<u8> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "binary"
    }
}
