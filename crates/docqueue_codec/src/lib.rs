//! # docqueue Codec
//!
//! Translation between stored bytes and typed documents.
//!
//! A [`DocumentCodec`] is chosen once per manager and decides how the whole
//! backing file is interpreted:
//!
//! - [`JsonCodec`] - A structured document, parsed and re-serialized whole on
//!   every access and written pretty-printed (4-space indent). The default.
//! - [`TextCodec`] - Opaque UTF-8 text, no structural parsing
//! - [`BinaryCodec`] - Opaque bytes
//!
//! ## Usage
//!
//! ```
//! use docqueue_codec::{DocumentCodec, JsonCodec};
//! use serde_json::json;
//!
//! let codec = JsonCodec::<serde_json::Value>::new();
//! let bytes = codec.encode(&json!({"a": 1})).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), json!({"a": 1}));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;
mod raw;

pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;
pub use raw::{BinaryCodec, TextCodec};

/// Decides how a document is represented on disk.
///
/// Implementations are stateless or cheaply shareable; the manager's worker
/// thread calls them for every operation.
pub trait DocumentCodec: Send + Sync + 'static {
    /// The in-memory form handed to and returned from callers.
    type Document: Send + 'static;

    /// Parses the full stored content.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid document.
    fn decode(&self, bytes: &[u8]) -> CodecResult<Self::Document>;

    /// Serializes a document to the bytes that replace the stored content.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be represented.
    fn encode(&self, document: &Self::Document) -> CodecResult<Vec<u8>>;

    /// Content of a freshly created document file.
    fn empty(&self) -> Vec<u8>;

    /// Short name used in logs and CLI output.
    fn name(&self) -> &'static str;
}
