//! Pretty-printed JSON documents.

use crate::error::{CodecError, CodecResult};
use crate::DocumentCodec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fmt;
use std::marker::PhantomData;

const INDENT: &[u8] = b"    ";

/// JSON codec for any serde type, `serde_json::Value` by default.
///
/// New documents start as an empty object (`{}`). Output uses a 4-space
/// indent so the file stays readable and diffable by hand.
pub struct JsonCodec<T = serde_json::Value> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Creates a JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> DocumentCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Document = T;

    fn decode(&self, bytes: &[u8]) -> CodecResult<T> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
    }

    fn encode(&self, document: &T) -> CodecResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
        document
            .serialize(&mut serializer)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        Ok(out)
    }

    fn empty(&self) -> Vec<u8> {
        b"{}".to_vec()
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[test]
    fn empty_document_decodes_to_empty_object() {
        let codec = JsonCodec::<Value>::new();
        let doc = codec.decode(&codec.empty()).unwrap();
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn encode_is_pretty_with_four_spaces() {
        let codec = JsonCodec::<Value>::new();
        let bytes = codec.encode(&json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\n    \"a\": 1\n}");
    }

    #[test]
    fn malformed_input_is_decoding_error() {
        let codec = JsonCodec::<Value>::new();
        let result = codec.decode(b"{\"a\": ");
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize, Default)]
    struct LoginDetails {
        token: Option<String>,
        bot_user: bool,
    }

    #[test]
    fn typed_documents() {
        let codec = JsonCodec::<LoginDetails>::new();
        let details = LoginDetails {
            token: Some("abc".into()),
            bot_user: true,
        };

        let bytes = codec.encode(&details).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), details);
    }

    #[test]
    fn typed_decode_rejects_wrong_shape() {
        let codec = JsonCodec::<LoginDetails>::new();
        let result = codec.decode(b"[1, 2, 3]");
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }
}
