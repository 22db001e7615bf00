//! Compression codec for request snapshots.
//!
//! Snapshots are stored as JSON, compressed with zstd and base64 encoded so
//! the payload fits in a text column.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use zstd::stream::{decode_all, encode_all};

use crate::errors::AppError;

/// Default zstd compression level.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Turns structured values into compact strings and back.
///
/// `decompress(compress(x))` must equal `x` for every JSON value.
pub trait Codec: Send + Sync {
    fn compress(&self, value: &Value) -> Result<String, AppError>;

    fn decompress(&self, payload: &str) -> Result<Value, AppError>;
}

/// zstd + base64 codec.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl Codec for ZstdCodec {
    fn compress(&self, value: &Value) -> Result<String, AppError> {
        let json = serde_json::to_vec(value)?;
        let compressed = encode_all(&json[..], self.level)?;

        tracing::trace!(
            "Compressed payload: uncompressed={} bytes, compressed={} bytes",
            json.len(),
            compressed.len()
        );

        Ok(STANDARD.encode(compressed))
    }

    fn decompress(&self, payload: &str) -> Result<Value, AppError> {
        let compressed = STANDARD.decode(payload)?;
        let json = decode_all(&compressed[..])?;
        Ok(serde_json::from_slice(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_nested_value() {
        let codec = ZstdCodec::default();
        let value = json!({
            "_id": "req_1",
            "url": "https://example.com/users?page=2",
            "headers": [{ "name": "Accept", "value": "application/json" }],
            "body": { "mimeType": "application/json", "text": "{\"a\":1}" },
            "metaSortKey": -1_234.5,
            "isPrivate": false,
            "missing": null,
            "unicode": "héllo ✓"
        });

        let payload = codec.compress(&value).unwrap();
        assert_eq!(codec.decompress(&payload).unwrap(), value);
    }

    #[test]
    fn test_round_trip_scalars_and_empty_containers() {
        let codec = ZstdCodec::new(19);
        for value in [json!(null), json!(0), json!(""), json!([]), json!({})] {
            let payload = codec.compress(&value).unwrap();
            assert_eq!(codec.decompress(&payload).unwrap(), value);
        }
    }

    #[test]
    fn test_payload_is_text() {
        let codec = ZstdCodec::default();
        let payload = codec.compress(&json!({ "url": "http://x" })).unwrap();
        assert!(payload.is_ascii());
        assert!(!payload.contains('{'));
    }

    #[test]
    fn test_corrupt_payload_is_error() {
        let codec = ZstdCodec::default();

        let not_base64 = codec.decompress("%%%not-base64%%%").unwrap_err();
        assert!(matches!(not_base64, AppError::Codec(_)));

        let not_zstd = codec.decompress(&STANDARD.encode(b"plain bytes")).unwrap_err();
        assert!(matches!(not_zstd, AppError::Codec(_)));

        let not_json = encode_all(&b"{ broken"[..], 3).unwrap();
        let err = codec.decompress(&STANDARD.encode(not_json)).unwrap_err();
        assert!(matches!(err, AppError::Codec(_)));
    }
}
