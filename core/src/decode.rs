//! Response body decoding.
//!
//! Structured responses are JSON documents navigated by a fixed key path
//! (`["FileStatuses", "FileStatus"]` for a listing). A missing key is an
//! error; nothing is defaulted. An empty body decodes to an empty object.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Why a body could not be decoded. Converted to `WebHdfsError::Decode` by
/// the client, which knows the operation context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("missing key {key:?} at depth {depth}")]
    MissingKey { key: String, depth: usize },
    #[error("value at {path} has unexpected shape: {message}")]
    Shape { path: String, message: String },
}

/// Parse `body` and descend through `keys`.
pub fn decode_json(body: &[u8], keys: &[&str]) -> Result<Value, DecodeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    let mut value: Value =
        serde_json::from_slice(body).map_err(|e| DecodeError::Json(e.to_string()))?;
    for (depth, key) in keys.iter().enumerate() {
        value = match value {
            Value::Object(mut map) => map.remove(*key),
            _ => None,
        }
        .ok_or_else(|| DecodeError::MissingKey {
            key: key.to_string(),
            depth,
        })?;
    }
    Ok(value)
}

/// `decode_json` followed by deserialization into `T`.
pub fn decode_as<T: DeserializeOwned>(body: &[u8], keys: &[&str]) -> Result<T, DecodeError> {
    let value = decode_json(body, keys)?;
    serde_json::from_value(value).map_err(|e| DecodeError::Shape {
        path: keys.join("."),
        message: e.to_string(),
    })
}

/// Like `decode_as`, but an empty body yields `T::default()` instead of an
/// error: an empty listing, `false`, or `None` for a single record.
pub fn decode_or_default<T: DeserializeOwned + Default>(
    body: &[u8],
    keys: &[&str],
) -> Result<T, DecodeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    decode_as(body, keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descends_key_path() {
        let body = br#"{"FileStatuses":{"FileStatus":[{"pathSuffix":"a.txt","length":10}]}}"#;
        let value = decode_json(body, &["FileStatuses", "FileStatus"]).unwrap();
        assert_eq!(value, json!([{"pathSuffix": "a.txt", "length": 10}]));
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(decode_json(b"", &["boolean"]).unwrap(), json!({}));
        assert_eq!(decode_json(b" \n", &["FileStatus"]).unwrap(), json!({}));
    }

    #[test]
    fn missing_key_fails() {
        let err = decode_json(br#"{"FileStatuses":{}}"#, &["FileStatuses", "FileStatus"])
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingKey {
                key: "FileStatus".to_string(),
                depth: 1
            }
        );
    }

    #[test]
    fn descending_into_non_object_fails() {
        let err = decode_json(br#"{"boolean":true}"#, &["boolean", "inner"]).unwrap_err();
        assert!(matches!(err, DecodeError::MissingKey { depth: 1, .. }));
    }

    #[test]
    fn invalid_json_fails() {
        let err = decode_json(b"<html>", &["Path"]).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn typed_decode() {
        let flag: bool = decode_as(br#"{"boolean":true}"#, &["boolean"]).unwrap();
        assert!(flag);
        let err = decode_as::<bool>(br#"{"boolean":"yes"}"#, &["boolean"]).unwrap_err();
        assert!(matches!(err, DecodeError::Shape { .. }));
    }

    #[test]
    fn empty_body_defaults_for_sequences_and_flags() {
        let entries: Vec<serde_json::Value> =
            decode_or_default(b"", &["FileStatuses", "FileStatus"]).unwrap();
        assert!(entries.is_empty());
        let flag: bool = decode_or_default(b"", &["boolean"]).unwrap();
        assert!(!flag);
        let err = decode_or_default::<bool>(br#"{}"#, &["boolean"]).unwrap_err();
        assert!(matches!(err, DecodeError::MissingKey { .. }));
    }

    #[test]
    fn empty_body_is_none_for_records() {
        let home: Option<String> = decode_or_default(b"", &["Path"]).unwrap();
        assert_eq!(home, None);
        let home: Option<String> = decode_or_default(br#"{"Path":"/user/a"}"#, &["Path"]).unwrap();
        assert_eq!(home.as_deref(), Some("/user/a"));
    }
}
