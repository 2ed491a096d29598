//! # Canonical Serialization: JCS Byte Production
//!
//! Defines `CanonicalBytes`, the only input accepted by the digest
//! functions in [`crate::digest`]. Schema documents and lockfile bodies are
//! serialized through RFC 8785 (JSON Canonicalization Scheme) via
//! `serde_jcs`: sorted keys, compact separators, deterministic numbers.
//!
//! Unlike payload hashing, schema documents legitimately carry floats
//! (`minimum`/`maximum` bounds), so numbers pass through unchanged and JCS
//! number formatting applies.

use serde::Serialize;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// The inner buffer is private; [`CanonicalBytes::new`] is the only
/// constructor, so two documents that differ only in key order or
/// whitespace always yield the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let s = serde_jcs::to_string(obj)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The canonical text. JCS output is always UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sorted_keys_compact_separators() {
        let cb = CanonicalBytes::new(&json!({"b": 2, "a": 1, "c": "hello"})).unwrap();
        assert_eq!(cb.as_str(), r#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn test_nested_objects_sorted() {
        let data = json!({
            "properties": {"name": {"type": "string"}, "id": {"type": "string"}},
            "required": ["id", "name"]
        });
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            cb.as_str(),
            r#"{"properties":{"id":{"type":"string"},"name":{"type":"string"}},"required":["id","name"]}"#
        );
    }

    #[test]
    fn test_schema_bounds_keep_numbers() {
        let data = json!({"minimum": -2147483648_i64, "maximum": 2147483647, "multipleOf": 0.5});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            cb.as_str(),
            r#"{"maximum":2147483647,"minimum":-2147483648,"multipleOf":0.5}"#
        );
    }

    #[test]
    fn test_integral_float_uses_jcs_number_form() {
        let cb = CanonicalBytes::new(&json!({"v": 1.0})).unwrap();
        assert_eq!(cb.as_str(), r#"{"v":1}"#);
    }

    #[test]
    fn test_unicode_passthrough() {
        let cb = CanonicalBytes::new(&json!({"name": "\u{00e9}t\u{00e9}"})).unwrap();
        assert!(cb.as_str().contains('\u{00e9}'));
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(CanonicalBytes::new(&json!({})).unwrap().as_bytes(), b"{}");
        assert_eq!(CanonicalBytes::new(&json!([])).unwrap().as_bytes(), b"[]");
        assert!(!CanonicalBytes::new(&json!({})).unwrap().is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,30}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Canonicalization is deterministic and round-trips through serde_json.
        #[test]
        fn canonical_bytes_deterministic_and_parseable(value in json_value()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
            let parsed: Value = serde_json::from_slice(a.as_bytes()).unwrap();
            prop_assert_eq!(parsed, value);
        }

        /// Re-canonicalizing canonical output is a fixed point.
        #[test]
        fn canonical_bytes_idempotent(value in json_value()) {
            let once = CanonicalBytes::new(&value).unwrap();
            let reparsed: Value = serde_json::from_slice(once.as_bytes()).unwrap();
            let twice = CanonicalBytes::new(&reparsed).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
