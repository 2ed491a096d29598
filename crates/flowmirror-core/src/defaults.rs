//! # Default Application
//!
//! Completes an insert payload the way the database would: every column
//! the payload omits receives its declared default.
//!
//! | Default | Filled with |
//! |---------|-------------|
//! | literal | the literal |
//! | `now`, `updated_at` | current UTC instant, RFC 3339 with `Z` |
//! | `uuid` | random v4 UUID, hyphenated lowercase |
//! | `cuid` | `c` followed by 24 lowercase base-36 characters |
//! | `autoincrement` | left absent (assigned by the database sequence) |
//! | none, nullable column | `null` |
//!
//! Columns the payload already carries are never touched, including
//! explicit `null`s.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::MirrorError;
use crate::model::{DefaultValue, ModelDef};

/// Length of a generated cuid, including the leading `c`.
pub const CUID_LENGTH: usize = 25;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Render an instant the way `DateTime` columns are stored.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generate a collision-resistant id: `c` + 24 base-36 characters.
///
/// The body is the low 24 base-36 digits of a v4 UUID, zero-padded.
pub fn new_cuid() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut body = [b'0'; CUID_LENGTH - 1];
    for slot in body.iter_mut().rev() {
        *slot = BASE36[(n % 36) as usize];
        n /= 36;
    }
    let mut id = String::with_capacity(CUID_LENGTH);
    id.push('c');
    id.extend(body.iter().map(|&b| char::from(b)));
    id
}

/// Whether `s` has the shape produced by [`new_cuid`].
pub fn is_cuid(s: &str) -> bool {
    s.len() == CUID_LENGTH
        && s.starts_with('c')
        && s[1..].bytes().all(|b| BASE36.contains(&b))
}

impl ModelDef {
    /// Fill omitted columns of `payload` with their defaults, using the
    /// current instant for `now` and `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::Parse` if `payload` is not a JSON object.
    pub fn apply_defaults(&self, payload: &mut Value) -> Result<(), MirrorError> {
        self.apply_defaults_at(payload, Utc::now())
    }

    /// Fill omitted columns of `payload`, using `now` for timestamp defaults.
    pub fn apply_defaults_at(&self, payload: &mut Value, now: DateTime<Utc>) -> Result<(), MirrorError> {
        let object = payload.as_object_mut().ok_or_else(|| {
            MirrorError::Parse(format!("{} payload must be a JSON object", self.name))
        })?;

        for field in &self.fields {
            if object.contains_key(&field.name) {
                continue;
            }
            let filled = match &field.default {
                Some(DefaultValue::Value(v)) => Some(v.clone()),
                Some(DefaultValue::Now) => Some(Value::String(format_timestamp(now))),
                Some(DefaultValue::Uuid) => Some(Value::String(Uuid::new_v4().to_string())),
                Some(DefaultValue::Cuid) => Some(Value::String(new_cuid())),
                Some(DefaultValue::Autoincrement) => None,
                None if field.updated_at => Some(Value::String(format_timestamp(now))),
                None if field.optional => Some(Value::Null),
                None => None,
            };
            if let Some(value) = filled {
                object.insert(field.name.clone(), value);
            }
        }
        Ok(())
    }
}
