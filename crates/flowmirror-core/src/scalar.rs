//! # Scalar Types: Column Primitive Taxonomy
//!
//! Defines `ScalarType`, the closed set of column primitives a data model
//! may declare. Every `match` on `ScalarType` is exhaustive, so adding a
//! primitive forces the generator to decide how it is filtered, ordered,
//! updated, and aggregated.
//!
//! | Type | JSON representation |
//! |------|---------------------|
//! | String | string |
//! | Int | integer in the signed 32-bit range |
//! | BigInt | integer |
//! | Float | number |
//! | Decimal | number, or a decimal string |
//! | Boolean | boolean |
//! | DateTime | RFC 3339 string |
//! | Json | any JSON value |
//! | Bytes | base64 string |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MirrorError;

/// A column primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// UTF-8 text.
    String,
    /// Signed 32-bit integer.
    Int,
    /// Signed 64-bit integer.
    BigInt,
    /// Double-precision float.
    Float,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Boolean.
    Boolean,
    /// Instant in time.
    DateTime,
    /// Arbitrary JSON document.
    Json,
    /// Binary blob.
    Bytes,
}

/// Total number of scalar types.
pub const SCALAR_TYPE_COUNT: usize = 9;

impl ScalarType {
    /// Returns all scalar types in declaration order.
    pub fn all() -> &'static [ScalarType] {
        &[
            Self::String,
            Self::Int,
            Self::BigInt,
            Self::Float,
            Self::Decimal,
            Self::Boolean,
            Self::DateTime,
            Self::Json,
            Self::Bytes,
        ]
    }

    /// Returns the declaration name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Json => "Json",
            Self::Bytes => "Bytes",
        }
    }

    /// The stem used in filter and update-operation schema names.
    ///
    /// `Boolean` becomes `Bool` (`BoolFilter`, `BoolFieldUpdateOperationsInput`);
    /// every other type uses its declaration name.
    pub fn schema_stem(&self) -> &'static str {
        match self {
            Self::Boolean => "Bool",
            other => other.as_str(),
        }
    }

    /// Whether the type supports arithmetic updates and avg/sum aggregates.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt | Self::Float | Self::Decimal)
    }

    /// Whether the type supports `lt`/`lte`/`gt`/`gte` comparisons and min/max.
    pub fn is_ordered(&self) -> bool {
        match self {
            Self::String | Self::Int | Self::BigInt | Self::Float | Self::Decimal | Self::DateTime => true,
            Self::Boolean | Self::Json | Self::Bytes => false,
        }
    }

    /// Whether a column of this type can appear in `orderBy`.
    pub fn is_sortable(&self) -> bool {
        !matches!(self, Self::Json)
    }

    /// Whether the type supports `contains`/`startsWith`/`endsWith`.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Whether the type has field update operations (`set`, and arithmetic for numerics).
    pub fn has_update_operations(&self) -> bool {
        !matches!(self, Self::Json)
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarType {
    type Err = MirrorError;

    /// Parse a scalar type from its declaration name. Case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "String" => Ok(Self::String),
            "Int" => Ok(Self::Int),
            "BigInt" => Ok(Self::BigInt),
            "Float" => Ok(Self::Float),
            "Decimal" => Ok(Self::Decimal),
            "Boolean" => Ok(Self::Boolean),
            "DateTime" => Ok(Self::DateTime),
            "Json" => Ok(Self::Json),
            "Bytes" => Ok(Self::Bytes),
            other => Err(MirrorError::Parse(format!("unknown scalar type: {other:?}"))),
        }
    }
}
