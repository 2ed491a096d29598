//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout flowmirror. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Data-model errors name the model, the field or relation, and what
//!   was expected, so a broken declaration can be fixed without a debugger.
//! - Canonicalization errors carry the underlying serializer failure.
//! - Payload validation errors live in `flowmirror-schema`, next to the
//!   validator that produces them.

use thiserror::Error;

/// Top-level error type for flowmirror.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// The data-model declaration is inconsistent.
    #[error("data model error: {0}")]
    Model(#[from] ModelError),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A string did not name a known scalar type or enum value.
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A data-model declaration failed its integrity check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Two models share a name.
    #[error("duplicate model '{0}'")]
    DuplicateModel(String),

    /// Two enums share a name, or an enum shadows a model.
    #[error("duplicate enum '{0}'")]
    DuplicateEnum(String),

    /// An enum declares no values.
    #[error("enum '{0}' declares no values")]
    EmptyEnum(String),

    /// An enum declares the same value twice.
    #[error("enum '{enum_name}' declares value '{value}' twice")]
    DuplicateEnumValue {
        /// Enum name.
        enum_name: String,
        /// Repeated value.
        value: String,
    },

    /// A model declares the same field or relation name twice.
    #[error("model '{model}' declares '{field}' twice")]
    DuplicateField {
        /// Model name.
        model: String,
        /// Repeated field or relation name.
        field: String,
    },

    /// A name is not a usable identifier.
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    /// A field refers to an enum that is not declared.
    #[error("field '{model}.{field}' has unknown type '{type_name}'")]
    UnknownType {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
        /// The unresolved type name.
        type_name: String,
    },

    /// A relation points at a model that is not declared.
    #[error("relation '{model}.{relation}' targets unknown model '{target}'")]
    UnknownTarget {
        /// Model name.
        model: String,
        /// Relation field name.
        relation: String,
        /// The unresolved target model.
        target: String,
    },

    /// A foreign key, reference, or unique constraint names a missing column.
    #[error("{context} on model '{model}' refers to unknown field '{field}'")]
    UnknownField {
        /// Model that should own the field.
        model: String,
        /// The missing field.
        field: String,
        /// Where the reference appeared.
        context: String,
    },

    /// `fields` and `references` of a relation differ in length.
    #[error("relation '{model}.{relation}' has {fields} foreign key field(s) but {references} reference(s)")]
    ReferenceArity {
        /// Model name.
        model: String,
        /// Relation field name.
        relation: String,
        /// Number of foreign-key columns.
        fields: usize,
        /// Number of referenced columns.
        references: usize,
    },

    /// A to-many relation declares foreign-key columns.
    #[error("relation '{model}.{relation}' is a list and cannot own foreign keys")]
    ListOwnsForeignKey {
        /// Model name.
        model: String,
        /// Relation field name.
        relation: String,
    },

    /// A relation has no opposite side on its target.
    #[error("relation '{model}.{relation}' has no back relation on '{target}'")]
    MissingBackRelation {
        /// Model name.
        model: String,
        /// Relation field name.
        relation: String,
        /// Target model.
        target: String,
    },

    /// A relation matches more than one opposite side; a `relation_name` is needed.
    #[error("relation '{model}.{relation}' has ambiguous back relations on '{target}'")]
    AmbiguousBackRelation {
        /// Model name.
        model: String,
        /// Relation field name.
        relation: String,
        /// Target model.
        target: String,
    },

    /// Neither side of a to-one pair owns the foreign key.
    #[error("relation '{model}.{relation}' and its back relation both lack foreign keys")]
    UnownedRelation {
        /// Model name.
        model: String,
        /// Relation field name.
        relation: String,
    },

    /// A literal default does not match the field type.
    #[error("default for '{model}.{field}' is invalid: {reason}")]
    InvalidDefault {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
        /// What is wrong with the default.
        reason: String,
    },

    /// A compound unique constraint lists fewer than two fields.
    #[error("compound unique on model '{0}' needs at least two fields")]
    ShortCompoundUnique(String),

    /// A model has no `id`, `unique`, or compound unique key.
    #[error("model '{0}' has no unique key")]
    NoUniqueKey(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
