//! # flowmirror-schema: Schema Generation & Validation
//!
//! Mirrors a [`DataModel`](flowmirror_core::DataModel) as a family of
//! JSON Schema (Draft 2020-12) documents, one per entity shape, query
//! input, and operation argument, and validates payloads against them.
//!
//! ## Generation (`registry`)
//!
//! [`SchemaRegistry::generate`] validates the declaration and emits, in
//! dependency order:
//!
//! - leaf schemas ([`filters`]): enums, scalar filters, field update operations;
//! - entity schemas (`entity`): `M`, `MOptionalDefaults`, `MPartial`,
//!   `MWithRelations`, `MScalarFieldEnum`;
//! - query inputs and nested writes (`inputs`);
//! - operation arguments (`inputs`).
//!
//! What is emitted is controlled by [`GeneratorConfig`].
//!
//! ## Validation (`validate`)
//!
//! [`SchemaValidator`] compiles schemas on demand and resolves every
//! cross-schema `$ref` from memory. [`EntityParser`] pairs it with
//! default application to turn an insert payload into a complete row.
//!
//! ## Audit (`audit`)
//!
//! [`audit_registry`] reports any query input or argument schema that
//! would accept unknown keys.
//!
//! ## Crate Policy
//!
//! - Depends only on `flowmirror-core` internally.
//! - Schema names are part of the public contract: renaming a generated
//!   schema is a breaking change for every caller validating against it.
//! - Every emitted `$ref` must resolve within the registry; generation
//!   fails otherwise.

pub mod audit;
pub mod config;
mod entity;
pub mod filters;
pub mod fragment;
mod inputs;
pub mod parse;
pub mod registry;
pub mod validate;

pub use audit::{audit_additional_properties, audit_registry, AdditionalPropertiesFinding};
pub use config::{GeneratorConfig, DEFAULT_ID_BASE};
pub use parse::{EntityParser, ParseError};
pub use registry::{GenerationError, SchemaGroup, SchemaRegistry, JSON_SCHEMA_DIALECT};
pub use validate::{
    load_document, SchemaValidationError, SchemaValidator, ValidationViolations, Violation,
};
