//! # flowmirror-core: Data-Model Foundations
//!
//! The leaf crate of the flowmirror workspace. It defines the declaration
//! a schema family is generated from and the workflow data model itself;
//! `flowmirror-schema` turns a [`DataModel`] into validator documents.
//!
//! ## Key Design Principles
//!
//! 1. **One declaration, one truth.** Models, columns, relations, and
//!    unique keys live in [`DataModel`]. The generator reads nothing else.
//!
//! 2. **Validated before use.** [`DataModel::validate`] rejects dangling
//!    relation targets, unpaired back relations, mistyped defaults, and
//!    models without a unique key, so generation never sees an
//!    inconsistent declaration.
//!
//! 3. **Typed enums mirror declared enums.** Each workflow enum is a Rust
//!    enum implementing [`ModelEnum`]; its [`EnumDef`] is derived from the
//!    variants.
//!
//! 4. **Digests flow through canonicalization.** [`sha256_digest`] accepts
//!    only [`CanonicalBytes`], so schema fingerprints are independent of
//!    formatting.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `flowmirror-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod canonical;
pub mod defaults;
pub mod digest;
pub mod enums;
pub mod error;
pub mod model;
pub mod naming;
pub mod scalar;
pub mod workflow;

pub use canonical::CanonicalBytes;
pub use defaults::{format_timestamp, is_cuid, new_cuid};
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use enums::{
    AuditChangeType, EdgeType, FlowMethod, InfraProvider, ModelEnum, NodeType, RunStatus,
    ScheduledJobStatus, SecretCategory, StartedBy, UserRole,
};
pub use error::{CanonicalizationError, MirrorError, ModelError};
pub use model::{
    DataModel, DefaultValue, EnumDef, FieldDef, FieldType, ModelDef, RelationDef, RelationKind,
    UniqueConstraint, UniqueKey,
};
pub use naming::{is_identifier, pascal_case};
pub use scalar::{ScalarType, SCALAR_TYPE_COUNT};
pub use workflow::{workflow_data_model, WORKFLOW_MODELS};
