//! # Generator Configuration
//!
//! Knobs for [`SchemaRegistry::generate`](crate::SchemaRegistry::generate).
//! Loaded from the `generator:` section of the CLI config file, or built
//! in code; every field has a default.
//!
//! ```yaml
//! generator:
//!   id_base: https://schemas.flowmirror.dev/
//!   strict_objects: true
//!   query_inputs: true
//!   nested_writes: true
//!   aggregates: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::registry::GenerationError;

/// Default `$id` prefix of emitted documents.
pub const DEFAULT_ID_BASE: &str = "https://schemas.flowmirror.dev/";

/// What to generate and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Prefix of every document `$id`. A trailing `/` is added if missing.
    pub id_base: String,
    /// Set `additionalProperties: false` on every object schema.
    pub strict_objects: bool,
    /// Emit where/order-by/select/create/update inputs and operation arguments.
    pub query_inputs: bool,
    /// Emit nested relation writes inside create/update inputs.
    pub nested_writes: bool,
    /// Emit aggregate selections, aggregate ordering, and aggregate/groupBy arguments.
    pub aggregates: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            id_base: DEFAULT_ID_BASE.to_string(),
            strict_objects: true,
            query_inputs: true,
            nested_writes: true,
            aggregates: true,
        }
    }
}

impl GeneratorConfig {
    /// Entity and leaf schemas only.
    pub fn entities_only() -> Self {
        Self {
            query_inputs: false,
            nested_writes: false,
            aggregates: false,
            ..Self::default()
        }
    }

    /// Parse a YAML configuration.
    pub fn from_yaml_str(s: &str) -> Result<Self, GenerationError> {
        serde_yaml::from_str(s).map_err(|e| GenerationError::Config(e.to_string()))
    }

    /// Load a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, GenerationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// `id_base` with exactly one trailing `/`.
    pub fn normalized_id_base(&self) -> String {
        format!("{}/", self.id_base.trim_end_matches('/'))
    }

    /// The `$id` of the document named `name`.
    pub fn schema_id(&self, name: &str) -> String {
        format!("{}{name}{}", self.normalized_id_base(), crate::fragment::SCHEMA_FILE_SUFFIX)
    }

    /// Whether nested relation writes are emitted.
    pub fn emits_nested_writes(&self) -> bool {
        self.query_inputs && self.nested_writes
    }

    /// Whether aggregate inputs are emitted.
    pub fn emits_aggregates(&self) -> bool {
        self.query_inputs && self.aggregates
    }
}
