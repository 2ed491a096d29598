//! # Schema Registry
//!
//! Generates the complete schema family for a [`DataModel`] and holds it
//! by name. Generation runs in dependency order:
//!
//! 1. leaves: declared enums, sort/null-handling enums, scalar filters,
//!    field update operations;
//! 2. entity schemas per model;
//! 3. query inputs per model, including nested relation writes;
//! 4. operation arguments per model.
//!
//! Every cross-schema link is a relative `$ref` (`"Node.schema.json"`),
//! resolved against the referring document's `$id` only when a validator
//! is compiled. Mutually recursive schemas (`FlowWhereInput` →
//! `NodeListRelationFilter` → `NodeWhereInput` → `FlowRelationFilter` →
//! `FlowWhereInput`) therefore need no special handling.
//!
//! ## Integrity
//!
//! [`SchemaRegistry::generate`] fails if a name is emitted twice or if any
//! `$ref` names a schema that was not emitted.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use flowmirror_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, DataModel, ModelError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::GeneratorConfig;
use crate::fragment::{referenced_names, ObjectSchema, SCHEMA_FILE_SUFFIX};
use crate::{entity, filters, inputs};

/// JSON Schema dialect of every emitted document.
pub const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Error during schema generation or emission.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The data model failed its integrity check.
    #[error("invalid data model: {0}")]
    Model(#[from] ModelError),

    /// Two generator steps produced the same schema name.
    #[error("schema '{0}' emitted twice")]
    DuplicateSchema(String),

    /// A schema references a name that was never emitted.
    #[error("schema '{schema}' references unknown schema '{reference}'")]
    DanglingReference {
        /// The referring schema.
        schema: String,
        /// The missing target.
        reference: String,
    },

    /// The generator configuration is malformed.
    #[error("invalid generator configuration: {0}")]
    Config(String),

    /// Canonicalization of a document failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// IO error writing or reading schema files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The layer a schema belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaGroup {
    /// String enums: declared enums and sort/null-handling modes.
    Enum,
    /// Per-scalar and per-enum filters.
    ScalarFilter,
    /// Per-scalar and per-enum field update operations.
    FieldUpdate,
    /// Per-model value, optional-defaults, partial, and relation schemas.
    Entity,
    /// Where, order-by, select, aggregate, create, and update inputs.
    QueryInput,
    /// Operation argument envelopes.
    Arguments,
}

impl SchemaGroup {
    /// Every group, in emission order.
    pub fn all() -> &'static [SchemaGroup] {
        &[
            Self::Enum,
            Self::ScalarFilter,
            Self::FieldUpdate,
            Self::Entity,
            Self::QueryInput,
            Self::Arguments,
        ]
    }

    /// Returns the group identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::ScalarFilter => "scalar_filter",
            Self::FieldUpdate => "field_update",
            Self::Entity => "entity",
            Self::QueryInput => "query_input",
            Self::Arguments => "arguments",
        }
    }
}

impl std::fmt::Display for SchemaGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaGroup {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| GenerationError::Config(format!("unknown schema group: {s:?}")))
    }
}

/// One generated schema.
#[derive(Debug, Clone)]
struct Entry {
    group: SchemaGroup,
    body: Value,
}

/// Collects schemas during generation and rejects duplicate names.
pub(crate) struct Emitter<'a> {
    config: &'a GeneratorConfig,
    entries: HashMap<String, Entry>,
    order: Vec<String>,
}

impl<'a> Emitter<'a> {
    fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn config(&self) -> &GeneratorConfig {
        self.config
    }

    /// A fresh object builder honoring `strict_objects`.
    pub(crate) fn object(&self) -> ObjectSchema {
        ObjectSchema::new(self.config.strict_objects)
    }

    pub(crate) fn emit(
        &mut self,
        group: SchemaGroup,
        name: impl Into<String>,
        body: Value,
    ) -> Result<(), GenerationError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(GenerationError::DuplicateSchema(name));
        }
        self.order.push(name.clone());
        self.entries.insert(name, Entry { group, body });
        Ok(())
    }
}

/// The generated schema family of one data model.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    config: GeneratorConfig,
    models: Vec<String>,
    entries: HashMap<String, Entry>,
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Validate `model` and generate every schema `config` asks for.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Model` if the declaration is inconsistent,
    /// `DuplicateSchema` or `DanglingReference` if the generated family is
    /// not closed.
    pub fn generate(model: &DataModel, config: &GeneratorConfig) -> Result<Self, GenerationError> {
        model.validate()?;
        let mut emitter = Emitter::new(config);

        filters::emit_leaves(&mut emitter, model)?;
        for m in &model.models {
            entity::emit_entity(&mut emitter, m)?;
        }
        if config.query_inputs {
            for m in &model.models {
                inputs::emit_query_inputs(&mut emitter, model, m)?;
            }
            for m in &model.models {
                inputs::emit_arguments(&mut emitter, m)?;
            }
        }

        let registry = Self {
            config: config.clone(),
            models: model.models.iter().map(|m| m.name.clone()).collect(),
            entries: emitter.entries,
            order: emitter.order,
        };
        registry.check_references()?;

        tracing::debug!(
            schemas = registry.len(),
            models = model.models.len(),
            enums = model.enums.len(),
            "generated schema registry"
        );
        Ok(registry)
    }

    fn check_references(&self) -> Result<(), GenerationError> {
        for name in &self.order {
            let entry = &self.entries[name];
            for reference in referenced_names(&entry.body) {
                if !self.entries.contains_key(&reference) {
                    return Err(GenerationError::DanglingReference {
                        schema: name.clone(),
                        reference,
                    });
                }
            }
        }
        Ok(())
    }

    /// The configuration the registry was generated with.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Number of schemas.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no schema was generated.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Schema names in emission order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Schema names of one group, in emission order.
    pub fn names_in(&self, group: SchemaGroup) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(move |n| self.entries[n.as_str()].group == group)
            .map(String::as_str)
    }

    /// Whether a schema of this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The schema body (without `$schema`/`$id`/`title`).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|e| &e.body)
    }

    /// The group of a schema.
    pub fn group(&self, name: &str) -> Option<SchemaGroup> {
        self.entries.get(name).map(|e| e.group)
    }

    /// The standalone document: the body plus `$schema`, `$id`, and `title`.
    pub fn document(&self, name: &str) -> Option<Value> {
        let body = self.get(name)?;
        let mut doc = Map::new();
        doc.insert("$schema".to_string(), json!(JSON_SCHEMA_DIALECT));
        doc.insert("$id".to_string(), json!(self.config.schema_id(name)));
        doc.insert("title".to_string(), json!(name));
        if let Value::Object(fields) = body {
            for (k, v) in fields {
                doc.insert(k.clone(), v.clone());
            }
        }
        Some(Value::Object(doc))
    }

    /// Every document keyed by its `$id`.
    pub fn documents_by_id(&self) -> HashMap<String, Value> {
        self.names()
            .filter_map(|name| Some((self.config.schema_id(name), self.document(name)?)))
            .collect()
    }

    /// Write one `<Name>.schema.json` per schema into `dir`, creating it if needed.
    ///
    /// Returns the number of files written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<usize, GenerationError> {
        std::fs::create_dir_all(dir)?;
        let mut written = 0;
        for name in self.names() {
            let Some(doc) = self.document(name) else {
                continue;
            };
            let mut content = serde_json::to_string_pretty(&doc)?;
            content.push('\n');
            std::fs::write(dir.join(format!("{name}{SCHEMA_FILE_SUFFIX}")), content)?;
            written += 1;
        }
        tracing::debug!(dir = %dir.display(), files = written, "wrote schema documents");
        Ok(written)
    }

    /// SHA-256 of the canonical form of every document, keyed by name.
    pub fn manifest(&self) -> Result<BTreeMap<String, ContentDigest>, GenerationError> {
        let mut manifest = BTreeMap::new();
        for name in self.names() {
            if let Some(doc) = self.document(name) {
                let canonical = CanonicalBytes::new(&doc)?;
                manifest.insert(name.to_string(), sha256_digest(&canonical));
            }
        }
        Ok(manifest)
    }

    /// Names of the models the registry was generated from.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    /// Schema names derived from one model (entity, query input, and argument schemas).
    ///
    /// A name belongs to the longest model name it starts with, so
    /// `FlowRunWhereInput` belongs to `FlowRun`, not `Flow`.
    pub fn names_for_model<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a str> {
        self.names().filter(move |name| {
            !matches!(
                self.group(name),
                Some(SchemaGroup::Enum | SchemaGroup::ScalarFilter | SchemaGroup::FieldUpdate)
            ) && self.owning_model(name) == Some(model)
        })
    }

    fn owning_model(&self, name: &str) -> Option<&str> {
        self.models
            .iter()
            .filter(|m| {
                name.strip_prefix(m.as_str()).is_some_and(|rest| {
                    rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_uppercase())
                })
            })
            .max_by_key(|m| m.len())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowmirror_core::{workflow_data_model, DefaultValue, EnumDef, FieldDef, ModelDef, RelationDef, ScalarType};

    fn small_model() -> DataModel {
        DataModel::new()
            .with_enum(EnumDef::new("Shade", ["LIGHT", "DARK"]))
            .with_model(
                ModelDef::new("Board")
                    .field(FieldDef::new("id", ScalarType::String).id().default(DefaultValue::Cuid))
                    .field(FieldDef::enumeration("shade", "Shade").optional())
                    .relation(RelationDef::many("pins", "Pin")),
            )
            .with_model(
                ModelDef::new("Pin")
                    .field(FieldDef::new("id", ScalarType::Int).id().default(DefaultValue::Autoincrement))
                    .field(FieldDef::new("boardId", ScalarType::String))
                    .relation(RelationDef::one("board", "Board").references(["boardId"], ["id"])),
            )
    }

    #[test]
    fn test_generate_small_model() {
        let registry = SchemaRegistry::generate(&small_model(), &GeneratorConfig::default()).unwrap();
        for name in ["Shade", "Board", "PinWhereInput", "BoardCreateArgs", "PinCreateNestedManyWithoutBoardInput"] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.group("Shade"), Some(SchemaGroup::Enum));
        assert_eq!(registry.group("BoardFindManyArgs"), Some(SchemaGroup::Arguments));
    }

    #[test]
    fn test_invalid_model_rejected() {
        let mut model = small_model();
        model.models[0].relations.clear();
        let err = SchemaRegistry::generate(&model, &GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, GenerationError::Model(ModelError::MissingBackRelation { .. })));
    }

    #[test]
    fn test_emitter_rejects_duplicates() {
        let config = GeneratorConfig::default();
        let mut emitter = Emitter::new(&config);
        emitter.emit(SchemaGroup::Enum, "SortOrder", json!({})).unwrap();
        let err = emitter.emit(SchemaGroup::Enum, "SortOrder", json!({})).unwrap_err();
        assert!(matches!(err, GenerationError::DuplicateSchema(ref n) if n == "SortOrder"));
    }

    #[test]
    fn test_dangling_reference_detected() {
        let registry = SchemaRegistry {
            config: GeneratorConfig::default(),
            models: Vec::new(),
            entries: HashMap::from([(
                "A".to_string(),
                Entry {
                    group: SchemaGroup::QueryInput,
                    body: crate::fragment::reference("B"),
                },
            )]),
            order: vec!["A".to_string()],
        };
        let err = registry.check_references().unwrap_err();
        assert!(matches!(err, GenerationError::DanglingReference { ref reference, .. } if reference == "B"));
    }

    #[test]
    fn test_document_envelope() {
        let registry = SchemaRegistry::generate(&small_model(), &GeneratorConfig::default()).unwrap();
        let doc = registry.document("Board").unwrap();
        assert_eq!(doc["$schema"], JSON_SCHEMA_DIALECT);
        assert_eq!(doc["$id"], "https://schemas.flowmirror.dev/Board.schema.json");
        assert_eq!(doc["title"], "Board");
        assert_eq!(doc["type"], "object");
        assert!(registry.document("Nope").is_none());
    }

    #[test]
    fn test_entities_only_config() {
        let registry = SchemaRegistry::generate(&small_model(), &GeneratorConfig::entities_only()).unwrap();
        assert!(registry.contains("BoardWithRelations"));
        assert!(!registry.contains("BoardWhereInput"));
        assert_eq!(registry.names_in(SchemaGroup::Arguments).count(), 0);
    }

    #[test]
    fn test_names_for_model_excludes_prefix_collisions() {
        let registry = SchemaRegistry::generate(&workflow_data_model(), &GeneratorConfig::default()).unwrap();
        let flow: Vec<&str> = registry.names_for_model("Flow").collect();
        assert!(flow.contains(&"Flow"));
        assert!(flow.contains(&"FlowWhereInput"));
        assert!(!flow.iter().any(|n| n.starts_with("FlowRun")), "FlowRun schemas leaked: {flow:?}");
        assert!(!flow.contains(&"FlowMethod"));
    }

    #[test]
    fn test_manifest_is_stable() {
        let model = small_model();
        let a = SchemaRegistry::generate(&model, &GeneratorConfig::default()).unwrap();
        let b = SchemaRegistry::generate(&model, &GeneratorConfig::default()).unwrap();
        assert_eq!(a.manifest().unwrap(), b.manifest().unwrap());
        assert_eq!(a.manifest().unwrap().len(), a.len());
    }

    #[test]
    fn test_group_parse() {
        assert_eq!("query_input".parse::<SchemaGroup>().unwrap(), SchemaGroup::QueryInput);
        assert!("queries".parse::<SchemaGroup>().is_err());
    }
}
