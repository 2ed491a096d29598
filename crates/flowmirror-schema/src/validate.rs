//! # Schema Validation
//!
//! Runtime validation of JSON/YAML payloads against the generated schema
//! family (Draft 2020-12).
//!
//! ## Schema Resolution
//!
//! Every document carries `$id = <id_base><Name>.schema.json`, and every
//! cross-schema link is a relative `$ref` such as `"Node.schema.json"`.
//! The `jsonschema` crate resolves each `$ref` against the referring
//! document's `$id` and hands the absolute URI to [`LocalSchemaRetriever`],
//! which answers from memory. If the absolute URI is unknown (documents
//! loaded from a directory emitted under a different `id_base`), the file
//! name is tried instead. No reference ever reaches the network.
//!
//! ## Caching
//!
//! Compiled validators are cached per schema name. The first validation
//! against a name compiles it (and, lazily, everything it reaches);
//! later validations reuse the compiled form.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::fragment::SCHEMA_FILE_SUFFIX;
use crate::registry::SchemaRegistry;

/// Resolves `$ref` URIs to schemas held in memory.
struct LocalSchemaRetriever {
    /// Documents keyed by absolute `$id`.
    by_uri: Arc<HashMap<String, Value>>,
    /// Documents keyed by file name (`Node.schema.json`).
    by_file: Arc<HashMap<String, Value>>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.by_file.get(filename) {
            return Ok(value.clone());
        }

        // Draft metaschemas are bundled with the validator; anything else
        // under json-schema.org is accepted as-is.
        if uri_str.starts_with("https://json-schema.org/") || uri_str.starts_with("http://json-schema.org/") {
            return Ok(serde_json::json!({}));
        }

        Err(format!("unknown schema reference: {uri_str}").into())
    }
}

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The schema could not be found or loaded.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema name or file.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The document file could not be loaded or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError {
        /// Path to the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// The compiled validator could not be built.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema name.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// IO error reading schema or document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaValidationError {
    /// The violations, if this is a validation failure.
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            Self::ValidationFailed { violations, .. } => Some(violations),
            _ => None,
        }
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether any violation points at `instance_path`.
    pub fn touches(&self, instance_path: &str) -> bool {
        self.violations.iter().any(|v| v.instance_path == instance_path)
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Strip the `.schema.json` suffix if present.
fn schema_key(name: &str) -> &str {
    name.strip_suffix(SCHEMA_FILE_SUFFIX).unwrap_or(name)
}

/// A validator over one generated schema family.
///
/// Built from a [`SchemaRegistry`] in memory or from a directory of
/// emitted `*.schema.json` files. Schema names are accepted with or
/// without the `.schema.json` suffix.
///
/// `SchemaValidator` is `Send + Sync`; compiled validators sit behind a
/// read-write lock and are shared by reference count.
pub struct SchemaValidator {
    /// Documents keyed by schema name (no suffix).
    schemas: HashMap<String, Value>,
    by_uri: Arc<HashMap<String, Value>>,
    by_file: Arc<HashMap<String, Value>>,
    source: Option<PathBuf>,
    cache: RwLock<HashMap<String, Arc<Validator>>>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schemas", &self.schemas.len())
            .field("source", &self.source)
            .field("compiled", &self.cache.read().len())
            .finish()
    }
}

impl SchemaValidator {
    fn from_documents(schemas: HashMap<String, Value>, source: Option<PathBuf>) -> Self {
        let mut by_uri = HashMap::new();
        let mut by_file = HashMap::new();
        for (name, doc) in &schemas {
            if let Some(id) = doc.get("$id").and_then(Value::as_str) {
                by_uri.insert(id.to_string(), doc.clone());
            }
            by_file.insert(format!("{name}{SCHEMA_FILE_SUFFIX}"), doc.clone());
        }
        Self {
            schemas,
            by_uri: Arc::new(by_uri),
            by_file: Arc::new(by_file),
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a validator over every document of `registry`.
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        let schemas = registry
            .names()
            .filter_map(|name| Some((name.to_string(), registry.document(name)?)))
            .collect();
        Self::from_documents(schemas, None)
    }

    /// Create a validator by loading every `*.schema.json` file in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::SchemaLoadError` if the directory
    /// cannot be read or any schema file is not valid JSON.
    pub fn new(schema_dir: impl AsRef<Path>) -> Result<Self, SchemaValidationError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut schemas = HashMap::new();

        let entries = std::fs::read_dir(&schema_dir).map_err(|e| {
            SchemaValidationError::SchemaLoadError {
                schema_name: schema_dir.display().to_string(),
                reason: format!("cannot read schema directory: {e}"),
            }
        })?;

        for entry in entries {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(name) = file_name.strip_suffix(SCHEMA_FILE_SUFFIX) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&content).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    schema_name: file_name.to_string(),
                    reason: format!("invalid JSON: {e}"),
                }
            })?;
            schemas.insert(name.to_string(), value);
        }

        tracing::debug!(dir = %schema_dir.display(), schemas = schemas.len(), "loaded schema directory");
        Ok(Self::from_documents(schemas, Some(schema_dir)))
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Returns the names of all loaded schemas, sorted alphabetically.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a loaded schema document by name.
    pub fn get_schema(&self, name: &str) -> Option<&Value> {
        self.schemas.get(schema_key(name))
    }

    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.should_validate_formats(true);
        opts.with_retriever(LocalSchemaRetriever {
            by_uri: Arc::clone(&self.by_uri),
            by_file: Arc::clone(&self.by_file),
        });
        opts
    }

    /// The compiled validator for `schema_name`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::SchemaLoadError` if the schema is not
    /// loaded, `ValidatorBuildError` if it does not compile (for example,
    /// a `$ref` that resolves to nothing).
    pub fn build_validator(&self, schema_name: &str) -> Result<Arc<Validator>, SchemaValidationError> {
        let key = schema_key(schema_name);
        if let Some(validator) = self.cache.read().get(key) {
            return Ok(Arc::clone(validator));
        }

        let schema = self
            .schemas
            .get(key)
            .ok_or_else(|| SchemaValidationError::SchemaLoadError {
                schema_name: key.to_string(),
                reason: match &self.source {
                    Some(dir) => format!("schema not found in {}", dir.display()),
                    None => "schema not generated".to_string(),
                },
            })?;

        let validator = self.build_options().build(schema).map_err(|e| {
            SchemaValidationError::ValidatorBuildError {
                schema_name: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(schema = key, "compiled validator");
        // A concurrent caller may have compiled the same schema first; keep theirs.
        let cached = Arc::clone(
            self.cache
                .write()
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(validator)),
        );
        Ok(cached)
    }

    /// Validate a parsed JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidationFailed` with every
    /// violation if the document is invalid.
    pub fn validate_document(
        &self,
        instance: &Value,
        schema_name: &str,
    ) -> Result<(), SchemaValidationError> {
        let validator = self.build_validator(schema_name)?;

        let errors: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: schema_key(schema_name).to_string(),
                violations: ValidationViolations { violations: errors },
            })
        }
    }

    /// Whether `instance` conforms to `schema_name`.
    ///
    /// # Errors
    ///
    /// Fails only if the schema cannot be loaded or compiled.
    pub fn is_valid(&self, instance: &Value, schema_name: &str) -> Result<bool, SchemaValidationError> {
        Ok(self.build_validator(schema_name)?.is_valid(instance))
    }

    /// Validate a YAML or JSON document file against a schema.
    ///
    /// Determines the format from the file extension (`.yaml`/`.yml` for
    /// YAML, anything else is read as JSON).
    pub fn validate_file(
        &self,
        document_path: &Path,
        schema_name: &str,
    ) -> Result<(), SchemaValidationError> {
        let value = load_document(document_path)?;
        self.validate_document(&value, schema_name)
    }
}

/// Read a JSON or YAML document, by extension.
pub fn load_document(path: &Path) -> Result<Value, SchemaValidationError> {
    let load_error = |reason: String| SchemaValidationError::DocumentLoadError {
        path: path.display().to_string(),
        reason,
    };
    let content =
        std::fs::read_to_string(path).map_err(|e| load_error(format!("cannot read file: {e}")))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| load_error(format!("invalid YAML: {e}")))?;
            yaml_to_json_value(&yaml).map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))
        }
        _ => serde_json::from_str(&content).map_err(|e| load_error(format!("invalid JSON: {e}"))),
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped; scalar map keys are stringified.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use flowmirror_core::workflow_data_model;
    use serde_json::json;
    use std::sync::OnceLock;

    fn validator() -> &'static SchemaValidator {
        static VALIDATOR: OnceLock<SchemaValidator> = OnceLock::new();
        VALIDATOR.get_or_init(|| {
            let registry =
                SchemaRegistry::generate(&workflow_data_model(), &GeneratorConfig::default()).unwrap();
            SchemaValidator::from_registry(&registry)
        })
    }

    #[test]
    fn test_validator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaValidator>();
    }

    #[test]
    fn test_names_with_or_without_suffix() {
        let v = validator();
        assert!(v.get_schema("Flow").is_some());
        assert!(v.get_schema("Flow.schema.json").is_some());
        assert!(v.schema_names().contains(&"EdgeWhereUniqueInput"));
    }

    #[test]
    fn test_unknown_schema() {
        let err = validator().validate_document(&json!({}), "Nope").unwrap_err();
        assert!(matches!(err, SchemaValidationError::SchemaLoadError { .. }));
    }

    #[test]
    fn test_violation_paths() {
        let err = validator()
            .validate_document(&json!({ "name": 7, "method": "TRACE" }), "FlowOptionalDefaults")
            .unwrap_err();
        let violations = err.violations().unwrap();
        assert!(violations.touches("/name"), "{violations}");
        assert!(violations.touches("/method"), "{violations}");
    }

    #[test]
    fn test_cross_schema_reference_resolves() {
        let v = validator();
        let query = json!({
            "where": { "flow": { "is": { "name": { "startsWith": "nightly" } } } },
            "orderBy": { "createdAt": "desc" },
            "take": 10
        });
        assert!(v.is_valid(&query, "NodeFindManyArgs").unwrap());
        let bad = json!({ "where": { "flow": { "is": { "name": { "startsWith": 3 } } } } });
        assert!(!v.is_valid(&bad, "NodeFindManyArgs").unwrap());
    }

    #[test]
    fn test_validator_cache_reused() {
        let v = validator();
        let a = v.build_validator("Edge").unwrap();
        let b = v.build_validator("Edge.schema.json").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_yaml_to_json_conversion() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("a: 1\nb: [true, null]\nc: 1.5\n").unwrap();
        let value = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(value, json!({ "a": 1, "b": [true, null], "c": 1.5 }));
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/required".to_string(),
            message: "\"name\" is a required property".to_string(),
        };
        assert_eq!(v.to_string(), "  (root): \"name\" is a required property");
    }
}
