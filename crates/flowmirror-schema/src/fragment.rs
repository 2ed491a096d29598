//! # Schema Fragments
//!
//! Small constructors for the JSON Schema pieces every generator module
//! assembles: cross-schema references, nullability, arrays, string enums,
//! the value schema of each scalar type, and [`ObjectSchema`], the single
//! place object schemas are built (so `additionalProperties` is applied
//! uniformly).

use std::collections::BTreeSet;

use flowmirror_core::{FieldDef, FieldType, ScalarType};
use serde_json::{json, Map, Value};

/// File suffix of every emitted schema; also the suffix of every `$ref`.
pub const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// Shape of an RFC 3339 date-time with optional fractional seconds. Calendar
/// and clock ranges are checked by the `date-time` format.
pub const DATETIME_PATTERN: &str =
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$";

/// Decimal literal in string form.
pub const DECIMAL_PATTERN: &str = r"^-?\d+(\.\d+)?$";

/// Standard base64 with padding.
pub const BASE64_PATTERN: &str =
    r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$";

/// A lazy reference to another emitted schema.
pub fn reference(name: &str) -> Value {
    json!({ "$ref": format!("{name}{SCHEMA_FILE_SUFFIX}") })
}

/// Accept `schema` or `null`.
pub fn nullable(schema: Value) -> Value {
    json!({ "anyOf": [schema, { "type": "null" }] })
}

/// Accept any one of `variants`.
pub fn any_of(variants: Vec<Value>) -> Value {
    json!({ "anyOf": variants })
}

/// An array of `items`.
pub fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

/// A single `schema` or an array of them.
pub fn one_or_many(schema: Value) -> Value {
    any_of(vec![schema.clone(), array_of(schema)])
}

/// A closed set of strings.
pub fn string_enum<I, S>(values: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let values: Vec<Value> = values.into_iter().map(|v| Value::String(v.into())).collect();
    json!({ "type": "string", "enum": values })
}

/// `true`/`false`.
pub fn boolean() -> Value {
    json!({ "type": "boolean" })
}

/// A non-negative integer (`take`, `skip`).
pub fn non_negative_integer() -> Value {
    json!({ "type": "integer", "minimum": 0 })
}

/// The value schema of a scalar type.
pub fn scalar_value(ty: ScalarType) -> Value {
    match ty {
        ScalarType::String => json!({ "type": "string" }),
        ScalarType::Int => json!({
            "type": "integer",
            "minimum": i32::MIN,
            "maximum": i32::MAX
        }),
        ScalarType::BigInt => json!({ "type": "integer" }),
        ScalarType::Float => json!({ "type": "number" }),
        ScalarType::Decimal => any_of(vec![
            json!({ "type": "number" }),
            json!({ "type": "string", "pattern": DECIMAL_PATTERN }),
        ]),
        ScalarType::Boolean => boolean(),
        ScalarType::DateTime => json!({
            "type": "string",
            "format": "date-time",
            "pattern": DATETIME_PATTERN
        }),
        ScalarType::Json => json!({}),
        ScalarType::Bytes => json!({ "type": "string", "pattern": BASE64_PATTERN }),
    }
}

/// The value schema of a column's type, ignoring nullability.
pub fn type_value(ty: &FieldType) -> Value {
    match ty {
        FieldType::Scalar(s) => scalar_value(*s),
        FieldType::Enum(name) => reference(name),
    }
}

/// The value schema of a column, `null` included when the column is nullable.
pub fn field_value(field: &FieldDef) -> Value {
    let value = type_value(&field.field_type);
    if field.optional {
        nullable(value)
    } else {
        value
    }
}

/// Builder for object schemas.
///
/// Properties keep insertion order in `required`; the property map itself
/// follows `serde_json`'s map ordering.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    properties: Map<String, Value>,
    required: Vec<String>,
    strict: bool,
    description: Option<String>,
    any_of_required: Vec<Vec<String>>,
}

impl ObjectSchema {
    /// An empty object schema; `strict` sets `additionalProperties: false`.
    pub fn new(strict: bool) -> Self {
        Self {
            properties: Map::new(),
            required: Vec::new(),
            strict,
            description: None,
            any_of_required: Vec::new(),
        }
    }

    /// Add an optional property.
    pub fn property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Add a required property.
    pub fn required(mut self, name: impl Into<String>, schema: Value) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), schema);
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Add a property, required or not.
    pub fn property_if(self, name: impl Into<String>, schema: Value, required: bool) -> Self {
        if required {
            self.required(name, schema)
        } else {
            self.property(name, schema)
        }
    }

    /// Add an optional property when `schema` is present.
    pub fn property_opt(self, name: impl Into<String>, schema: Option<Value>) -> Self {
        match schema {
            Some(schema) => self.property(name, schema),
            None => self,
        }
    }

    /// Require at least one of the given property sets to be present.
    pub fn require_one_of(mut self, alternatives: Vec<Vec<String>>) -> Self {
        self.any_of_required = alternatives;
        self
    }

    /// Attach a description.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description.map(str::to_string);
        self
    }

    /// Whether a property of this name was added.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Finish the schema.
    pub fn build(self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        if let Some(description) = self.description {
            schema.insert("description".to_string(), Value::String(description));
        }
        schema.insert("properties".to_string(), Value::Object(self.properties));
        if !self.required.is_empty() {
            schema.insert("required".to_string(), json!(self.required));
        }
        if !self.any_of_required.is_empty() {
            let alternatives: Vec<Value> = self
                .any_of_required
                .into_iter()
                .map(|fields| json!({ "required": fields }))
                .collect();
            schema.insert("anyOf".to_string(), Value::Array(alternatives));
        }
        if self.strict {
            schema.insert("additionalProperties".to_string(), Value::Bool(false));
        }
        Value::Object(schema)
    }
}

/// Names of every schema `schema` references, with the file suffix removed.
///
/// Local (`#...`) references are skipped.
pub fn referenced_names(schema: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_refs(schema, &mut names);
    names
}

fn collect_refs(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "$ref" {
                    if let Some(target) = child.as_str() {
                        if !target.starts_with('#') {
                            let name = target.strip_suffix(SCHEMA_FILE_SUFFIX).unwrap_or(target);
                            names.insert(name.to_string());
                        }
                    }
                } else {
                    collect_refs(child, names);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, names)),
        _ => {}
    }
}
