//! # Strictness Audit
//!
//! Query inputs and operation arguments are closed shapes: a misspelled
//! key (`orderby`, `wher`) must be rejected, not silently ignored. This
//! module walks generated schemas and reports every object sub-schema
//! that leaves `additionalProperties` open.
//!
//! An object sub-schema is any schema with `"type": "object"` or a
//! `properties` map. `additionalProperties` given as a schema restricts
//! extra keys and is accepted. Json columns (`{}`) are not objects and are
//! never reported.

use serde_json::Value;

use crate::registry::{SchemaGroup, SchemaRegistry};

/// One open object sub-schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalPropertiesFinding {
    /// Schema the finding belongs to.
    pub schema: String,
    /// JSON Pointer to the `additionalProperties` keyword (present or not).
    pub json_path: String,
    /// The current value, or a note that it is absent.
    pub current_value: String,
    /// What to change.
    pub recommendation: String,
}

impl std::fmt::Display for AdditionalPropertiesFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}: {} ({})",
            self.schema, self.json_path, self.current_value, self.recommendation
        )
    }
}

/// Audit one schema body.
pub fn audit_additional_properties(name: &str, schema: &Value) -> Vec<AdditionalPropertiesFinding> {
    let mut findings = Vec::new();
    walk(name, schema, "", &mut findings);
    findings
}

/// Audit every query-input and argument schema of `registry`.
pub fn audit_registry(registry: &SchemaRegistry) -> Vec<AdditionalPropertiesFinding> {
    let mut findings = Vec::new();
    for group in [SchemaGroup::QueryInput, SchemaGroup::Arguments] {
        for name in registry.names_in(group) {
            if let Some(body) = registry.get(name) {
                findings.extend(audit_additional_properties(name, body));
            }
        }
    }
    tracing::debug!(findings = findings.len(), "audited schema strictness");
    findings
}

fn is_object_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("object") || schema.get("properties").is_some()
}

fn walk(name: &str, schema: &Value, path: &str, findings: &mut Vec<AdditionalPropertiesFinding>) {
    let Value::Object(map) = schema else {
        return;
    };

    if is_object_schema(schema) {
        let current = match map.get("additionalProperties") {
            Some(Value::Bool(false)) | Some(Value::Object(_)) => None,
            Some(Value::Bool(true)) => Some("true".to_string()),
            Some(other) => Some(other.to_string()),
            None => Some("(absent, defaults to true)".to_string()),
        };
        if let Some(current_value) = current {
            findings.push(AdditionalPropertiesFinding {
                schema: name.to_string(),
                json_path: format!("{path}/additionalProperties"),
                current_value,
                recommendation: "Set to false so unknown keys are rejected".to_string(),
            });
        }
    }

    if let Some(Value::Object(properties)) = map.get("properties") {
        for (key, child) in properties {
            walk(name, child, &format!("{path}/properties/{key}"), findings);
        }
    }
    if let Some(items) = map.get("items") {
        walk(name, items, &format!("{path}/items"), findings);
    }
    for keyword in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = map.get(keyword) {
            for (i, variant) in variants.iter().enumerate() {
                walk(name, variant, &format!("{path}/{keyword}/{i}"), findings);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use flowmirror_core::workflow_data_model;
    use serde_json::json;

    #[test]
    fn test_strict_registry_has_no_findings() {
        let registry =
            SchemaRegistry::generate(&workflow_data_model(), &GeneratorConfig::default()).unwrap();
        let findings = audit_registry(&registry);
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn test_lenient_registry_reports_every_input() {
        let config = GeneratorConfig {
            strict_objects: false,
            ..GeneratorConfig::default()
        };
        let registry = SchemaRegistry::generate(&workflow_data_model(), &config).unwrap();
        let findings = audit_registry(&registry);
        assert!(findings.iter().any(|f| f.schema == "FlowWhereInput" && f.json_path == "/additionalProperties"));
        assert!(findings.iter().any(|f| f.schema == "EdgeFindManyArgs"));
    }

    #[test]
    fn test_nested_paths() {
        let schema = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "data": { "anyOf": [ { "type": "object", "properties": {} }, { "type": "null" } ] },
                "meta": {},
                "rows": { "type": "array", "items": { "properties": { "a": {} }, "additionalProperties": true } },
                "lookup": { "anyOf": [ { "required": ["id"] } ] }
            }
        });
        let findings = audit_additional_properties("Sample", &schema);
        let paths: Vec<&str> = findings.iter().map(|f| f.json_path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "/properties/data/anyOf/0/additionalProperties",
                "/properties/rows/items/additionalProperties",
            ]
        );
        assert_eq!(findings[1].current_value, "true");
    }
}
