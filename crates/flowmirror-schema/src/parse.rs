//! # Entity Parsing
//!
//! Validate an insert payload for a model against `MOptionalDefaults`,
//! then complete it with the model's declared defaults. The result is the
//! row the database would store, minus sequence-assigned columns.

use chrono::{DateTime, Utc};
use flowmirror_core::{DataModel, MirrorError};
use serde_json::Value;
use thiserror::Error;

use crate::config::GeneratorConfig;
use crate::registry::{GenerationError, SchemaRegistry};
use crate::validate::{SchemaValidationError, SchemaValidator};

/// Error parsing an entity payload.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The data model declares no such model.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The payload does not conform to the model's insert schema.
    #[error(transparent)]
    Invalid(#[from] SchemaValidationError),

    /// Defaults could not be applied.
    #[error("cannot apply defaults: {0}")]
    Defaults(#[from] MirrorError),
}

/// Validates and completes insert payloads for one data model.
#[derive(Debug)]
pub struct EntityParser {
    model: DataModel,
    validator: SchemaValidator,
}

impl EntityParser {
    /// Pair a data model with a validator over its generated schemas.
    pub fn new(model: DataModel, validator: SchemaValidator) -> Self {
        Self { model, validator }
    }

    /// Generate the entity schemas of `model` and build a parser over them.
    pub fn generate(model: DataModel) -> Result<Self, GenerationError> {
        let config = GeneratorConfig::entities_only();
        let registry = SchemaRegistry::generate(&model, &config)?;
        let validator = SchemaValidator::from_registry(&registry);
        Ok(Self::new(model, validator))
    }

    /// The data model.
    pub fn model(&self) -> &DataModel {
        &self.model
    }

    /// The underlying validator.
    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Validate `payload` as a new `model_name` row and fill its defaults.
    pub fn parse(&self, model_name: &str, payload: Value) -> Result<Value, ParseError> {
        self.parse_at(model_name, payload, Utc::now())
    }

    /// As [`parse`](Self::parse), with `now` as the current instant.
    pub fn parse_at(
        &self,
        model_name: &str,
        mut payload: Value,
        now: DateTime<Utc>,
    ) -> Result<Value, ParseError> {
        let m = self
            .model
            .model(model_name)
            .ok_or_else(|| ParseError::UnknownModel(model_name.to_string()))?;
        self.validator
            .validate_document(&payload, &format!("{model_name}OptionalDefaults"))?;
        m.apply_defaults_at(&mut payload, now)?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flowmirror_core::{is_cuid, workflow_data_model};
    use serde_json::json;

    fn parser() -> EntityParser {
        EntityParser::generate(workflow_data_model()).unwrap()
    }

    #[test]
    fn test_parse_fills_defaults() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let flow = parser()
            .parse_at("Flow", json!({ "name": "Invoice sync" }), now)
            .unwrap();
        assert_eq!(flow["method"], "POST");
        assert_eq!(flow["isEnabled"], true);
        assert_eq!(flow["deleted"], false);
        assert_eq!(flow["createdAt"], "2026-03-01T12:00:00.000Z");
        assert_eq!(flow["description"], Value::Null);
        assert!(is_cuid(flow["id"].as_str().unwrap()));
    }

    #[test]
    fn test_parse_rejects_invalid_payload() {
        let err = parser().parse("Flow", json!({ "method": "POST" })).unwrap_err();
        assert!(matches!(err, ParseError::Invalid(_)));
    }

    #[test]
    fn test_parse_rejects_impossible_timestamp() {
        let err = parser()
            .parse("Flow", json!({ "name": "x", "createdAt": "2024-02-31T00:00:00Z" }))
            .unwrap_err();
        assert!(matches!(err, ParseError::Invalid(_)));
    }

    #[test]
    fn test_parse_unknown_model() {
        let err = parser().parse("Widget", json!({})).unwrap_err();
        assert!(matches!(err, ParseError::UnknownModel(ref m) if m == "Widget"));
    }

    #[test]
    fn test_parse_leaves_serial_ids_to_the_database() {
        let event = parser()
            .parse(
                "FlowEvent",
                json!({ "flowRunId": "r1", "flowId": "f1", "nodeId": "n1", "startedBy": "MANUAL" }),
            )
            .unwrap();
        assert!(event.get("id").is_none());
        assert!(event["timestamp"].is_string());
    }
}
