//! Integration test: the generated schemas accept exactly what the workflow
//! data model permits.
//!
//! Nulls are accepted where a column is nullable and omissions where a
//! column has a default; wrong types, missing required columns, and
//! out-of-enum values are rejected.

use std::sync::OnceLock;

use flowmirror_core::{workflow_data_model, FlowMethod, ModelEnum, WORKFLOW_MODELS};
use flowmirror_schema::{GeneratorConfig, SchemaGroup, SchemaRegistry, SchemaValidator};
use proptest::prelude::*;
use serde_json::{json, Value};

fn registry() -> &'static SchemaRegistry {
    static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        SchemaRegistry::generate(&workflow_data_model(), &GeneratorConfig::default())
            .expect("workflow model generates")
    })
}

fn validator() -> &'static SchemaValidator {
    static VALIDATOR: OnceLock<SchemaValidator> = OnceLock::new();
    VALIDATOR.get_or_init(|| SchemaValidator::from_registry(registry()))
}

fn valid(instance: &Value, schema: &str) -> bool {
    validator()
        .is_valid(instance, schema)
        .unwrap_or_else(|e| panic!("{schema} failed to compile: {e}"))
}

#[test]
fn test_minimal_flow_passes_optional_defaults() {
    assert!(valid(&json!({ "name": "Invoice sync" }), "FlowOptionalDefaults"));
}

#[test]
fn test_flow_without_name_fails() {
    let err = validator()
        .validate_document(&json!({ "description": "no name" }), "FlowOptionalDefaults")
        .unwrap_err();
    let violations = err.violations().expect("validation failure");
    assert!(
        violations.violations().iter().any(|v| v.message.contains("name")),
        "missing-name violation not reported: {violations}"
    );
}

#[test]
fn test_out_of_enum_method_fails() {
    for method in FlowMethod::all() {
        let flow = json!({ "name": "f", "method": method.as_str() });
        assert!(valid(&flow, "FlowOptionalDefaults"), "{method} rejected");
    }
    let err = validator()
        .validate_document(&json!({ "name": "f", "method": "TRACE" }), "FlowOptionalDefaults")
        .unwrap_err();
    assert!(err.violations().unwrap().touches("/method"));
}

#[test]
fn test_edge_compound_lookup() {
    let key = json!({ "sourceNodeId": "n1", "targetNodeId": "n2" });
    assert!(valid(&key, "EdgeSourceNodeIdTargetNodeIdCompoundUniqueInput"));
    assert!(valid(
        &json!({ "sourceNodeId_targetNodeId": key }),
        "EdgeWhereUniqueInput"
    ));

    assert!(!valid(&json!({ "sourceNodeId": "n1" }), "EdgeSourceNodeIdTargetNodeIdCompoundUniqueInput"));
    assert!(!valid(&json!({}), "EdgeWhereUniqueInput"), "lookup without a key accepted");
    assert!(
        !valid(&json!({ "label": "x" }), "EdgeWhereUniqueInput"),
        "lookup by non-unique column accepted"
    );
    assert!(valid(&json!({ "id": "e1", "label": { "contains": "retry" } }), "EdgeWhereUniqueInput"));
}

#[test]
fn test_nullability_follows_columns() {
    let row = json!({
        "id": "ckx1",
        "name": "f",
        "description": null,
        "method": "GET",
        "isEnabled": true,
        "content": null,
        "metadata": { "owner": "ops" },
        "createdAt": "2026-01-05T09:30:00.000Z",
        "updatedAt": "2026-01-05T09:30:00Z",
        "deleted": false,
        "instanceId": null
    });
    assert!(valid(&row, "Flow"));

    let mut nameless = row.clone();
    nameless["name"] = Value::Null;
    assert!(!valid(&nameless, "Flow"));

    let mut missing = row.clone();
    missing.as_object_mut().unwrap().remove("description");
    assert!(!valid(&missing, "Flow"), "row schema must require every column");
    assert!(valid(&missing, "FlowPartial"));
}

#[test]
fn test_scalar_encodings() {
    let base = json!({ "id": 1, "flowId": "f", "totalRuns": 0, "successfulRuns": 0, "failedRuns": 0,
                       "averageDurationMs": 12.5, "lastUpdated": "2026-01-05T09:30:00+02:00" });
    assert!(valid(&base, "FlowStatistics"));

    let mut overflow = base.clone();
    overflow["totalRuns"] = json!(2_147_483_648_i64);
    assert!(!valid(&overflow, "FlowStatistics"), "Int must stay within 32 bits");

    let mut bad_time = base.clone();
    bad_time["lastUpdated"] = json!("yesterday");
    assert!(!valid(&bad_time, "FlowStatistics"));
    for impossible in ["2024-13-45T99:99:99Z", "0000-00-00T00:00:00Z", "2024-02-31T00:00:00Z"] {
        bad_time["lastUpdated"] = json!(impossible);
        assert!(!valid(&bad_time, "FlowStatistics"), "{impossible} accepted");
    }
    bad_time["lastUpdated"] = json!("2024-02-29T23:59:59.5Z");
    assert!(valid(&bad_time, "FlowStatistics"), "leap day rejected");

    let mut fractional = base;
    fractional["failedRuns"] = json!(1.5);
    assert!(!valid(&fractional, "FlowStatistics"));
}

#[test]
fn test_unknown_keys_rejected_when_strict() {
    assert!(!valid(&json!({ "name": "f", "nmae": "typo" }), "FlowOptionalDefaults"));
    assert!(!valid(&json!({ "wher": {} }), "FlowFindManyArgs"));
}

#[test]
fn test_nested_create_payload() {
    let create = json!({
        "data": {
            "name": "Order pipeline",
            "nodes": {
                "create": [
                    { "rfId": "n1", "type": "TRIGGER" },
                    { "rfId": "n2", "type": "ACTION", "infrastructureId": "inf1" }
                ]
            },
            "tags": { "connect": { "id": "t1" } }
        },
        "select": { "id": true, "nodes": true }
    });
    assert!(valid(&create, "FlowCreateArgs"));

    let mut wrong_type = create.clone();
    wrong_type["data"]["nodes"]["create"][0]["type"] = json!("SPLIT");
    assert!(!valid(&wrong_type, "FlowCreateArgs"));
}

#[test]
fn test_group_by_payload() {
    let group_by = json!({
        "by": ["status"],
        "where": { "startedBy": { "in": ["MANUAL", "API"] } },
        "_count": { "_all": true },
        "having": { "flowId": { "not": "f1" } }
    });
    assert!(valid(&group_by, "FlowRunGroupByArgs"));
    assert!(!valid(&json!({ "by": ["nope"] }), "FlowRunGroupByArgs"));
}

#[test]
fn test_every_entity_and_find_many_compiles() {
    for name in registry().names_in(SchemaGroup::Entity) {
        validator()
            .build_validator(name)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
    }
    for model in WORKFLOW_MODELS {
        let name = format!("{model}FindManyArgs");
        validator()
            .build_validator(&name)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
    }
}

#[test]
fn test_every_model_has_full_family() {
    for model in WORKFLOW_MODELS {
        for suffix in [
            "",
            "OptionalDefaults",
            "Partial",
            "WithRelations",
            "WhereInput",
            "WhereUniqueInput",
            "OrderByWithRelationInput",
            "CreateInput",
            "UncheckedUpdateManyInput",
            "FindUniqueArgs",
            "GroupByArgs",
        ] {
            let name = format!("{model}{suffix}");
            assert!(registry().contains(&name), "missing {name}");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_any_name_and_optional_columns_accepted(
        name in ".{0,40}",
        description in proptest::option::of(".{0,40}"),
        enabled in any::<bool>(),
    ) {
        let flow = json!({ "name": name, "description": description, "isEnabled": enabled });
        prop_assert!(valid(&flow, "FlowOptionalDefaults"));
    }

    #[test]
    fn prop_unknown_methods_rejected(method in "[A-Z]{2,8}") {
        prop_assume!(method.parse::<FlowMethod>().is_err());
        let flow = json!({ "name": "f", "method": method });
        prop_assert!(!valid(&flow, "FlowOptionalDefaults"));
    }
}
