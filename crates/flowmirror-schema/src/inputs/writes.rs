//! Write-side inputs: create and update payloads, and nested relation writes.
//!
//! Checked inputs address related rows through nested writes and never
//! carry foreign-key columns. Unchecked inputs carry the foreign-key
//! columns instead and keep nested writes only for relations whose keys
//! live on the other side.

use flowmirror_core::{DataModel, FieldDef, ModelDef, RelationDef};
use serde_json::Value;

use super::Link;
use crate::filters::{field_create, field_update};
use crate::fragment::{any_of, boolean, one_or_many, reference};
use crate::registry::{Emitter, GenerationError, SchemaGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Checked,
    Unchecked,
}

/// Top-level create and update inputs of `m`.
pub(super) fn emit_writes(
    e: &mut Emitter<'_>,
    model: &DataModel,
    m: &ModelDef,
) -> Result<(), GenerationError> {
    let create = create_object(e, model, m, Mode::Checked, None)?;
    e.emit(SchemaGroup::QueryInput, format!("{}CreateInput", m.name), create)?;
    let create = create_object(e, model, m, Mode::Unchecked, None)?;
    e.emit(SchemaGroup::QueryInput, format!("{}UncheckedCreateInput", m.name), create)?;

    let create_many = columns(m, Mode::Unchecked, None)
        .fold(e.object(), |obj, f| {
            obj.property_if(f.name.clone(), field_create(f), !f.may_omit_on_create())
        })
        .build();
    e.emit(SchemaGroup::QueryInput, format!("{}CreateManyInput", m.name), create_many)?;

    let update = update_object(e, model, m, Mode::Checked, None)?;
    e.emit(SchemaGroup::QueryInput, format!("{}UpdateInput", m.name), update)?;
    let update = update_object(e, model, m, Mode::Unchecked, None)?;
    e.emit(SchemaGroup::QueryInput, format!("{}UncheckedUpdateInput", m.name), update)?;

    for (mode, name) in [
        (Mode::Checked, "UpdateManyMutationInput"),
        (Mode::Unchecked, "UncheckedUpdateManyInput"),
    ] {
        let body = columns(m, mode, None)
            .fold(e.object(), |obj, f| obj.property(f.name.clone(), field_update(f)))
            .build();
        e.emit(SchemaGroup::QueryInput, format!("{}{name}", m.name), body)?;
    }
    Ok(())
}

/// Columns a write payload of `m` may carry.
///
/// Checked writes drop foreign keys and sequence-generated columns;
/// unchecked writes drop only the foreign keys of `without`, which the
/// enclosing nested write supplies.
fn columns<'a>(
    m: &'a ModelDef,
    mode: Mode,
    without: Option<&'a RelationDef>,
) -> impl Iterator<Item = &'a FieldDef> + 'a {
    m.fields.iter().filter(move |f| match mode {
        Mode::Checked => !m.is_foreign_key(&f.name) && !f.is_autoincrement(),
        Mode::Unchecked => !without.is_some_and(|b| b.fields.contains(&f.name)),
    })
}

/// Relations a write payload of `m` may nest, with their links.
fn nested<'a>(
    model: &'a DataModel,
    m: &'a ModelDef,
    mode: Mode,
    without: Option<&RelationDef>,
) -> Result<Vec<Link<'a>>, GenerationError> {
    m.relations
        .iter()
        .filter(|r| without.map_or(true, |b| b.name != r.name))
        .filter(|r| mode == Mode::Checked || !r.is_owning())
        .map(|r| Link::resolve(model, m, r))
        .collect()
}

fn create_object(
    e: &Emitter<'_>,
    model: &DataModel,
    m: &ModelDef,
    mode: Mode,
    without: Option<&RelationDef>,
) -> Result<Value, GenerationError> {
    let mut obj = columns(m, mode, without).fold(e.object(), |obj, f| {
        obj.property_if(f.name.clone(), field_create(f), !f.may_omit_on_create())
    });
    if e.config().emits_nested_writes() {
        for link in nested(model, m, mode, without)? {
            let required = mode == Mode::Checked && link.relation.is_required();
            obj = obj.property_if(
                link.relation.name.clone(),
                reference(&link.nested_create()),
                required,
            );
        }
    }
    Ok(obj.build())
}

fn update_object(
    e: &Emitter<'_>,
    model: &DataModel,
    m: &ModelDef,
    mode: Mode,
    without: Option<&RelationDef>,
) -> Result<Value, GenerationError> {
    let mut obj = columns(m, mode, without)
        .fold(e.object(), |obj, f| obj.property(f.name.clone(), field_update(f)));
    if e.config().emits_nested_writes() {
        for link in nested(model, m, mode, without)? {
            obj = obj.property(link.relation.name.clone(), reference(&link.nested_update()));
        }
    }
    Ok(obj.build())
}

fn either(checked: &str, unchecked: &str) -> Value {
    any_of(vec![reference(checked), reference(unchecked)])
}

/// Every nested-write schema of one relation.
pub(super) fn emit_nested_family(
    e: &mut Emitter<'_>,
    model: &DataModel,
    link: &Link<'_>,
) -> Result<(), GenerationError> {
    let target = link.target;
    let back = Some(link.back);
    let where_unique = reference(&format!("{}WhereUniqueInput", target.name));

    let body = create_object(e, model, target, Mode::Checked, back)?;
    e.emit(SchemaGroup::QueryInput, link.create_without(), body)?;
    let body = create_object(e, model, target, Mode::Unchecked, back)?;
    e.emit(SchemaGroup::QueryInput, link.unchecked_create_without(), body)?;
    let create = either(&link.create_without(), &link.unchecked_create_without());

    let create_or_connect = e
        .object()
        .required("where", where_unique.clone())
        .required("create", create.clone())
        .build();
    e.emit(SchemaGroup::QueryInput, link.create_or_connect(), create_or_connect)?;

    let body = update_object(e, model, target, Mode::Checked, back)?;
    e.emit(SchemaGroup::QueryInput, link.update_without(), body)?;
    let body = update_object(e, model, target, Mode::Unchecked, back)?;
    e.emit(SchemaGroup::QueryInput, link.unchecked_update_without(), body)?;
    let update = either(&link.update_without(), &link.unchecked_update_without());

    if link.relation.is_many() {
        emit_to_many(e, link, create, update, where_unique)
    } else {
        emit_to_one(e, link, create, update, where_unique)
    }
}

fn emit_to_one(
    e: &mut Emitter<'_>,
    link: &Link<'_>,
    create: Value,
    update: Value,
    where_unique: Value,
) -> Result<(), GenerationError> {
    let target = &link.target.name;
    let where_input = reference(&format!("{target}WhereInput"));
    let create_or_connect = reference(&link.create_or_connect());

    let nested_create = e
        .object()
        .property("create", create.clone())
        .property("connectOrCreate", create_or_connect.clone())
        .property("connect", where_unique.clone())
        .build();
    e.emit(SchemaGroup::QueryInput, link.nested_create(), nested_create)?;

    let upsert = e
        .object()
        .required("update", update.clone())
        .required("create", create.clone())
        .property("where", where_input.clone())
        .build();
    e.emit(SchemaGroup::QueryInput, link.upsert_one(), upsert)?;

    let detach = any_of(vec![boolean(), where_input]);
    let optional = !link.relation.is_required();
    let nested_update = e
        .object()
        .property("create", create)
        .property("connectOrCreate", create_or_connect)
        .property("upsert", reference(&link.upsert_one()))
        .property_opt("disconnect", optional.then(|| detach.clone()))
        .property_opt("delete", optional.then_some(detach))
        .property("connect", where_unique)
        .property("update", update)
        .build();
    e.emit(SchemaGroup::QueryInput, link.nested_update(), nested_update)
}

fn emit_to_many(
    e: &mut Emitter<'_>,
    link: &Link<'_>,
    create: Value,
    update: Value,
    where_unique: Value,
) -> Result<(), GenerationError> {
    let target = link.target;
    let scalar_where = reference(&format!("{}ScalarWhereInput", target.name));
    let create_or_connect = reference(&link.create_or_connect());

    let envelope = if link.has_create_many() {
        let rows = columns(target, Mode::Unchecked, Some(link.back))
            .fold(e.object(), |obj, f| {
                obj.property_if(f.name.clone(), field_create(f), !f.may_omit_on_create())
            })
            .build();
        e.emit(SchemaGroup::QueryInput, link.create_many(), rows)?;
        let envelope = e
            .object()
            .required("data", one_or_many(reference(&link.create_many())))
            .property("skipDuplicates", boolean())
            .build();
        e.emit(SchemaGroup::QueryInput, link.create_many_envelope(), envelope)?;
        Some(reference(&link.create_many_envelope()))
    } else {
        None
    };

    let nested_create = e
        .object()
        .property("create", one_or_many(create.clone()))
        .property("connectOrCreate", one_or_many(create_or_connect.clone()))
        .property_opt("createMany", envelope.clone())
        .property("connect", one_or_many(where_unique.clone()))
        .build();
    e.emit(SchemaGroup::QueryInput, link.nested_create(), nested_create)?;

    let upsert = e
        .object()
        .required("where", where_unique.clone())
        .required("update", update.clone())
        .required("create", create.clone())
        .build();
    e.emit(SchemaGroup::QueryInput, link.upsert_many(), upsert)?;

    let update_one = e
        .object()
        .required("where", where_unique.clone())
        .required("data", update)
        .build();
    e.emit(SchemaGroup::QueryInput, link.update_with_where_unique(), update_one)?;

    let bulk_data = either(
        &format!("{}UpdateManyMutationInput", target.name),
        &format!("{}UncheckedUpdateManyInput", target.name),
    );
    let update_many = e
        .object()
        .required("where", scalar_where.clone())
        .required("data", bulk_data)
        .build();
    e.emit(SchemaGroup::QueryInput, link.update_many_with_where(), update_many)?;

    // Rows that cannot exist without the parent can only be deleted, not detached.
    let detachable = !link.back.is_required();
    let unique_list = one_or_many(where_unique.clone());
    let nested_update = e
        .object()
        .property("create", one_or_many(create))
        .property("connectOrCreate", one_or_many(create_or_connect))
        .property("upsert", one_or_many(reference(&link.upsert_many())))
        .property_opt("createMany", envelope)
        .property_opt("set", detachable.then(|| unique_list.clone()))
        .property_opt("disconnect", detachable.then(|| unique_list.clone()))
        .property("delete", unique_list.clone())
        .property("connect", unique_list)
        .property("update", one_or_many(reference(&link.update_with_where_unique())))
        .property("updateMany", one_or_many(reference(&link.update_many_with_where())))
        .property("deleteMany", one_or_many(scalar_where))
        .build();
    e.emit(SchemaGroup::QueryInput, link.nested_update(), nested_update)
}

#[cfg(test)]
mod tests {
    use crate::config::GeneratorConfig;
    use crate::registry::SchemaRegistry;
    use flowmirror_core::workflow_data_model;
    use serde_json::json;

    fn registry(config: &GeneratorConfig) -> SchemaRegistry {
        SchemaRegistry::generate(&workflow_data_model(), config).unwrap()
    }

    fn required(schema: &serde_json::Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_checked_create_uses_relations() {
        let registry = registry(&GeneratorConfig::default());
        let edge = registry.get("EdgeCreateInput").unwrap();
        assert_eq!(required(edge), ["sourceNode", "targetNode", "flow"]);
        assert!(edge["properties"].get("flowId").is_none());
        assert_eq!(
            edge["properties"]["flow"]["$ref"],
            "FlowCreateNestedOneWithoutEdgesInput.schema.json"
        );
    }

    #[test]
    fn test_unchecked_create_uses_foreign_keys() {
        let registry = registry(&GeneratorConfig::default());
        let edge = registry.get("EdgeUncheckedCreateInput").unwrap();
        assert_eq!(required(edge), ["sourceNodeId", "targetNodeId", "flowId"]);
        assert!(edge["properties"].get("flow").is_none());

        let flow = registry.get("FlowUncheckedCreateInput").unwrap();
        assert!(flow["properties"].get("nodes").is_some());
        assert!(flow["properties"].get("instance").is_none());
        assert!(flow["properties"].get("instanceId").is_some());
    }

    #[test]
    fn test_nested_without_excludes_back_side() {
        let registry = registry(&GeneratorConfig::default());
        let node = registry.get("NodeCreateWithoutFlowInput").unwrap();
        assert!(node["properties"].get("flow").is_none());
        let unchecked = registry.get("NodeUncheckedCreateWithoutFlowInput").unwrap();
        assert!(unchecked["properties"].get("flowId").is_none());
        assert!(unchecked["properties"].get("infrastructureId").is_some());
    }

    #[test]
    fn test_required_parent_cannot_be_disconnected() {
        let registry = registry(&GeneratorConfig::default());
        let required_one = registry.get("FlowUpdateOneRequiredWithoutNodesNestedInput").unwrap();
        assert!(required_one["properties"].get("disconnect").is_none());
        let optional_one = registry.get("InstanceUpdateOneWithoutFlowsNestedInput").unwrap();
        assert!(optional_one["properties"].get("disconnect").is_some());

        let nodes = registry.get("NodeUpdateManyWithoutFlowNestedInput").unwrap();
        assert!(nodes["properties"].get("set").is_none());
        assert!(nodes["properties"].get("createMany").is_some());
        let tags = registry.get("TagUpdateManyWithoutFlowsNestedInput").unwrap();
        assert!(tags["properties"].get("set").is_some());
        assert!(tags["properties"].get("createMany").is_none());
    }

    #[test]
    fn test_create_many_rows_omit_parent_key() {
        let registry = registry(&GeneratorConfig::default());
        let rows = registry.get("EdgeCreateManyFlowInput").unwrap();
        assert!(rows["properties"].get("flowId").is_none());
        assert_eq!(required(rows), ["sourceNodeId", "targetNodeId"]);
        let envelope = registry.get("EdgeCreateManyFlowInputEnvelope").unwrap();
        assert_eq!(envelope["required"], json!(["data"]));
    }

    #[test]
    fn test_update_accepts_values_or_operations() {
        let registry = registry(&GeneratorConfig::default());
        let stats = registry.get("FlowStatisticsUpdateManyMutationInput").unwrap();
        assert_eq!(
            stats["properties"]["totalRuns"]["anyOf"][1]["$ref"],
            "IntFieldUpdateOperationsInput.schema.json"
        );
        assert!(stats.get("required").is_none());
    }

    #[test]
    fn test_without_nested_writes_inputs_carry_columns_only() {
        let config = GeneratorConfig {
            nested_writes: false,
            ..GeneratorConfig::default()
        };
        let registry = registry(&config);
        let flow = registry.get("FlowCreateInput").unwrap();
        assert!(flow["properties"].get("nodes").is_none());
        assert!(!registry.contains("NodeCreateNestedManyWithoutFlowInput"));
    }
}
