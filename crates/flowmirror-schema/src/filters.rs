//! # Leaf Schemas
//!
//! Schemas that depend on no model: the declared enums, sort and
//! null-handling modes, per-scalar filters, and per-scalar field update
//! operations. Filters and update operations are emitted for every scalar
//! type a column uses and for every declared enum, each in a nullable and
//! a non-nullable flavor.
//!
//! | Name | Shape |
//! |------|-------|
//! | `<S>Filter`, `<S>NullableFilter` | `equals`, `in`, `notIn`, `not`, plus comparison and text operators by type |
//! | `Nested<S>Filter`, `Nested<S>NullableFilter` | same, without `mode`; target of `not` |
//! | `Enum<E>Filter`, `NestedEnum<E>Filter` (+ `Nullable`) | `equals`, `in`, `notIn`, `not` |
//! | `JsonFilter`, `JsonNullableFilter` | path and containment operators |
//! | `<S>FieldUpdateOperationsInput`, `Nullable<S>…` | `set`; numeric types add `increment`, `decrement`, `multiply`, `divide` |
//! | `Enum<E>FieldUpdateOperationsInput`, `NullableEnum<E>…` | `set` |
//!
//! `S` is the scalar stem: the type name, with `Boolean` shortened to `Bool`.

use flowmirror_core::{DataModel, EnumDef, FieldDef, FieldType, ScalarType};
use serde_json::{json, Value};

use crate::fragment::{any_of, array_of, nullable, reference, scalar_value, string_enum};
use crate::registry::{Emitter, GenerationError, SchemaGroup};

/// Name of the filter a column of type `ty` is matched with.
pub fn filter_name(ty: &FieldType, nullable: bool) -> String {
    filter_name_with(ty, nullable, false)
}

fn filter_name_with(ty: &FieldType, nullable: bool, nested: bool) -> String {
    let prefix = if nested { "Nested" } else { "" };
    let null = if nullable { "Nullable" } else { "" };
    match ty {
        FieldType::Scalar(ScalarType::Json) => format!("Json{null}Filter"),
        FieldType::Scalar(s) => format!("{prefix}{}{null}Filter", s.schema_stem()),
        FieldType::Enum(e) => format!("{prefix}Enum{e}{null}Filter"),
    }
}

/// Name of the update operation input for a column of type `ty`.
///
/// Json columns have none: they are always written whole.
pub fn update_operations_name(ty: &FieldType, nullable: bool) -> Option<String> {
    let null = if nullable { "Nullable" } else { "" };
    match ty {
        FieldType::Scalar(s) if !s.has_update_operations() => None,
        FieldType::Scalar(s) => Some(format!("{null}{}FieldUpdateOperationsInput", s.schema_stem())),
        FieldType::Enum(e) => Some(format!("{null}Enum{e}FieldUpdateOperationsInput")),
    }
}

/// The where-clause schema of a column: its filter or a bare value.
///
/// Json columns only take the filter object.
pub fn field_filter(field: &FieldDef) -> Value {
    let filter = reference(&filter_name(&field.field_type, field.optional));
    if field.scalar_type() == Some(ScalarType::Json) {
        return filter;
    }
    any_of(vec![filter, crate::fragment::field_value(field)])
}

/// The write schema of a Json column.
pub fn json_write(nullable: bool) -> Value {
    let sentinel = if nullable {
        "NullableJsonNullValueInput"
    } else {
        "JsonNullValueInput"
    };
    any_of(vec![reference(sentinel), json!({})])
}

/// The create-time schema of a column.
pub fn field_create(field: &FieldDef) -> Value {
    match field.scalar_type() {
        Some(ScalarType::Json) => json_write(field.optional),
        _ => crate::fragment::field_value(field),
    }
}

/// The update-time schema of a column: a bare value or its update operations.
pub fn field_update(field: &FieldDef) -> Value {
    let value = field_create(field);
    match update_operations_name(&field.field_type, field.optional) {
        Some(ops) => any_of(vec![value, reference(&ops)]),
        None => value,
    }
}

/// Emit every leaf schema for `model`.
pub(crate) fn emit_leaves(e: &mut Emitter<'_>, model: &DataModel) -> Result<(), GenerationError> {
    emit_modes(e)?;
    for def in &model.enums {
        e.emit(SchemaGroup::Enum, def.name.clone(), enum_schema(def))?;
    }
    if !e.config().query_inputs {
        return Ok(());
    }
    for ty in model.used_scalar_types() {
        emit_scalar_filters(e, ty)?;
        emit_scalar_updates(e, ty)?;
    }
    for def in &model.enums {
        emit_enum_filters(e, def)?;
        emit_enum_updates(e, def)?;
    }
    Ok(())
}

fn enum_schema(def: &EnumDef) -> Value {
    let mut schema = string_enum(def.values.iter().cloned());
    if let (Some(doc), Value::Object(map)) = (&def.doc, &mut schema) {
        map.insert("description".to_string(), Value::String(doc.clone()));
    }
    schema
}

fn emit_modes(e: &mut Emitter<'_>) -> Result<(), GenerationError> {
    e.emit(SchemaGroup::Enum, "SortOrder", string_enum(["asc", "desc"]))?;
    e.emit(SchemaGroup::Enum, "NullsOrder", string_enum(["first", "last"]))?;
    e.emit(SchemaGroup::Enum, "QueryMode", string_enum(["default", "insensitive"]))?;
    e.emit(SchemaGroup::Enum, "JsonNullValueInput", string_enum(["JsonNull"]))?;
    e.emit(
        SchemaGroup::Enum,
        "NullableJsonNullValueInput",
        string_enum(["DbNull", "JsonNull"]),
    )?;
    e.emit(
        SchemaGroup::Enum,
        "JsonNullValueFilter",
        string_enum(["DbNull", "JsonNull", "AnyNull"]),
    )?;
    if e.config().query_inputs {
        let sort_order_input = e
            .object()
            .required("sort", reference("SortOrder"))
            .property("nulls", reference("NullsOrder"))
            .build();
        e.emit(SchemaGroup::QueryInput, "SortOrderInput", sort_order_input)?;
    }
    Ok(())
}

fn emit_scalar_filters(e: &mut Emitter<'_>, ty: ScalarType) -> Result<(), GenerationError> {
    if ty == ScalarType::Json {
        for null in [false, true] {
            let name = filter_name(&FieldType::Scalar(ty), null);
            let body = json_filter(e, null);
            e.emit(SchemaGroup::ScalarFilter, name, body)?;
        }
        return Ok(());
    }

    let field_type = FieldType::Scalar(ty);
    for nested in [false, true] {
        for null in [false, true] {
            let name = filter_name_with(&field_type, null, nested);
            let value = scalar_value(ty);
            let mut filter = base_filter(e, &field_type, value.clone(), null);
            if ty.is_ordered() {
                for op in ["lt", "lte", "gt", "gte"] {
                    filter = filter.property(op, value.clone());
                }
            }
            if ty.is_textual() {
                for op in ["contains", "startsWith", "endsWith"] {
                    filter = filter.property(op, value.clone());
                }
                if !nested {
                    filter = filter.property("mode", reference("QueryMode"));
                }
            }
            e.emit(SchemaGroup::ScalarFilter, name, filter.build())?;
        }
    }
    Ok(())
}

fn emit_enum_filters(e: &mut Emitter<'_>, def: &EnumDef) -> Result<(), GenerationError> {
    let field_type = FieldType::Enum(def.name.clone());
    for nested in [false, true] {
        for null in [false, true] {
            let name = filter_name_with(&field_type, null, nested);
            let filter = base_filter(e, &field_type, reference(&def.name), null);
            e.emit(SchemaGroup::ScalarFilter, name, filter.build())?;
        }
    }
    Ok(())
}

/// `equals`, `in`, `notIn`, and `not` over `value`.
fn base_filter(
    e: &Emitter<'_>,
    field_type: &FieldType,
    value: Value,
    null: bool,
) -> crate::fragment::ObjectSchema {
    let list = array_of(value.clone());
    let not = any_of(vec![
        value.clone(),
        reference(&filter_name_with(field_type, null, true)),
    ]);
    let wrap = |v: Value| if null { nullable(v) } else { v };
    e.object()
        .property("equals", wrap(value))
        .property("in", wrap(list.clone()))
        .property("notIn", wrap(list))
        .property("not", wrap(not))
}

fn json_filter(e: &Emitter<'_>, null: bool) -> Value {
    let any = json!({});
    let text = scalar_value(ScalarType::String);
    let equals = any_of(vec![reference("JsonNullValueFilter"), any.clone()]);
    let mut filter = e
        .object()
        .property("equals", equals.clone())
        .property("path", array_of(text.clone()));
    for op in ["string_contains", "string_starts_with", "string_ends_with"] {
        filter = filter.property(op, text.clone());
    }
    for op in ["array_contains", "array_starts_with", "array_ends_with"] {
        filter = filter.property(op, nullable(any.clone()));
    }
    for op in ["lt", "lte", "gt", "gte"] {
        filter = filter.property(op, any.clone());
    }
    let not = if null { nullable(equals) } else { equals };
    filter.property("not", not).build()
}

fn emit_scalar_updates(e: &mut Emitter<'_>, ty: ScalarType) -> Result<(), GenerationError> {
    let field_type = FieldType::Scalar(ty);
    for null in [false, true] {
        let Some(name) = update_operations_name(&field_type, null) else {
            continue;
        };
        let value = scalar_value(ty);
        let set = if null { nullable(value.clone()) } else { value.clone() };
        let mut ops = e.object().property("set", set);
        if ty.is_numeric() {
            for op in ["increment", "decrement", "multiply", "divide"] {
                ops = ops.property(op, value.clone());
            }
        }
        e.emit(SchemaGroup::FieldUpdate, name, ops.build())?;
    }
    Ok(())
}

fn emit_enum_updates(e: &mut Emitter<'_>, def: &EnumDef) -> Result<(), GenerationError> {
    let field_type = FieldType::Enum(def.name.clone());
    for null in [false, true] {
        if let Some(name) = update_operations_name(&field_type, null) {
            let value = reference(&def.name);
            let set = if null { nullable(value) } else { value };
            let ops = e.object().property("set", set).build();
            e.emit(SchemaGroup::FieldUpdate, name, ops)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_names() {
        let bool_ty = FieldType::Scalar(ScalarType::Boolean);
        assert_eq!(filter_name(&bool_ty, false), "BoolFilter");
        assert_eq!(filter_name_with(&bool_ty, true, true), "NestedBoolNullableFilter");
        let status = FieldType::Enum("RunStatus".to_string());
        assert_eq!(filter_name(&status, true), "EnumRunStatusNullableFilter");
        assert_eq!(filter_name_with(&status, false, true), "NestedEnumRunStatusFilter");
        let json_ty = FieldType::Scalar(ScalarType::Json);
        assert_eq!(filter_name_with(&json_ty, true, true), "JsonNullableFilter");
    }

    #[test]
    fn test_update_operation_names() {
        let int = FieldType::Scalar(ScalarType::Int);
        assert_eq!(
            update_operations_name(&int, true).as_deref(),
            Some("NullableIntFieldUpdateOperationsInput")
        );
        let role = FieldType::Enum("UserRole".to_string());
        assert_eq!(
            update_operations_name(&role, false).as_deref(),
            Some("EnumUserRoleFieldUpdateOperationsInput")
        );
        assert!(update_operations_name(&FieldType::Scalar(ScalarType::Json), false).is_none());
    }

    #[test]
    fn test_field_update_for_json_is_whole_value() {
        let field = FieldDef::new("metadata", ScalarType::Json).optional();
        let update = field_update(&field);
        assert_eq!(update, json_write(true));
    }
}
