//! Read-side inputs: selection, filtering, ordering, and aggregate selection.

use flowmirror_core::{pascal_case, FieldDef, ModelDef, RelationDef, UniqueKey};
use serde_json::Value;

use crate::filters::field_filter;
use crate::fragment::{
    any_of, array_of, boolean, nullable, one_or_many, reference, type_value, ObjectSchema,
};
use crate::registry::{Emitter, GenerationError, SchemaGroup};

/// `MSelect`, `MInclude`, `MArgs`, and the relation-count selection.
pub(super) fn emit_select(e: &mut Emitter<'_>, m: &ModelDef) -> Result<(), GenerationError> {
    let mut select = m
        .fields
        .iter()
        .fold(e.object(), |obj, f| obj.property(f.name.clone(), boolean()));
    select = with_relation_selection(select, m);
    e.emit(SchemaGroup::QueryInput, format!("{}Select", m.name), select.build())?;

    let mut args = e.object().property("select", reference(&format!("{}Select", m.name)));
    if m.has_relations() {
        let include = with_relation_selection(e.object(), m);
        e.emit(SchemaGroup::QueryInput, format!("{}Include", m.name), include.build())?;
        args = args.property("include", reference(&format!("{}Include", m.name)));
    }
    e.emit(SchemaGroup::QueryInput, format!("{}Args", m.name), args.build())?;

    if m.has_to_many_relations() {
        let counted = m
            .to_many_relations()
            .fold(e.object(), |obj, r| obj.property(r.name.clone(), boolean()));
        let select_name = format!("{}CountOutputTypeSelect", m.name);
        e.emit(SchemaGroup::QueryInput, select_name.clone(), counted.build())?;
        let count_args = e.object().property("select", reference(&select_name)).build();
        e.emit(SchemaGroup::QueryInput, format!("{}CountOutputTypeArgs", m.name), count_args)?;
    }
    Ok(())
}

fn with_relation_selection(mut obj: ObjectSchema, m: &ModelDef) -> ObjectSchema {
    for r in &m.relations {
        let nested = if r.is_many() {
            format!("{}FindManyArgs", r.target)
        } else {
            format!("{}Args", r.target)
        };
        obj = obj.property(r.name.clone(), any_of(vec![boolean(), reference(&nested)]));
    }
    if m.has_to_many_relations() {
        let count = reference(&format!("{}CountOutputTypeArgs", m.name));
        obj = obj.property("_count", any_of(vec![boolean(), count]));
    }
    obj
}

/// Where inputs, the unique lookup, compound keys, and relation filters.
pub(super) fn emit_where(e: &mut Emitter<'_>, m: &ModelDef) -> Result<(), GenerationError> {
    let where_name = format!("{}WhereInput", m.name);
    let mut filter = logical(e.object(), &where_name);
    filter = m
        .fields
        .iter()
        .fold(filter, |obj, f| obj.property(f.name.clone(), field_filter(f)));
    for r in &m.relations {
        filter = filter.property(r.name.clone(), relation_filter(r));
    }
    e.emit(SchemaGroup::QueryInput, where_name.clone(), filter.build())?;

    let scalar_name = format!("{}ScalarWhereInput", m.name);
    let scalar = m
        .fields
        .iter()
        .fold(logical(e.object(), &scalar_name), |obj, f| {
            obj.property(f.name.clone(), field_filter(f))
        });
    e.emit(SchemaGroup::QueryInput, scalar_name, scalar.build())?;

    emit_where_unique(e, m, &where_name)?;

    if m.has_relations() {
        let filter = reference(&where_name);
        let is = e
            .object()
            .property("is", filter.clone())
            .property("isNot", filter.clone());
        e.emit(SchemaGroup::QueryInput, format!("{}RelationFilter", m.name), is.build())?;
        let nullable_is = e
            .object()
            .property("is", nullable(filter.clone()))
            .property("isNot", nullable(filter.clone()));
        e.emit(
            SchemaGroup::QueryInput,
            format!("{}NullableRelationFilter", m.name),
            nullable_is.build(),
        )?;
        let list = ["every", "some", "none"]
            .into_iter()
            .fold(e.object(), |obj, op| obj.property(op, filter.clone()));
        e.emit(SchemaGroup::QueryInput, format!("{}ListRelationFilter", m.name), list.build())?;
    }
    Ok(())
}

/// `AND`, `OR`, `NOT` over `name`.
fn logical(obj: ObjectSchema, name: &str) -> ObjectSchema {
    let this = reference(name);
    obj.property("AND", one_or_many(this.clone()))
        .property("OR", array_of(this.clone()))
        .property("NOT", one_or_many(this))
}

fn relation_filter(r: &RelationDef) -> Value {
    if r.is_many() {
        return reference(&format!("{}ListRelationFilter", r.target));
    }
    let where_input = reference(&format!("{}WhereInput", r.target));
    if r.is_required() {
        any_of(vec![reference(&format!("{}RelationFilter", r.target)), where_input])
    } else {
        nullable(any_of(vec![
            reference(&format!("{}NullableRelationFilter", r.target)),
            where_input,
        ]))
    }
}

/// Name of the input a compound key is looked up with.
fn compound_unique_name(m: &ModelDef, key: &UniqueKey<'_>) -> String {
    let fields: String = key.fields.iter().map(|f| pascal_case(&f.name)).collect();
    format!("{}{fields}CompoundUniqueInput", m.name)
}

fn emit_where_unique(e: &mut Emitter<'_>, m: &ModelDef, where_name: &str) -> Result<(), GenerationError> {
    let keys = m.unique_keys();
    let mut lookup = e.object();
    let mut alternatives = Vec::with_capacity(keys.len());
    for key in &keys {
        if key.is_compound() {
            let input_name = compound_unique_name(m, key);
            let input = key.fields.iter().fold(e.object(), |obj, f| {
                obj.required(f.name.clone(), type_value(&f.field_type))
            });
            e.emit(SchemaGroup::QueryInput, input_name.clone(), input.build())?;
            lookup = lookup.property(key.name.clone(), reference(&input_name));
        } else if let Some(field) = key.fields.first() {
            lookup = lookup.property(key.name.clone(), type_value(&field.field_type));
        }
        alternatives.push(vec![key.name.clone()]);
    }

    lookup = logical(lookup, where_name);
    for f in &m.fields {
        if !lookup.has_property(&f.name) {
            lookup = lookup.property(f.name.clone(), field_filter(f));
        }
    }
    for r in &m.relations {
        lookup = lookup.property(r.name.clone(), relation_filter(r));
    }
    let lookup = lookup.require_one_of(alternatives).build();
    e.emit(SchemaGroup::QueryInput, format!("{}WhereUniqueInput", m.name), lookup)
}

/// Sort direction of a column: nullable columns may also place nulls.
fn sort(field: &FieldDef) -> Value {
    if field.optional {
        any_of(vec![reference("SortOrder"), reference("SortOrderInput")])
    } else {
        reference("SortOrder")
    }
}

/// `MOrderByWithRelationInput` and `MOrderByRelationAggregateInput`.
pub(super) fn emit_order_by(e: &mut Emitter<'_>, m: &ModelDef) -> Result<(), GenerationError> {
    let mut order = m
        .sortable_fields()
        .fold(e.object(), |obj, f| obj.property(f.name.clone(), sort(f)));
    for r in &m.relations {
        let nested = if r.is_many() {
            format!("{}OrderByRelationAggregateInput", r.target)
        } else {
            format!("{}OrderByWithRelationInput", r.target)
        };
        order = order.property(r.name.clone(), reference(&nested));
    }
    e.emit(
        SchemaGroup::QueryInput,
        format!("{}OrderByWithRelationInput", m.name),
        order.build(),
    )?;

    if m.has_relations() {
        let by_count = e.object().property("_count", reference("SortOrder")).build();
        e.emit(
            SchemaGroup::QueryInput,
            format!("{}OrderByRelationAggregateInput", m.name),
            by_count,
        )?;
    }
    Ok(())
}

/// Aggregate selections, aggregate ordering, and the `having` filter.
pub(super) fn emit_aggregates(e: &mut Emitter<'_>, m: &ModelDef) -> Result<(), GenerationError> {
    let sortable: Vec<&FieldDef> = m.sortable_fields().collect();
    let numeric_fields: Vec<&FieldDef> = m.numeric_fields().collect();
    let numeric = !numeric_fields.is_empty();
    let all: Vec<&FieldDef> = m.fields.iter().collect();

    let count = flags(e, &all).property("_all", boolean());
    e.emit(SchemaGroup::QueryInput, format!("{}CountAggregateInput", m.name), count.build())?;
    for op in ["Min", "Max"] {
        let selection = flags(e, &sortable).build();
        e.emit(SchemaGroup::QueryInput, format!("{}{op}AggregateInput", m.name), selection)?;
    }
    if numeric {
        for op in ["Avg", "Sum"] {
            let selection = flags(e, &numeric_fields).build();
            e.emit(SchemaGroup::QueryInput, format!("{}{op}AggregateInput", m.name), selection)?;
        }
    }

    let mut per_op: Vec<(&str, &[&FieldDef])> = vec![
        ("Count", all.as_slice()),
        ("Min", sortable.as_slice()),
        ("Max", sortable.as_slice()),
    ];
    if numeric {
        per_op.push(("Avg", numeric_fields.as_slice()));
        per_op.push(("Sum", numeric_fields.as_slice()));
    }
    let mut order = m
        .sortable_fields()
        .fold(e.object(), |obj, f| obj.property(f.name.clone(), sort(f)));
    for (op, fields) in per_op {
        let name = format!("{}{op}OrderByAggregateInput", m.name);
        let body = fields
            .iter()
            .fold(e.object(), |obj, f| obj.property(f.name.clone(), reference("SortOrder")))
            .build();
        e.emit(SchemaGroup::QueryInput, name.clone(), body)?;
        order = order.property(format!("_{}", op.to_ascii_lowercase()), reference(&name));
    }
    e.emit(
        SchemaGroup::QueryInput,
        format!("{}OrderByWithAggregationInput", m.name),
        order.build(),
    )?;

    let having_name = format!("{}ScalarWhereWithAggregatesInput", m.name);
    let having = m
        .fields
        .iter()
        .fold(logical(e.object(), &having_name), |obj, f| {
            obj.property(f.name.clone(), field_filter(f))
        });
    e.emit(SchemaGroup::QueryInput, having_name, having.build())
}

fn flags(e: &Emitter<'_>, fields: &[&FieldDef]) -> ObjectSchema {
    fields
        .iter()
        .fold(e.object(), |obj, f| obj.property(f.name.clone(), boolean()))
}
