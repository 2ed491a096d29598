//! # Entity Schemas
//!
//! Per model `M`:
//!
//! - `MScalarFieldEnum`: the column names, as a string enum.
//! - `M`: a stored row. Every column is present; nullable columns accept
//!   `null`; literal defaults are annotated with `default`.
//! - `MOptionalDefaults`: an insert payload before defaults are applied.
//!   Columns with a default, `updated_at` columns, and nullable columns may
//!   be omitted.
//! - `MPartial`: any subset of columns.
//! - `MWithRelations`: a row plus any loaded relations. To-one relations
//!   reference `TWithRelations` (nullable unless the relation is required);
//!   to-many relations are arrays of it.

use flowmirror_core::{DefaultValue, FieldDef, ModelDef, RelationDef};
use serde_json::Value;

use crate::fragment::{array_of, field_value, nullable, reference, string_enum, ObjectSchema};
use crate::registry::{Emitter, GenerationError, SchemaGroup};

/// Emit the entity schemas of one model.
pub(crate) fn emit_entity(e: &mut Emitter<'_>, m: &ModelDef) -> Result<(), GenerationError> {
    let columns = string_enum(m.fields.iter().map(|f| f.name.clone()));
    e.emit(SchemaGroup::Entity, format!("{}ScalarFieldEnum", m.name), columns)?;

    let row = columns_object(e, m, |_| true).description(m.doc.as_deref()).build();
    e.emit(SchemaGroup::Entity, m.name.clone(), row)?;

    let insert = columns_object(e, m, |f| !f.may_omit_on_create()).build();
    e.emit(SchemaGroup::Entity, format!("{}OptionalDefaults", m.name), insert)?;

    let partial = columns_object(e, m, |_| false).build();
    e.emit(SchemaGroup::Entity, format!("{}Partial", m.name), partial)?;

    let mut with_relations = columns_object(e, m, |_| true);
    for r in &m.relations {
        with_relations = with_relations.property(r.name.clone(), loaded_relation(r));
    }
    e.emit(SchemaGroup::Entity, format!("{}WithRelations", m.name), with_relations.build())?;
    Ok(())
}

fn columns_object(
    e: &Emitter<'_>,
    m: &ModelDef,
    is_required: impl Fn(&FieldDef) -> bool,
) -> ObjectSchema {
    m.fields.iter().fold(e.object(), |obj, f| {
        obj.property_if(f.name.clone(), column(f), is_required(f))
    })
}

/// The value schema of a column, with documentation and literal default.
fn column(field: &FieldDef) -> Value {
    let mut schema = field_value(field);
    let annotations = [
        ("description", field.doc.clone().map(Value::String)),
        ("default", field.default.as_ref().and_then(DefaultValue::literal).cloned()),
    ];
    let present: Vec<_> = annotations.into_iter().filter_map(|(k, v)| Some((k, v?))).collect();
    if present.is_empty() {
        return schema;
    }
    // Nullable columns are `anyOf`; annotations go beside it.
    if let Value::Object(map) = &mut schema {
        for (k, v) in present {
            map.insert(k.to_string(), v);
        }
    }
    schema
}

fn loaded_relation(r: &RelationDef) -> Value {
    let target = reference(&format!("{}WithRelations", r.target));
    if r.is_many() {
        array_of(target)
    } else if r.is_required() {
        target
    } else {
        // The non-owning side of a one-to-one may have no partner row.
        nullable(target)
    }
}
