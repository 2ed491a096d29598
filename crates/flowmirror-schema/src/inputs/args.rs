//! Operation argument envelopes.

use flowmirror_core::ModelDef;
use serde_json::{json, Value};

use crate::fragment::{any_of, boolean, non_negative_integer, one_or_many, reference, ObjectSchema};
use crate::registry::{Emitter, GenerationError, SchemaGroup};

struct Names<'a> {
    model: &'a str,
}

impl Names<'_> {
    fn of(&self, suffix: &str) -> Value {
        reference(&format!("{}{suffix}", self.model))
    }

    fn either(&self, checked: &str, unchecked: &str) -> Value {
        any_of(vec![self.of(checked), self.of(unchecked)])
    }
}

/// `select` and, when the model has relations, `include`.
fn shaped(e: &Emitter<'_>, m: &ModelDef, n: &Names<'_>) -> ObjectSchema {
    let obj = e.object().property("select", n.of("Select"));
    if m.has_relations() {
        obj.property("include", n.of("Include"))
    } else {
        obj
    }
}

/// `where`, `orderBy`, `cursor`, `take`, `skip`.
fn paged(obj: ObjectSchema, n: &Names<'_>) -> ObjectSchema {
    obj.property("where", n.of("WhereInput"))
        .property("orderBy", one_or_many(n.of("OrderByWithRelationInput")))
        .property("cursor", n.of("WhereUniqueInput"))
        .property("take", json!({ "type": "integer" }))
        .property("skip", non_negative_integer())
}

/// `_count`, `_min`, `_max`, and for numeric models `_avg`, `_sum`.
fn aggregated(mut obj: ObjectSchema, m: &ModelDef, n: &Names<'_>) -> ObjectSchema {
    obj = obj
        .property("_count", any_of(vec![json!({ "const": true }), n.of("CountAggregateInput")]))
        .property("_min", n.of("MinAggregateInput"))
        .property("_max", n.of("MaxAggregateInput"));
    if m.numeric_fields().next().is_some() {
        obj = obj
            .property("_avg", n.of("AvgAggregateInput"))
            .property("_sum", n.of("SumAggregateInput"));
    }
    obj
}

/// Emit every argument schema of `m`.
pub(super) fn emit_args(e: &mut Emitter<'_>, m: &ModelDef) -> Result<(), GenerationError> {
    let n = Names { model: &m.name };
    let aggregates = e.config().emits_aggregates();
    let mut out: Vec<(&str, Value)> = Vec::new();

    out.push((
        "FindUniqueArgs",
        shaped(e, m, &n).required("where", n.of("WhereUniqueInput")).build(),
    ));
    let find = paged(shaped(e, m, &n), &n)
        .property("distinct", one_or_many(n.of("ScalarFieldEnum")))
        .build();
    out.push(("FindFirstArgs", find.clone()));
    out.push(("FindManyArgs", find));

    out.push((
        "CreateArgs",
        shaped(e, m, &n)
            .required("data", n.either("CreateInput", "UncheckedCreateInput"))
            .build(),
    ));
    out.push((
        "CreateManyArgs",
        e.object()
            .required("data", one_or_many(n.of("CreateManyInput")))
            .property("skipDuplicates", boolean())
            .build(),
    ));
    out.push((
        "UpdateArgs",
        shaped(e, m, &n)
            .required("data", n.either("UpdateInput", "UncheckedUpdateInput"))
            .required("where", n.of("WhereUniqueInput"))
            .build(),
    ));
    out.push((
        "UpdateManyArgs",
        e.object()
            .required("data", n.either("UpdateManyMutationInput", "UncheckedUpdateManyInput"))
            .property("where", n.of("WhereInput"))
            .build(),
    ));
    out.push((
        "UpsertArgs",
        shaped(e, m, &n)
            .required("where", n.of("WhereUniqueInput"))
            .required("create", n.either("CreateInput", "UncheckedCreateInput"))
            .required("update", n.either("UpdateInput", "UncheckedUpdateInput"))
            .build(),
    ));
    out.push((
        "DeleteArgs",
        shaped(e, m, &n).required("where", n.of("WhereUniqueInput")).build(),
    ));
    out.push((
        "DeleteManyArgs",
        e.object().property("where", n.of("WhereInput")).build(),
    ));

    let mut count = paged(e.object(), &n);
    if aggregates {
        count = count.property(
            "select",
            any_of(vec![json!({ "const": true }), n.of("CountAggregateInput")]),
        );
    }
    out.push(("CountArgs", count.build()));

    if aggregates {
        out.push(("AggregateArgs", aggregated(paged(e.object(), &n), m, &n).build()));
        let group_by = e
            .object()
            .property("where", n.of("WhereInput"))
            .property("orderBy", one_or_many(n.of("OrderByWithAggregationInput")))
            .required("by", one_or_many(n.of("ScalarFieldEnum")))
            .property("having", n.of("ScalarWhereWithAggregatesInput"))
            .property("take", json!({ "type": "integer" }))
            .property("skip", non_negative_integer());
        out.push(("GroupByArgs", aggregated(group_by, m, &n).build()));
    }

    for (suffix, body) in out {
        e.emit(SchemaGroup::Arguments, format!("{}{suffix}", m.name), body)?;
    }
    Ok(())
}
