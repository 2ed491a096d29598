//! # Query Inputs and Operation Arguments
//!
//! Per-model schemas for the query-builder surface:
//!
//! - [`query`]: select/include, where (including relation filters and the
//!   unique lookup), order-by, and aggregate selections.
//! - [`writes`]: create and update inputs, and the nested-write family of
//!   every relation.
//! - [`args`]: the argument envelope of every operation (`findMany`,
//!   `create`, `groupBy`, ...).
//!
//! ## Relation Links
//!
//! Nested writes are named after the relation's target `T` and the field
//! on `T` that points back (`B`): writing `Flow.nodes` goes through
//! `NodeCreateNestedManyWithoutFlowInput`. A [`Link`] bundles the three
//! pieces so every module derives these names the same way.

mod args;
mod query;
mod writes;

use flowmirror_core::{pascal_case, DataModel, ModelDef, ModelError, RelationDef};

use crate::registry::{Emitter, GenerationError};

/// Emit the query-input schemas of one model.
pub(crate) fn emit_query_inputs(
    e: &mut Emitter<'_>,
    model: &DataModel,
    m: &ModelDef,
) -> Result<(), GenerationError> {
    query::emit_select(e, m)?;
    query::emit_where(e, m)?;
    query::emit_order_by(e, m)?;
    if e.config().emits_aggregates() {
        query::emit_aggregates(e, m)?;
    }
    writes::emit_writes(e, model, m)?;
    if e.config().emits_nested_writes() {
        for r in &m.relations {
            writes::emit_nested_family(e, model, &Link::resolve(model, m, r)?)?;
        }
    }
    Ok(())
}

/// Emit the operation argument schemas of one model.
pub(crate) fn emit_arguments(e: &mut Emitter<'_>, m: &ModelDef) -> Result<(), GenerationError> {
    args::emit_args(e, m)
}

/// A relation `M.f → T` together with `T`'s back relation `T.b → M`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Link<'a> {
    /// `M.f`.
    pub relation: &'a RelationDef,
    /// `T`.
    pub target: &'a ModelDef,
    /// `T.b`.
    pub back: &'a RelationDef,
}

impl<'a> Link<'a> {
    /// Pair `relation` on `m` with its back relation.
    pub(crate) fn resolve(
        model: &'a DataModel,
        m: &ModelDef,
        relation: &'a RelationDef,
    ) -> Result<Self, GenerationError> {
        let (target, back) = model.back_relation(m, relation).ok_or_else(|| {
            ModelError::MissingBackRelation {
                model: m.name.clone(),
                relation: relation.name.clone(),
                target: relation.target.clone(),
            }
        })?;
        Ok(Self {
            relation,
            target,
            back,
        })
    }

    fn without(&self) -> String {
        format!("Without{}", pascal_case(&self.back.name))
    }

    /// `TCreateWithoutBInput`.
    pub(crate) fn create_without(&self) -> String {
        format!("{}Create{}Input", self.target.name, self.without())
    }

    /// `TUncheckedCreateWithoutBInput`.
    pub(crate) fn unchecked_create_without(&self) -> String {
        format!("{}UncheckedCreate{}Input", self.target.name, self.without())
    }

    /// `TCreateOrConnectWithoutBInput`.
    pub(crate) fn create_or_connect(&self) -> String {
        format!("{}CreateOrConnect{}Input", self.target.name, self.without())
    }

    /// `TCreateNestedOneWithoutBInput` or `TCreateNestedManyWithoutBInput`.
    pub(crate) fn nested_create(&self) -> String {
        let arity = if self.relation.is_many() { "Many" } else { "One" };
        format!("{}CreateNested{arity}{}Input", self.target.name, self.without())
    }

    /// `TCreateManyBInput`: rows created in bulk under the parent.
    pub(crate) fn create_many(&self) -> String {
        format!("{}CreateMany{}Input", self.target.name, pascal_case(&self.back.name))
    }

    /// `TCreateManyBInputEnvelope`.
    pub(crate) fn create_many_envelope(&self) -> String {
        format!("{}Envelope", self.create_many())
    }

    /// `TUpdateWithoutBInput`.
    pub(crate) fn update_without(&self) -> String {
        format!("{}Update{}Input", self.target.name, self.without())
    }

    /// `TUncheckedUpdateWithoutBInput`.
    pub(crate) fn unchecked_update_without(&self) -> String {
        format!("{}UncheckedUpdate{}Input", self.target.name, self.without())
    }

    /// `TUpsertWithoutBInput` (to-one).
    pub(crate) fn upsert_one(&self) -> String {
        format!("{}Upsert{}Input", self.target.name, self.without())
    }

    /// `TUpsertWithWhereUniqueWithoutBInput` (to-many).
    pub(crate) fn upsert_many(&self) -> String {
        format!("{}UpsertWithWhereUnique{}Input", self.target.name, self.without())
    }

    /// `TUpdateWithWhereUniqueWithoutBInput` (to-many).
    pub(crate) fn update_with_where_unique(&self) -> String {
        format!("{}UpdateWithWhereUnique{}Input", self.target.name, self.without())
    }

    /// `TUpdateManyWithWhereWithoutBInput` (to-many).
    pub(crate) fn update_many_with_where(&self) -> String {
        format!("{}UpdateManyWithWhere{}Input", self.target.name, self.without())
    }

    /// The nested update input the parent's update schema references.
    ///
    /// `TUpdateManyWithoutBNestedInput` for lists;
    /// `TUpdateOne[Required]WithoutBNestedInput` otherwise.
    pub(crate) fn nested_update(&self) -> String {
        let kind = if self.relation.is_many() {
            "Many"
        } else if self.relation.is_required() {
            "OneRequired"
        } else {
            "One"
        };
        format!("{}Update{kind}{}NestedInput", self.target.name, self.without())
    }

    /// Whether `T` rows can be bulk-created under the parent.
    pub(crate) fn has_create_many(&self) -> bool {
        self.relation.is_many() && self.back.is_owning()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowmirror_core::workflow_data_model;

    #[test]
    fn test_link_names_follow_back_relation() {
        let model = workflow_data_model();
        let node = model.model("Node").unwrap();
        let source = node.relation_named("sourceEdges").unwrap();
        let link = Link::resolve(&model, node, source).unwrap();
        assert_eq!(link.nested_create(), "EdgeCreateNestedManyWithoutSourceNodeInput");
        assert_eq!(link.nested_update(), "EdgeUpdateManyWithoutSourceNodeNestedInput");
        assert_eq!(link.create_many_envelope(), "EdgeCreateManySourceNodeInputEnvelope");
        assert!(link.has_create_many());
    }

    #[test]
    fn test_required_to_one_update_name() {
        let model = workflow_data_model();
        let edge = model.model("Edge").unwrap();
        let flow = edge.relation_named("flow").unwrap();
        let link = Link::resolve(&model, edge, flow).unwrap();
        assert_eq!(link.nested_update(), "FlowUpdateOneRequiredWithoutEdgesNestedInput");
        assert_eq!(link.nested_create(), "FlowCreateNestedOneWithoutEdgesInput");

        let secret = model.model("Secret").unwrap();
        let flow = secret.relation_named("flow").unwrap();
        let link = Link::resolve(&model, secret, flow).unwrap();
        assert_eq!(link.nested_update(), "FlowUpdateOneWithoutSecretsNestedInput");
    }

    #[test]
    fn test_many_to_many_has_no_bulk_create() {
        let model = workflow_data_model();
        let flow = model.model("Flow").unwrap();
        let tags = flow.relation_named("tags").unwrap();
        let link = Link::resolve(&model, flow, tags).unwrap();
        assert_eq!(link.back.name, "flows");
        assert!(!link.has_create_many());
    }
}
