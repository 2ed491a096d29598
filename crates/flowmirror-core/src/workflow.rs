//! # The Workflow Data Model
//!
//! The concrete declaration of the workflow-automation product: flows and
//! their canvas (nodes, edges), execution history (runs, events,
//! statistics), scheduling, secrets, tagging, infrastructure, and the
//! authentication and audit tables.
//!
//! ## Relation Map
//!
//! | Owner side | Other side | Kind |
//! |------------|-----------|------|
//! | `Flow.instance` | `Instance.flows` | optional many-to-one |
//! | `Node.flow`, `Edge.flow`, `FlowRun.flow`, `FlowEvent.flow`, `TestCase.flow`, `ScheduledJob.flow` | `Flow.*` lists | many-to-one |
//! | `Secret.flow`, `Secret.node` | `Flow.secrets`, `Node.secrets` | optional many-to-one |
//! | `FlowStatistics.flow` | `Flow.statistics` | one-to-one |
//! | `Edge.sourceNode` / `Edge.targetNode` | `Node.sourceEdges` / `Node.targetEdges` | named (`SourceNode`, `TargetNode`) |
//! | `Node.infrastructure` | `Infrastructure.nodes` | optional many-to-one |
//! | `FlowRun.scheduledJob` | `ScheduledJob.flowRuns` | optional many-to-one |
//! | `FlowEvent.flowRun`, `FlowEvent.node` | `FlowRun.flowEvents`, `Node.flowEvents` | many-to-one |
//! | `Tag.instance`, `TagGroup.instance` | `Instance.tags`, `Instance.tagGroups` | many-to-one |
//! | `Tag.tagGroup` | `TagGroup.tags` | optional many-to-one |
//! | `Flow.tags` ↔ `Tag.flows`, `Node.tags` ↔ `Tag.nodes` | | many-to-many (`FlowToTag`, `NodeToTag`) |
//! | `Account.user`, `Session.user` | `User.accounts`, `User.sessions` | many-to-one |
//! | `AuditLog.user` | `User.auditLogs` | optional many-to-one |

use serde_json::json;

use crate::enums::{
    workflow_enum_defs, AuditChangeType, EdgeType, FlowMethod, InfraProvider, ModelEnum, NodeType,
    RunStatus, ScheduledJobStatus, SecretCategory, StartedBy, UserRole,
};
use crate::model::{DataModel, DefaultValue, FieldDef, ModelDef, RelationDef};
use crate::scalar::ScalarType::{self, Boolean, DateTime, Float, Int, Json};

/// Names of every workflow model, in declaration order.
pub const WORKFLOW_MODELS: [&str; 18] = [
    "Flow",
    "Node",
    "Edge",
    "FlowRun",
    "FlowEvent",
    "Infrastructure",
    "Instance",
    "ScheduledJob",
    "Secret",
    "Tag",
    "TagGroup",
    "TestCase",
    "Account",
    "Session",
    "User",
    "VerificationToken",
    "AuditLog",
    "FlowStatistics",
];

fn string(name: &str) -> FieldDef {
    FieldDef::new(name, ScalarType::String)
}

fn cuid_id() -> FieldDef {
    string("id").id().default(DefaultValue::Cuid)
}

fn serial_id() -> FieldDef {
    FieldDef::new("id", Int).id().default(DefaultValue::Autoincrement)
}

fn created_at() -> FieldDef {
    FieldDef::new("createdAt", DateTime).default(DefaultValue::Now)
}

fn updated_at() -> FieldDef {
    FieldDef::new("updatedAt", DateTime).updated_at()
}

fn deleted() -> FieldDef {
    FieldDef::new("deleted", Boolean)
        .default_value(false)
        .doc("Soft-delete marker.")
}

fn metadata() -> FieldDef {
    FieldDef::new("metadata", Json).optional()
}

fn enum_field<E: ModelEnum>(name: &str) -> FieldDef {
    FieldDef::enumeration(name, E::NAME)
}

fn enum_default<E: ModelEnum>(name: &str, value: E) -> FieldDef {
    enum_field::<E>(name).default_value(value.as_str())
}

fn belongs_to(name: &str, target: &str, fk: &str) -> RelationDef {
    RelationDef::one(name, target).references([fk], ["id"])
}

/// The workflow data model: 18 models and 10 enums.
///
/// The returned declaration always passes [`DataModel::validate`].
pub fn workflow_data_model() -> DataModel {
    let mut model = DataModel::new();
    model.enums = workflow_enum_defs();
    model.models = vec![
        flow(),
        node(),
        edge(),
        flow_run(),
        flow_event(),
        infrastructure(),
        instance(),
        scheduled_job(),
        secret(),
        tag(),
        tag_group(),
        test_case(),
        account(),
        session(),
        user(),
        verification_token(),
        audit_log(),
        flow_statistics(),
    ];
    model
}

fn flow() -> ModelDef {
    ModelDef::new("Flow")
        .doc("An automation: a canvas of nodes joined by edges.")
        .field(cuid_id())
        .field(string("name"))
        .field(string("description").optional())
        .field(enum_default("method", FlowMethod::Post))
        .field(FieldDef::new("isEnabled", Boolean).default_value(true))
        .field(FieldDef::new("content", Json).optional().doc("Serialized canvas state."))
        .field(metadata())
        .field(created_at())
        .field(updated_at())
        .field(deleted())
        .field(string("instanceId").optional())
        .relation(belongs_to("instance", "Instance", "instanceId").optional())
        .relation(RelationDef::many("nodes", "Node"))
        .relation(RelationDef::many("edges", "Edge"))
        .relation(RelationDef::many("flowRuns", "FlowRun"))
        .relation(RelationDef::many("flowEvents", "FlowEvent"))
        .relation(RelationDef::many("secrets", "Secret"))
        .relation(RelationDef::many("tags", "Tag").named("FlowToTag"))
        .relation(RelationDef::many("testCases", "TestCase"))
        .relation(RelationDef::many("scheduledJobs", "ScheduledJob"))
        .relation(RelationDef::one("statistics", "FlowStatistics").optional())
}

fn node() -> ModelDef {
    ModelDef::new("Node")
        .doc("A step on a flow canvas.")
        .field(cuid_id())
        .field(string("rfId").doc("Canvas-local node id."))
        .field(string("name").optional())
        .field(enum_field::<NodeType>("type"))
        .field(FieldDef::new("position", Json).optional())
        .field(metadata())
        .field(string("arn").optional())
        .field(string("infrastructureId").optional())
        .field(string("flowId"))
        .field(created_at())
        .field(updated_at())
        .field(deleted())
        .relation(belongs_to("flow", "Flow", "flowId"))
        .relation(belongs_to("infrastructure", "Infrastructure", "infrastructureId").optional())
        .relation(RelationDef::many("sourceEdges", "Edge").named("SourceNode"))
        .relation(RelationDef::many("targetEdges", "Edge").named("TargetNode"))
        .relation(RelationDef::many("flowEvents", "FlowEvent"))
        .relation(RelationDef::many("secrets", "Secret"))
        .relation(RelationDef::many("tags", "Tag").named("NodeToTag"))
        .unique(["flowId", "rfId"])
}

fn edge() -> ModelDef {
    ModelDef::new("Edge")
        .doc("A directed connection between two nodes of the same flow.")
        .field(cuid_id())
        .field(string("rfId").optional())
        .field(string("label").optional())
        .field(enum_default("type", EdgeType::Default))
        .field(string("sourceNodeId"))
        .field(string("targetNodeId"))
        .field(string("flowId"))
        .field(metadata())
        .field(created_at())
        .field(updated_at())
        .field(deleted())
        .relation(belongs_to("sourceNode", "Node", "sourceNodeId").named("SourceNode"))
        .relation(belongs_to("targetNode", "Node", "targetNodeId").named("TargetNode"))
        .relation(belongs_to("flow", "Flow", "flowId"))
        .unique(["sourceNodeId", "targetNodeId"])
}

fn flow_run() -> ModelDef {
    ModelDef::new("FlowRun")
        .doc("One execution of a flow.")
        .field(cuid_id())
        .field(string("flowId"))
        .field(enum_default("status", RunStatus::Pending))
        .field(FieldDef::new("isScheduled", Boolean).default_value(false))
        .field(string("scheduledJobId").optional())
        .field(enum_default("startedBy", StartedBy::Manual))
        .field(FieldDef::new("runData", Json).optional())
        .field(metadata())
        .field(FieldDef::new("timeStarted", DateTime).default(DefaultValue::Now))
        .field(FieldDef::new("timeEnded", DateTime).optional())
        .field(FieldDef::new("payload", Json).optional())
        .relation(belongs_to("flow", "Flow", "flowId"))
        .relation(belongs_to("scheduledJob", "ScheduledJob", "scheduledJobId").optional())
        .relation(RelationDef::many("flowEvents", "FlowEvent"))
}

fn flow_event() -> ModelDef {
    ModelDef::new("FlowEvent")
        .doc("A node-level event emitted during a run.")
        .field(serial_id())
        .field(string("flowRunId"))
        .field(string("flowId"))
        .field(string("nodeId"))
        .field(enum_field::<StartedBy>("startedBy"))
        .field(FieldDef::new("nodeMeta", Json).optional())
        .field(FieldDef::new("payload", Json).optional())
        .field(metadata())
        .field(FieldDef::new("timestamp", DateTime).default(DefaultValue::Now))
        .relation(belongs_to("flowRun", "FlowRun", "flowRunId"))
        .relation(belongs_to("flow", "Flow", "flowId"))
        .relation(belongs_to("node", "Node", "nodeId"))
}

fn infrastructure() -> ModelDef {
    ModelDef::new("Infrastructure")
        .doc("A cloud or container resource nodes can act on.")
        .field(cuid_id())
        .field(string("name").optional())
        .field(enum_field::<InfraProvider>("type"))
        .field(string("arn").optional().unique())
        .field(string("region").optional())
        .field(FieldDef::new("canControl", Boolean).default_value(true))
        .field(FieldDef::new("data", Json).optional())
        .field(created_at())
        .field(updated_at())
        .relation(RelationDef::many("nodes", "Node"))
}

fn instance() -> ModelDef {
    ModelDef::new("Instance")
        .doc("A workspace grouping flows and tags.")
        .field(cuid_id())
        .field(string("name"))
        .field(string("description").optional())
        .field(string("logo").optional())
        .field(string("url").optional())
        .field(created_at())
        .field(updated_at())
        .relation(RelationDef::many("flows", "Flow"))
        .relation(RelationDef::many("tags", "Tag"))
        .relation(RelationDef::many("tagGroups", "TagGroup"))
}

fn scheduled_job() -> ModelDef {
    ModelDef::new("ScheduledJob")
        .doc("A cron trigger for a flow.")
        .field(cuid_id())
        .field(string("flowId"))
        .field(string("createdBy"))
        .field(string("endpoint"))
        .field(string("frequency"))
        .field(string("cronExpression"))
        .field(string("category"))
        .field(string("name"))
        .field(enum_default("status", ScheduledJobStatus::Active))
        .field(FieldDef::new("lastRun", DateTime).optional())
        .field(FieldDef::new("nextRun", DateTime).optional())
        .field(created_at())
        .field(updated_at())
        .relation(belongs_to("flow", "Flow", "flowId"))
        .relation(RelationDef::many("flowRuns", "FlowRun"))
}

fn secret() -> ModelDef {
    ModelDef::new("Secret")
        .doc("A credential scoped to a flow or node.")
        .field(serial_id())
        .field(string("name"))
        .field(enum_field::<SecretCategory>("category"))
        .field(string("secret"))
        .field(FieldDef::new("shouldEncrypt", Boolean).default_value(false))
        .field(metadata())
        .field(string("flowId").optional())
        .field(string("nodeId").optional())
        .field(created_at())
        .field(updated_at())
        .relation(belongs_to("flow", "Flow", "flowId").optional())
        .relation(belongs_to("node", "Node", "nodeId").optional())
}

fn tag() -> ModelDef {
    ModelDef::new("Tag")
        .field(cuid_id())
        .field(string("name"))
        .field(string("color").default_value("#808080"))
        .field(deleted())
        .field(metadata())
        .field(string("instanceId"))
        .field(string("tagGroupId").optional())
        .field(created_at())
        .field(updated_at())
        .relation(belongs_to("instance", "Instance", "instanceId"))
        .relation(belongs_to("tagGroup", "TagGroup", "tagGroupId").optional())
        .relation(RelationDef::many("flows", "Flow").named("FlowToTag"))
        .relation(RelationDef::many("nodes", "Node").named("NodeToTag"))
        .unique(["name", "instanceId"])
}

fn tag_group() -> ModelDef {
    ModelDef::new("TagGroup")
        .field(cuid_id())
        .field(string("name"))
        .field(string("color").default_value("#808080"))
        .field(deleted())
        .field(metadata())
        .field(string("instanceId"))
        .field(created_at())
        .field(updated_at())
        .relation(belongs_to("instance", "Instance", "instanceId"))
        .relation(RelationDef::many("tags", "Tag"))
        .unique(["name", "instanceId"])
}

fn test_case() -> ModelDef {
    ModelDef::new("TestCase")
        .doc("A saved input payload for exercising a flow.")
        .field(cuid_id())
        .field(string("name"))
        .field(string("color").default_value("#808080"))
        .field(string("description").optional())
        .field(string("flowId"))
        .field(metadata())
        .field(created_at())
        .field(updated_at())
        .field(deleted())
        .relation(belongs_to("flow", "Flow", "flowId"))
}

fn account() -> ModelDef {
    ModelDef::new("Account")
        .doc("An OAuth provider account linked to a user.")
        .field(cuid_id())
        .field(string("userId"))
        .field(string("type"))
        .field(string("provider"))
        .field(string("providerAccountId"))
        .field(string("refresh_token").optional())
        .field(string("access_token").optional())
        .field(FieldDef::new("expires_at", Int).optional())
        .field(string("token_type").optional())
        .field(string("scope").optional())
        .field(string("id_token").optional())
        .field(string("session_state").optional())
        .relation(belongs_to("user", "User", "userId"))
        .unique(["provider", "providerAccountId"])
}

fn session() -> ModelDef {
    ModelDef::new("Session")
        .field(cuid_id())
        .field(string("sessionToken").unique())
        .field(string("userId"))
        .field(FieldDef::new("expires", DateTime))
        .relation(belongs_to("user", "User", "userId"))
}

fn user() -> ModelDef {
    ModelDef::new("User")
        .field(cuid_id())
        .field(string("name").optional())
        .field(string("email").optional().unique())
        .field(FieldDef::new("emailVerified", DateTime).optional())
        .field(string("image").optional())
        .field(enum_default("role", UserRole::User))
        .field(created_at())
        .field(updated_at())
        .relation(RelationDef::many("accounts", "Account"))
        .relation(RelationDef::many("sessions", "Session"))
        .relation(RelationDef::many("auditLogs", "AuditLog"))
}

fn verification_token() -> ModelDef {
    ModelDef::new("VerificationToken")
        .doc("A one-time email sign-in token.")
        .field(string("identifier"))
        .field(string("token").unique())
        .field(FieldDef::new("expires", DateTime))
        .unique(["identifier", "token"])
}

fn audit_log() -> ModelDef {
    ModelDef::new("AuditLog")
        .doc("Before/after snapshot of a change to any entity.")
        .field(serial_id())
        .field(string("entityType"))
        .field(string("entityId"))
        .field(enum_field::<AuditChangeType>("changeType"))
        .field(FieldDef::new("before", Json).optional())
        .field(FieldDef::new("after", Json).optional())
        .field(string("userId").optional())
        .field(FieldDef::new("timestamp", DateTime).default(DefaultValue::Now))
        .relation(belongs_to("user", "User", "userId").optional())
}

fn flow_statistics() -> ModelDef {
    ModelDef::new("FlowStatistics")
        .doc("Aggregated run counters, one row per flow.")
        .field(serial_id())
        .field(string("flowId").unique())
        .field(FieldDef::new("totalRuns", Int).default_value(json!(0)))
        .field(FieldDef::new("successfulRuns", Int).default_value(json!(0)))
        .field(FieldDef::new("failedRuns", Int).default_value(json!(0)))
        .field(FieldDef::new("averageDurationMs", Float).optional())
        .field(FieldDef::new("lastUpdated", DateTime).updated_at())
        .relation(belongs_to("flow", "Flow", "flowId"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_model_validates() {
        let model = workflow_data_model();
        if let Err(e) = model.validate() {
            panic!("workflow model failed validation: {e}");
        }
    }

    #[test]
    fn test_model_names_match_declaration_order() {
        let model = workflow_data_model();
        let names: Vec<&str> = model.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, WORKFLOW_MODELS);
    }

    #[test]
    fn test_compound_keys_present() {
        let model = workflow_data_model();
        let key_names = |m: &str| -> Vec<String> {
            model
                .model(m)
                .unwrap()
                .unique_keys()
                .into_iter()
                .filter(|k| k.is_compound())
                .map(|k| k.name)
                .collect()
        };
        assert_eq!(key_names("Edge"), ["sourceNodeId_targetNodeId"]);
        assert_eq!(key_names("Node"), ["flowId_rfId"]);
        assert_eq!(key_names("Tag"), ["name_instanceId"]);
        assert_eq!(key_names("TagGroup"), ["name_instanceId"]);
        assert_eq!(key_names("Account"), ["provider_providerAccountId"]);
        assert_eq!(key_names("VerificationToken"), ["identifier_token"]);
    }

    #[test]
    fn test_edge_node_relations_pair_by_name() {
        let model = workflow_data_model();
        let edge = model.model("Edge").unwrap();
        let source = edge.relation_named("sourceNode").unwrap();
        let (_, back) = model.back_relation(edge, source).unwrap();
        assert_eq!(back.name, "sourceEdges");
        let target = edge.relation_named("targetNode").unwrap();
        let (_, back) = model.back_relation(edge, target).unwrap();
        assert_eq!(back.name, "targetEdges");
    }

    #[test]
    fn test_statistics_is_one_to_one() {
        let model = workflow_data_model();
        let flow = model.model("Flow").unwrap();
        let stats = flow.relation_named("statistics").unwrap();
        assert!(!stats.is_owning());
        assert!(!stats.is_required());
        let (_, back) = model.back_relation(flow, stats).unwrap();
        assert!(back.is_owning() && !back.is_many());
    }
}
