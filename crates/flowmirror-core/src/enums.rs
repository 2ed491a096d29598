//! # Workflow Enums: Typed Value Sets
//!
//! The ten enumerated value sets of the workflow data model, as Rust
//! enums. Each implements [`ModelEnum`], from which the declaration-level
//! [`EnumDef`] is derived, so the typed enum and the generated string-enum
//! schema cannot drift apart.
//!
//! Values serialize in SCREAMING_SNAKE_CASE, matching the stored column
//! values (`RunStatus::Completed` ↔ `"COMPLETED"`).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MirrorError;
use crate::model::EnumDef;

/// A typed enum mirrored by a declared [`EnumDef`].
pub trait ModelEnum: Sized + Copy + 'static {
    /// Declared enum name.
    const NAME: &'static str;

    /// Every variant, in declaration order.
    fn all() -> &'static [Self];

    /// Stored value of this variant.
    fn as_str(&self) -> &'static str;

    /// The declaration-level definition.
    fn enum_def() -> EnumDef {
        EnumDef::new(Self::NAME, Self::all().iter().map(|v| v.as_str()))
    }
}

/// Defines a [`ModelEnum`] with `Display`, `FromStr`, and serde support.
macro_rules! model_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl ModelEnum for $name {
            const NAME: &'static str = stringify!($name);

            fn all() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = MirrorError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    other => Err(MirrorError::Parse(format!(
                        "unknown {} value: {other:?}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

model_enum! {
    /// HTTP method a flow's webhook trigger answers to.
    FlowMethod {
        Get => "GET",
        Post => "POST",
        Put => "PUT",
        Patch => "PATCH",
        Delete => "DELETE",
    }
}

model_enum! {
    /// Lifecycle state of a flow run.
    RunStatus {
        Pending => "PENDING",
        Running => "RUNNING",
        Paused => "PAUSED",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
    }
}

model_enum! {
    /// What started a run or emitted an event.
    StartedBy {
        Manual => "MANUAL",
        Scheduler => "SCHEDULER",
        Webhook => "WEBHOOK",
        Api => "API",
    }
}

model_enum! {
    /// Kind of a node on the flow canvas.
    NodeType {
        Trigger => "TRIGGER",
        Action => "ACTION",
        Condition => "CONDITION",
        Transform => "TRANSFORM",
        Loop => "LOOP",
        Subflow => "SUBFLOW",
        Webhook => "WEBHOOK",
        Note => "NOTE",
    }
}

model_enum! {
    /// Rendering and routing kind of an edge.
    EdgeType {
        Default => "DEFAULT",
        Conditional => "CONDITIONAL",
        Custom => "CUSTOM",
    }
}

model_enum! {
    /// What a stored secret is.
    SecretCategory {
        ApiKey => "API_KEY",
        OauthToken => "OAUTH_TOKEN",
        DatabaseUrl => "DATABASE_URL",
        SshKey => "SSH_KEY",
        WebhookSecret => "WEBHOOK_SECRET",
        Other => "OTHER",
    }
}

model_enum! {
    /// Where a piece of infrastructure runs.
    InfraProvider {
        Aws => "AWS",
        Gcp => "GCP",
        Azure => "AZURE",
        Kubernetes => "KUBERNETES",
        Docker => "DOCKER",
        Other => "OTHER",
    }
}

model_enum! {
    /// State of a scheduled job.
    ScheduledJobStatus {
        Active => "ACTIVE",
        Paused => "PAUSED",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}

model_enum! {
    /// Authorization role of a user.
    UserRole {
        SuperAdmin => "SUPER_ADMIN",
        Admin => "ADMIN",
        User => "USER",
    }
}

model_enum! {
    /// Kind of change recorded in the audit log.
    AuditChangeType {
        Create => "CREATE",
        Update => "UPDATE",
        Delete => "DELETE",
    }
}

/// Declarations of every workflow enum, in emission order.
pub fn workflow_enum_defs() -> Vec<EnumDef> {
    vec![
        FlowMethod::enum_def(),
        RunStatus::enum_def(),
        StartedBy::enum_def(),
        NodeType::enum_def(),
        EdgeType::enum_def(),
        SecretCategory::enum_def(),
        InfraProvider::enum_def(),
        ScheduledJobStatus::enum_def(),
        UserRole::enum_def(),
        AuditChangeType::enum_def(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_roundtrip<E>()
    where
        E: ModelEnum + FromStr<Err = MirrorError> + PartialEq + std::fmt::Debug + Serialize,
    {
        for v in E::all() {
            let parsed: E = v.as_str().parse().unwrap();
            assert_eq!(parsed, *v);
            let json = serde_json::to_value(v).unwrap();
            assert_eq!(json, serde_json::Value::String(v.as_str().to_string()));
        }
    }

    #[test]
    fn test_every_enum_roundtrips() {
        check_roundtrip::<FlowMethod>();
        check_roundtrip::<RunStatus>();
        check_roundtrip::<StartedBy>();
        check_roundtrip::<NodeType>();
        check_roundtrip::<EdgeType>();
        check_roundtrip::<SecretCategory>();
        check_roundtrip::<InfraProvider>();
        check_roundtrip::<ScheduledJobStatus>();
        check_roundtrip::<UserRole>();
        check_roundtrip::<AuditChangeType>();
    }

    #[test]
    fn test_enum_def_mirrors_variants() {
        let def = SecretCategory::enum_def();
        assert_eq!(def.name, "SecretCategory");
        assert_eq!(
            def.values,
            ["API_KEY", "OAUTH_TOKEN", "DATABASE_URL", "SSH_KEY", "WEBHOOK_SECRET", "OTHER"]
        );
    }

    #[test]
    fn test_unknown_value_rejected() {
        let err = "get".parse::<FlowMethod>().unwrap_err();
        assert!(err.to_string().contains("unknown FlowMethod value"));
        assert!(serde_json::from_str::<RunStatus>("\"DONE\"").is_err());
    }

    #[test]
    fn test_workflow_enum_defs_unique_names() {
        let defs = workflow_enum_defs();
        assert_eq!(defs.len(), 10);
        let names: std::collections::HashSet<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), defs.len());
    }
}
