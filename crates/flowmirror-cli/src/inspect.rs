//! # List and Show Subcommands
//!
//! Read-only views of the generated family: schema names filtered by
//! group or model, and single documents.

use anyhow::{bail, Result};
use clap::Args;

use flowmirror_schema::{SchemaGroup, SchemaRegistry};

use crate::Project;

/// Arguments for the `flowmirror list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only schemas of this group (enum, scalar_filter, field_update,
    /// entity, query_input, arguments).
    #[arg(long)]
    pub group: Option<SchemaGroup>,

    /// Only schemas derived from this model. (`--model` names the
    /// declaration file.)
    #[arg(long, value_name = "MODEL")]
    pub entity: Option<String>,
}

/// Arguments for the `flowmirror show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Schema name, with or without the `.schema.json` suffix.
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Execute the list subcommand.
pub fn run_list(args: &ListArgs, project: &Project) -> Result<u8> {
    let registry = project.registry()?;
    for name in select_names(&registry, args)? {
        println!("{name}");
    }
    Ok(0)
}

/// Names matching the filters of `args`, in emission order.
fn select_names<'a>(registry: &'a SchemaRegistry, args: &ListArgs) -> Result<Vec<&'a str>> {
    if let Some(model) = args.entity.as_deref() {
        if !registry.model_names().any(|m| m == model) {
            bail!("unknown model: {model}");
        }
    }
    Ok(registry
        .names()
        .filter(|name| args.group.map_or(true, |g| registry.group(name) == Some(g)))
        .filter(|name| {
            args.entity
                .as_deref()
                .map_or(true, |m| registry.names_for_model(m).any(|n| n == *name))
        })
        .collect())
}

/// Execute the show subcommand.
pub fn run_show(args: &ShowArgs, project: &Project) -> Result<u8> {
    let registry = project.registry()?;
    let name = args
        .name
        .strip_suffix(".schema.json")
        .unwrap_or(&args.name);
    let Some(document) = registry.document(name) else {
        bail!("unknown schema: {name}");
    };
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        Project::workflow(".").registry().unwrap()
    }

    #[test]
    fn test_list_by_group() {
        let registry = registry();
        let args = ListArgs {
            group: Some(SchemaGroup::Entity),
            entity: None,
        };
        let names = select_names(&registry, &args).unwrap();
        assert!(names.contains(&"FlowOptionalDefaults"));
        assert!(!names.contains(&"FlowWhereInput"), "query inputs are not entities");
    }

    #[test]
    fn test_list_by_model_excludes_prefix_siblings() {
        let registry = registry();
        let args = ListArgs {
            group: None,
            entity: Some("Flow".to_string()),
        };
        let names = select_names(&registry, &args).unwrap();
        assert!(names.contains(&"FlowFindManyArgs"));
        assert!(
            !names.iter().any(|n| n.starts_with("FlowRun")),
            "FlowRun schemas listed under Flow: {names:?}"
        );
    }

    #[test]
    fn test_list_unknown_model() {
        let args = ListArgs {
            group: None,
            entity: Some("Workflow".to_string()),
        };
        assert!(select_names(&registry(), &args).is_err());
    }

    #[test]
    fn test_show_accepts_suffix() {
        let project = Project::workflow(".");
        let args = ShowArgs {
            name: "Edge.schema.json".to_string(),
        };
        assert_eq!(run_show(&args, &project).unwrap(), 0);

        let missing = ShowArgs {
            name: "Nope".to_string(),
        };
        assert!(run_show(&missing, &project).is_err());
    }
}
