//! # Validate Subcommand
//!
//! Checks JSON/YAML payload files against one schema of the family.
//!
//! By default the family is generated in memory from the project's data
//! model; `--schemas DIR` validates against a previously emitted directory
//! instead. With `--defaults`, `NAME` is a model: each file is validated as
//! a new row and printed back with its defaults filled in.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use flowmirror_schema::{
    load_document, EntityParser, ParseError, SchemaValidationError, SchemaValidator,
    ValidationViolations,
};

use crate::Project;

/// Arguments for the `flowmirror validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema to validate against (a model name with `--defaults`).
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Payload files (`.json`, `.yaml`, `.yml`).
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Load schemas from an emitted directory instead of generating them.
    #[arg(long, value_name = "DIR")]
    pub schemas: Option<PathBuf>,

    /// Validate as a new row of model NAME and print it with defaults applied.
    #[arg(long, conflicts_with = "schemas")]
    pub defaults: bool,
}

enum Outcome {
    Passed(Option<Value>),
    Failed(ValidationViolations),
}

/// What each file is checked with.
enum Checker {
    Schema(SchemaValidator),
    Row(EntityParser),
}

impl Checker {
    fn check(&self, name: &str, path: &Path) -> Result<Outcome> {
        let document = load_document(path)?;
        let result = match self {
            Self::Schema(validator) => validator.validate_document(&document, name).map(|()| None),
            Self::Row(parser) => match parser.parse(name, document) {
                Ok(row) => Ok(Some(row)),
                Err(ParseError::Invalid(e)) => Err(e),
                Err(e) => return Err(e.into()),
            },
        };
        match result {
            Ok(row) => Ok(Outcome::Passed(row)),
            Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
                Ok(Outcome::Failed(violations))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 if every file conforms, 1 if any does not.
pub fn run_validate(args: &ValidateArgs, project: &Project) -> Result<u8> {
    let validator = match &args.schemas {
        Some(dir) => SchemaValidator::new(dir)
            .with_context(|| format!("failed to load schemas from {}", dir.display()))?,
        None => SchemaValidator::from_registry(&project.registry()?),
    };
    tracing::info!(schema_count = validator.schema_count(), "loaded schemas");

    let checker = if args.defaults {
        if project.model().model(&args.name).is_none() {
            bail!("unknown model: {}", args.name);
        }
        Checker::Row(EntityParser::new(project.model().clone(), validator))
    } else {
        if validator.get_schema(&args.name).is_none() {
            bail!("unknown schema: {}", args.name);
        }
        Checker::Schema(validator)
    };

    let mut failed = 0usize;
    for path in &args.files {
        match checker.check(&args.name, path)? {
            Outcome::Passed(row) => {
                println!("OK: {}", path.display());
                if let Some(row) = row {
                    println!("{}", serde_json::to_string_pretty(&row)?);
                }
            }
            Outcome::Failed(violations) => {
                failed += 1;
                println!("FAIL: {}", path.display());
                println!("{violations}");
            }
        }
    }

    tracing::info!(files = args.files.len(), failed, "validated payloads");
    if failed > 0 {
        println!(
            "\n{failed} of {} file(s) failed validation against {}.",
            args.files.len(),
            args.name
        );
        Ok(1)
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: &str, files: Vec<PathBuf>) -> ValidateArgs {
        ValidateArgs {
            name: name.to_string(),
            files,
            schemas: None,
            defaults: false,
        }
    }

    #[test]
    fn test_all_valid_returns_0() {
        let dir = tempfile::tempdir().unwrap();
        let flow = dir.path().join("flow.yaml");
        std::fs::write(&flow, "name: Invoice sync\nmethod: POST\n").unwrap();
        let project = Project::workflow(dir.path());
        assert_eq!(run_validate(&args("FlowOptionalDefaults", vec![flow]), &project).unwrap(), 0);
    }

    #[test]
    fn test_any_invalid_returns_1() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        std::fs::write(&good, r#"{ "name": "ok" }"#).unwrap();
        std::fs::write(&bad, r#"{ "method": "TRACE" }"#).unwrap();
        let project = Project::workflow(dir.path());
        let code = run_validate(&args("FlowOptionalDefaults", vec![good, bad]), &project).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_unknown_schema_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.json");
        std::fs::write(&file, "{}").unwrap();
        let project = Project::workflow(dir.path());
        let err = run_validate(&args("FlowNope", vec![file]), &project).unwrap_err();
        assert!(err.to_string().contains("unknown schema"), "{err}");
    }

    #[test]
    fn test_unreadable_payload_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        let missing = dir.path().join("missing.json");
        assert!(run_validate(&args("Flow", vec![missing]), &project).is_err());
    }

    #[test]
    fn test_emitted_directory() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        let schemas = dir.path().join("schemas");
        project.registry().unwrap().write_to_dir(&schemas).unwrap();

        let lookup = dir.path().join("lookup.json");
        std::fs::write(
            &lookup,
            r#"{ "where": { "sourceNodeId_targetNodeId": { "sourceNodeId": "a", "targetNodeId": "b" } } }"#,
        )
        .unwrap();
        let mut a = args("EdgeFindUniqueArgs", vec![lookup]);
        a.schemas = Some(schemas);
        assert_eq!(run_validate(&a, &project).unwrap(), 0);
    }

    #[test]
    fn test_defaults_mode() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        let tag = dir.path().join("tag.yaml");
        std::fs::write(&tag, "name: urgent\ninstanceId: inst1\n").unwrap();

        let mut a = args("Tag", vec![tag.clone()]);
        a.defaults = true;
        assert_eq!(run_validate(&a, &project).unwrap(), 0);

        let mut unknown = args("TagOptionalDefaults", vec![tag]);
        unknown.defaults = true;
        assert!(run_validate(&unknown, &project).is_err(), "defaults mode takes a model name");
    }
}
