//! # Generate Subcommand
//!
//! Writes the schema family to disk, one `<Name>.schema.json` per schema.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::Project;

/// Arguments for the `flowmirror generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Output directory (default: the config's `out_dir`, else `schemas/`).
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Execute the generate subcommand.
pub fn run_generate(args: &GenerateArgs, project: &Project) -> Result<u8> {
    let registry = project.registry()?;
    let out_dir = project.out_dir(args.out.as_deref());

    let written = registry
        .write_to_dir(&out_dir)
        .with_context(|| format!("failed to write schemas to {}", out_dir.display()))?;

    tracing::info!(schemas = written, dir = %out_dir.display(), "generated schemas");
    println!("OK: wrote {written} schemas to {}", out_dir.display());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_writes_every_schema() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        let args = GenerateArgs { out: None };
        assert_eq!(run_generate(&args, &project).unwrap(), 0);

        let out = dir.path().join(crate::DEFAULT_OUT_DIR);
        let files = std::fs::read_dir(&out).unwrap().count();
        assert_eq!(files, project.registry().unwrap().len());
        assert!(out.join("FlowWhereUniqueInput.schema.json").is_file());
    }

    #[test]
    fn test_generate_into_explicit_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        let target = dir.path().join("nested").join("out");
        let args = GenerateArgs {
            out: Some(target.clone()),
        };
        assert_eq!(run_generate(&args, &project).unwrap(), 0);
        assert!(target.join("Edge.schema.json").is_file());
    }
}
