//! # Audit Subcommand
//!
//! Reports query-input and argument schemas that accept unknown keys.

use anyhow::Result;
use clap::Args;

use flowmirror_schema::audit_registry;

use crate::Project;

/// Arguments for the `flowmirror audit` subcommand.
#[derive(Args, Debug)]
pub struct AuditArgs {}

/// Execute the audit subcommand.
///
/// Returns exit code: 0 if every object schema is closed, 1 on findings.
pub fn run_audit(_args: &AuditArgs, project: &Project) -> Result<u8> {
    let registry = project.registry()?;
    let findings = audit_registry(&registry);
    tracing::info!(findings = findings.len(), "strictness audit complete");

    if findings.is_empty() {
        println!("OK: no open object schemas in {} schemas", registry.len());
        return Ok(0);
    }
    for finding in &findings {
        println!("  FAIL: {finding}");
    }
    println!("\n{} open object schema(s) found.", findings.len());
    Ok(1)
}
