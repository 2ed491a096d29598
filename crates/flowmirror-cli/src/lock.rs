//! # Lock Subcommand
//!
//! Writes or verifies `schemas.lock.json`: the SHA-256 digest of every
//! generated document, keyed by schema name, serialized through
//! `CanonicalBytes` so the file is byte-identical for the same model and
//! settings.
//!
//! `--check` regenerates the manifest and compares it with the file on
//! disk. On drift, the added, removed, and changed schema names are listed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use flowmirror_core::{sha256_hex, CanonicalBytes, ContentDigest};
use flowmirror_schema::SchemaRegistry;

use crate::{Project, LOCKFILE_NAME};

/// Lockfile format version.
pub const LOCK_VERSION: u32 = 1;

/// Arguments for the `flowmirror lock` subcommand.
#[derive(Args, Debug)]
pub struct LockArgs {
    /// Verify the existing lockfile instead of writing it.
    #[arg(long)]
    pub check: bool,

    /// Lockfile path (default: `schemas.lock.json` in the output directory).
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// The digest manifest of one generated family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaLock {
    /// Format version.
    pub lock_version: u32,
    /// `$id` prefix the documents were generated with.
    pub id_base: String,
    /// Number of schemas.
    pub schema_count: usize,
    /// Digest of each document's canonical form.
    pub schemas: BTreeMap<String, ContentDigest>,
}

/// Differences between two manifests, by schema name.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LockDrift {
    /// Generated now but absent from the lockfile.
    pub added: Vec<String>,
    /// Listed in the lockfile but no longer generated.
    pub removed: Vec<String>,
    /// Present in both with a different digest.
    pub changed: Vec<String>,
}

impl LockDrift {
    /// Whether the two manifests agree.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl SchemaLock {
    /// Build the manifest of `registry`.
    pub fn from_registry(registry: &SchemaRegistry) -> Result<Self> {
        let schemas = registry.manifest().context("failed to digest schemas")?;
        Ok(Self {
            lock_version: LOCK_VERSION,
            id_base: registry.config().normalized_id_base(),
            schema_count: schemas.len(),
            schemas,
        })
    }

    /// Canonical serialization.
    pub fn canonical(&self) -> Result<CanonicalBytes> {
        CanonicalBytes::new(self).context("failed to canonicalize lockfile")
    }

    /// What changed going from `previous` to `self`.
    pub fn drift_from(&self, previous: &SchemaLock) -> LockDrift {
        let mut drift = LockDrift::default();
        for (name, digest) in &self.schemas {
            match previous.schemas.get(name) {
                None => drift.added.push(name.clone()),
                Some(old) if old != digest => drift.changed.push(name.clone()),
                Some(_) => {}
            }
        }
        drift.removed = previous
            .schemas
            .keys()
            .filter(|name| !self.schemas.contains_key(*name))
            .cloned()
            .collect();
        drift
    }
}

/// Execute the lock subcommand.
///
/// Returns exit code: 0 on success, 1 if `--check` finds the lockfile
/// missing or out of date.
pub fn run_lock(args: &LockArgs, project: &Project) -> Result<u8> {
    let registry = project.registry()?;
    let lock = SchemaLock::from_registry(&registry)?;
    let canonical = lock.canonical()?;
    let out_path = match &args.out {
        Some(path) => path.clone(),
        None => project.out_dir(None).join(LOCKFILE_NAME),
    };

    if args.check {
        return check_lock(&lock, &canonical, &out_path);
    }

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let output = [canonical.as_bytes(), b"\n"].concat();
    std::fs::write(&out_path, output)
        .with_context(|| format!("failed to write lockfile: {}", out_path.display()))?;
    tracing::info!(schemas = lock.schema_count, path = %out_path.display(), "wrote lockfile");
    println!("OK: wrote lockfile to {}", out_path.display());
    Ok(0)
}

fn check_lock(lock: &SchemaLock, canonical: &CanonicalBytes, out_path: &Path) -> Result<u8> {
    if !out_path.exists() {
        println!("FAIL: lockfile does not exist: {}", out_path.display());
        return Ok(1);
    }
    let existing = std::fs::read(out_path)
        .with_context(|| format!("failed to read lockfile: {}", out_path.display()))?;

    let expected = canonical.as_bytes();
    if existing == expected || existing == [expected, b"\n".as_slice()].concat() {
        println!("OK: lockfile is up to date");
        return Ok(0);
    }

    println!("FAIL: lockfile is outdated or differs from computed lockfile");
    println!("  Expected digest: sha256:{}", sha256_hex(canonical));
    match serde_json::from_slice::<SchemaLock>(&existing) {
        Ok(previous) => {
            let drift = lock.drift_from(&previous);
            for (label, names) in [
                ("added", &drift.added),
                ("removed", &drift.removed),
                ("changed", &drift.changed),
            ] {
                for name in names {
                    println!("  {label}: {name}");
                }
            }
            if drift.is_empty() && previous.id_base != lock.id_base {
                println!("  id_base: {} -> {}", previous.id_base, lock.id_base);
            }
        }
        Err(e) => println!("  Existing lockfile is unreadable: {e}"),
    }
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CliConfig;
    use flowmirror_core::workflow_data_model;

    fn write_lock(project: &Project, path: &Path) {
        let args = LockArgs {
            check: false,
            out: Some(path.to_path_buf()),
        };
        assert_eq!(run_lock(&args, project).unwrap(), 0);
    }

    fn check(project: &Project, path: &Path) -> u8 {
        let args = LockArgs {
            check: true,
            out: Some(path.to_path_buf()),
        };
        run_lock(&args, project).unwrap()
    }

    #[test]
    fn test_lock_then_check_passes() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        let path = dir.path().join(LOCKFILE_NAME);
        write_lock(&project, &path);
        assert_eq!(check(&project, &path), 0);
    }

    #[test]
    fn test_lockfile_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        let a = dir.path().join("a.lock.json");
        let b = dir.path().join("b.lock.json");
        write_lock(&project, &a);
        write_lock(&project, &b);
        assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
    }

    #[test]
    fn test_check_missing_lockfile_fails() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        assert_eq!(check(&project, &dir.path().join("absent.json")), 1);
    }

    #[test]
    fn test_check_detects_config_drift() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCKFILE_NAME);
        write_lock(&Project::workflow(dir.path()), &path);

        let mut config = CliConfig::default();
        config.generator.aggregates = false;
        let reduced = Project::new(config, dir.path().to_path_buf(), workflow_data_model());
        assert_eq!(check(&reduced, &path), 1);
    }

    #[test]
    fn test_default_path_is_in_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::workflow(dir.path());
        let args = LockArgs {
            check: false,
            out: None,
        };
        assert_eq!(run_lock(&args, &project).unwrap(), 0);
        assert!(dir.path().join("schemas").join(LOCKFILE_NAME).is_file());
    }

    #[test]
    fn test_drift_lists_names() {
        let registry = Project::workflow(".").registry().unwrap();
        let current = SchemaLock::from_registry(&registry).unwrap();
        let mut previous = current.clone();
        previous.schemas.remove("Flow");
        previous.schemas.insert("Legacy".to_string(), current.schemas["Edge"].clone());
        let edge_digest = current.schemas["Node"].clone();
        previous.schemas.insert("Edge".to_string(), edge_digest);

        let drift = current.drift_from(&previous);
        assert_eq!(drift.added, ["Flow"]);
        assert_eq!(drift.removed, ["Legacy"]);
        assert_eq!(drift.changed, ["Edge"]);
    }

    #[test]
    fn test_lockfile_round_trips_through_serde() {
        let registry = Project::workflow(".").registry().unwrap();
        let lock = SchemaLock::from_registry(&registry).unwrap();
        let parsed: SchemaLock = serde_json::from_slice(lock.canonical().unwrap().as_bytes()).unwrap();
        assert_eq!(parsed, lock);
        assert_eq!(parsed.schema_count, registry.len());
    }
}
