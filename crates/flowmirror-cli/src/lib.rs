//! # flowmirror-cli: Schema Toolchain Command-Line Interface
//!
//! Provides the `flowmirror` binary. Every subcommand works on one
//! *project*: a data model (the built-in workflow model unless a
//! declaration file is given) plus the generator settings from an optional
//! YAML config file.
//!
//! ## Subcommands
//!
//! - `generate`: write one `<Name>.schema.json` per schema.
//! - `list` / `show`: inspect the generated family.
//! - `validate`: check JSON/YAML payload files against a schema.
//! - `lock`: write or verify the `schemas.lock.json` digest manifest.
//! - `audit`: report object schemas that accept unknown keys.
//!
//! ## Configuration
//!
//! ```yaml
//! model: model.yaml
//! out_dir: generated/schemas
//! generator:
//!   id_base: https://schemas.example.com/workflow/
//!   aggregates: false
//! ```
//!
//! Relative paths in the config file resolve against the directory that
//! contains it.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers take parsed args and a
//!   [`Project`] and return an exit code.
//! - Exit codes: 0 success, 1 validation failure, findings, or drift,
//!   2 operational error.

pub mod audit;
pub mod generate;
pub mod inspect;
pub mod lock;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use flowmirror_core::{workflow_data_model, DataModel};
use flowmirror_schema::{GeneratorConfig, SchemaRegistry};

/// Output directory used when neither `--out` nor `out_dir` is given.
pub const DEFAULT_OUT_DIR: &str = "schemas";

/// File name of the digest manifest.
pub const LOCKFILE_NAME: &str = "schemas.lock.json";

/// Contents of the `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Data-model declaration (YAML or JSON).
    pub model: Option<PathBuf>,
    /// Where `generate` writes schema documents.
    pub out_dir: Option<PathBuf>,
    /// Generator settings.
    pub generator: GeneratorConfig,
}

impl CliConfig {
    /// Load a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}

/// Resolve a path that may be relative to `base`.
///
/// Absolute paths are returned as-is; relative paths are joined onto `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// The data model and settings every subcommand operates on.
#[derive(Debug, Clone)]
pub struct Project {
    config: CliConfig,
    base_dir: PathBuf,
    model: DataModel,
}

impl Project {
    /// Load the project described by the global flags.
    ///
    /// `model_path` overrides the config file's `model`; with neither, the
    /// built-in workflow model is used.
    pub fn open(config_path: Option<&Path>, model_path: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let (config, base_dir) = match config_path {
            Some(path) => {
                let path = resolve_path(path, &cwd);
                let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.clone());
                (CliConfig::load(&path)?, base)
            }
            None => (CliConfig::default(), cwd.clone()),
        };

        let model_file = match model_path {
            Some(path) => Some(resolve_path(path, &cwd)),
            None => config.model.as_deref().map(|p| resolve_path(p, &base_dir)),
        };
        let model = match model_file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading data model");
                DataModel::load(&path)
                    .with_context(|| format!("failed to load data model: {}", path.display()))?
            }
            None => workflow_data_model(),
        };

        Ok(Self::new(config, base_dir, model))
    }

    /// Assemble a project from parts.
    pub fn new(config: CliConfig, base_dir: PathBuf, model: DataModel) -> Self {
        Self {
            config,
            base_dir,
            model,
        }
    }

    /// The built-in workflow model with default settings, rooted at `base_dir`.
    pub fn workflow(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(CliConfig::default(), base_dir.into(), workflow_data_model())
    }

    /// The loaded data model.
    pub fn model(&self) -> &DataModel {
        &self.model
    }

    /// Generator settings.
    pub fn generator(&self) -> &GeneratorConfig {
        &self.config.generator
    }

    /// Generate the schema family.
    pub fn registry(&self) -> Result<SchemaRegistry> {
        SchemaRegistry::generate(&self.model, &self.config.generator)
            .context("schema generation failed")
    }

    /// The schema output directory: `requested`, else the configured
    /// `out_dir`, else [`DEFAULT_OUT_DIR`].
    pub fn out_dir(&self, requested: Option<&Path>) -> PathBuf {
        match requested {
            Some(dir) => dir.to_path_buf(),
            None => resolve_path(
                self.config
                    .out_dir
                    .as_deref()
                    .unwrap_or(Path::new(DEFAULT_OUT_DIR)),
                &self.base_dir,
            ),
        }
    }
}
