//! Configuration System
//!
//! Layered configuration: built-in defaults, the global file
//! (`$XDG_CONFIG_HOME/nbcontents/config.toml`), workspace files under
//! `<root>/.nbcontents/`, then `NBCONTENTS__SECTION__KEY` environment variables.

use crate::checkpoints::DEFAULT_MAX_PER_PATH;
use crate::logging::LoggingConfig;
use crate::notary::{DigestAlgorithm, StorePolicy};
use crate::path::DEFAULT_HIDE_GLOBS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Directory under the served root holding workspace config
pub const WORKSPACE_CONFIG_DIR: &str = ".nbcontents";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentsConfig {
    /// Directory served as the contents root (defaults to the workspace root)
    #[serde(default)]
    pub root_dir: Option<PathBuf>,

    /// Glob patterns left out of directory listings
    #[serde(default = "default_hide_globs")]
    pub hide_globs: Vec<String>,

    #[serde(default = "default_untitled_notebook")]
    pub untitled_notebook: String,

    #[serde(default = "default_untitled_file")]
    pub untitled_file: String,

    #[serde(default = "default_untitled_directory")]
    pub untitled_directory: String,

    /// Storage backend for contents: "fs" or "memory"
    #[serde(default = "default_contents_backend")]
    pub backend: String,

    #[serde(default)]
    pub notary: NotaryConfig,

    #[serde(default)]
    pub checkpoints: CheckpointConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Notebook signing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotaryConfig {
    /// Signing secret: 64 hex chars are used verbatim, anything else is derived from
    #[serde(default)]
    pub secret: Option<String>,

    /// Where a generated key is kept between runs
    #[serde(default)]
    pub secret_file: Option<PathBuf>,

    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Signature store: "sled" or "memory"
    #[serde(default = "default_sled")]
    pub store: String,

    #[serde(default)]
    pub db_path: Option<PathBuf>,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Signatures unseen for this many days stop vouching for their notebook
    #[serde(default)]
    pub max_age_days: Option<u64>,

    /// Fraction of `max_entries` kept when the store culls
    #[serde(default = "default_cull_fraction")]
    pub cull_fraction: f64,
}

/// Checkpoint storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// "sled" or "memory"
    #[serde(default = "default_sled")]
    pub backend: String,

    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_per_path")]
    pub max_per_path: usize,
}

fn default_hide_globs() -> Vec<String> {
    DEFAULT_HIDE_GLOBS.iter().map(|g| g.to_string()).collect()
}

fn default_untitled_notebook() -> String {
    "Untitled".to_string()
}

fn default_untitled_file() -> String {
    "untitled".to_string()
}

fn default_untitled_directory() -> String {
    "Untitled Folder".to_string()
}

fn default_contents_backend() -> String {
    "fs".to_string()
}

fn default_algorithm() -> String {
    DigestAlgorithm::Blake3Keyed.as_str().to_string()
}

fn default_sled() -> String {
    "sled".to_string()
}

fn default_max_entries() -> usize {
    StorePolicy::default().max_entries
}

fn default_cull_fraction() -> f64 {
    StorePolicy::default().cull_fraction
}

fn default_max_per_path() -> usize {
    DEFAULT_MAX_PER_PATH
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            secret: None,
            secret_file: None,
            algorithm: default_algorithm(),
            store: default_sled(),
            db_path: None,
            max_entries: default_max_entries(),
            max_age_days: None,
            cull_fraction: default_cull_fraction(),
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: default_sled(),
            path: None,
            max_per_path: default_max_per_path(),
        }
    }
}

impl Default for ContentsConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            hide_globs: default_hide_globs(),
            untitled_notebook: default_untitled_notebook(),
            untitled_file: default_untitled_file(),
            untitled_directory: default_untitled_directory(),
            backend: default_contents_backend(),
            notary: NotaryConfig::default(),
            checkpoints: CheckpointConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl NotaryConfig {
    /// Store bound derived from the settings
    pub fn policy(&self) -> StorePolicy {
        StorePolicy {
            max_entries: self.max_entries,
            max_age: self
                .max_age_days
                .map(|days| Duration::from_secs(days.saturating_mul(24 * 60 * 60))),
            cull_fraction: self.cull_fraction,
        }
    }
}

impl ContentsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &'static str, message: String| {
            if !ok {
                errors.push(ValidationError { field, message });
            }
        };

        for glob in &self.hide_globs {
            check(
                glob::Pattern::new(glob).is_ok(),
                "hide_globs",
                format!("invalid pattern {:?}", glob),
            );
        }
        for (field, name) in [
            ("untitled_notebook", &self.untitled_notebook),
            ("untitled_file", &self.untitled_file),
            ("untitled_directory", &self.untitled_directory),
        ] {
            check(
                !name.is_empty() && !name.contains('/'),
                field,
                format!("{:?} is not a valid file name", name),
            );
        }
        check(
            matches!(self.backend.as_str(), "fs" | "memory"),
            "backend",
            format!("unknown backend {:?} (expected 'fs' or 'memory')", self.backend),
        );
        check(
            self.notary.algorithm.parse::<DigestAlgorithm>().is_ok(),
            "notary.algorithm",
            format!("unsupported algorithm {:?}", self.notary.algorithm),
        );
        check(
            matches!(self.notary.store.as_str(), "sled" | "memory"),
            "notary.store",
            format!("unknown store {:?} (expected 'sled' or 'memory')", self.notary.store),
        );
        check(
            self.notary.max_entries > 0,
            "notary.max_entries",
            "must be at least 1".to_string(),
        );
        check(
            self.notary.cull_fraction > 0.0 && self.notary.cull_fraction <= 1.0,
            "notary.cull_fraction",
            format!("{} is outside (0, 1]", self.notary.cull_fraction),
        );
        check(
            matches!(self.checkpoints.backend.as_str(), "sled" | "memory"),
            "checkpoints.backend",
            format!(
                "unknown backend {:?} (expected 'sled' or 'memory')",
                self.checkpoints.backend
            ),
        );
        check(
            self.checkpoints.max_per_path > 0,
            "checkpoints.max_per_path",
            "must be at least 1".to_string(),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Served directory; relative `root_dir` is taken against `workspace_root`
    pub fn root_path(&self, workspace_root: &Path) -> PathBuf {
        match &self.root_dir {
            Some(dir) => resolve(workspace_root, dir),
            None => workspace_root.to_path_buf(),
        }
    }

    /// Per-user data directory for persistent stores
    ///
    /// `$XDG_DATA_HOME/nbcontents` (via `directories`), falling back to the
    /// workspace config directory when no home is known.
    pub fn data_dir(&self, workspace_root: &Path) -> PathBuf {
        directories::ProjectDirs::from("", "", "nbcontents")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| workspace_root.join(WORKSPACE_CONFIG_DIR))
    }

    pub fn notary_db_path(&self, workspace_root: &Path) -> PathBuf {
        match &self.notary.db_path {
            Some(path) => resolve(workspace_root, path),
            None => self.data_dir(workspace_root).join("notary.db"),
        }
    }

    pub fn secret_file_path(&self, workspace_root: &Path) -> PathBuf {
        match &self.notary.secret_file {
            Some(path) => resolve(workspace_root, path),
            None => self.data_dir(workspace_root).join("notebook_secret"),
        }
    }

    pub fn checkpoint_db_path(&self, workspace_root: &Path) -> PathBuf {
        match &self.checkpoints.path {
            Some(path) => resolve(workspace_root, path),
            None => self.data_dir(workspace_root).join("checkpoints.db"),
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
