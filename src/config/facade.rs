//! Entry point for loading configuration

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::ContentsConfig;
use crate::error::ContentsError;
use config::{Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`ContentsConfig`] from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, workspace files, environment
    pub fn load(workspace_root: &Path) -> Result<ContentsConfig, ContentsError> {
        Self::load_with(workspace_root, None)
    }

    /// Like [`ConfigLoader::load`], with an explicit file layered above the
    /// workspace files and below the environment
    pub fn load_with(
        workspace_root: &Path,
        extra_file: Option<&Path>,
    ) -> Result<ContentsConfig, ContentsError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let mut builder = workspace_file::add_to_builder(builder, workspace_root)?;
        if let Some(file) = extra_file {
            debug!(config_path = %file.display(), "Loading explicit configuration file");
            builder = builder.add_source(File::from(file).format(FileFormat::Toml).required(true));
        }
        let builder = builder.add_source(
            Environment::with_prefix("NBCONTENTS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("hide_globs"),
        );
        let config: ContentsConfig = builder.build()?.try_deserialize()?;
        Self::checked(config)
    }

    /// Defaults plus a single file; no global, workspace or environment layers
    pub fn load_from_file(path: &Path) -> Result<ContentsConfig, ContentsError> {
        let config: ContentsConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .build()?
            .try_deserialize()?;
        Self::checked(config)
    }

    /// Location of the global config file, if a home is known
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn checked(config: ContentsConfig) -> Result<ContentsConfig, ContentsError> {
        config.validate().map_err(|errors| {
            ContentsError::ConfigError(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        Ok(config)
    }
}
