//! Workspace config file source: .nbcontents/config.toml and .nbcontents/{env}.toml

use super::super::WORKSPACE_CONFIG_DIR;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use config::FileFormat;
use std::path::Path;

/// Add workspace config files to builder.
/// Precedence: config.toml (base) then {NBCONTENTS_ENV}.toml (env-specific).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join(WORKSPACE_CONFIG_DIR);
    let env_name = std::env::var("NBCONTENTS_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.exists() {
        builder = builder
            .add_source(File::from(base_config_path).format(FileFormat::Toml).required(false));
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.exists() {
        builder = builder
            .add_source(File::from(env_config_path).format(FileFormat::Toml).required(false));
    }

    Ok(builder)
}
