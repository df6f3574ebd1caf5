//! Merge rules: defaults, override order, conflict handling.

use crate::path::DEFAULT_HIDE_GLOBS;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources replace whole values; `hide_globs` from a file or the
/// environment replaces the default list rather than extending it.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("hide_globs", DEFAULT_HIDE_GLOBS.to_vec())?
        .set_default("untitled_notebook", "Untitled")?
        .set_default("untitled_file", "untitled")?
        .set_default("untitled_directory", "Untitled Folder")?
        .set_default("backend", "fs")?
        .set_default("notary.algorithm", "blake3-keyed")?
        .set_default("notary.store", "sled")?
        .set_default("notary.max_entries", 65_535_i64)?
        .set_default("notary.cull_fraction", 0.75)?
        .set_default("checkpoints.backend", "sled")?
        .set_default("checkpoints.max_per_path", crate::checkpoints::DEFAULT_MAX_PER_PATH as i64)
}
