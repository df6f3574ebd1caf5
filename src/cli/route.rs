//! CLI route: single route table and run context. Dispatches to the contents manager and presentation.

use crate::cli::parse::{CheckpointCommands, Commands};
use crate::cli::presentation::{
    format_checkpoint_table, format_directory_table, format_model_json, format_saved,
};
use crate::config::ConfigLoader;
use crate::error::{ContentsError, StorageError};
use crate::manager::{ContentsManager, GetOptions, NOTEBOOK_EXTENSION};
use crate::model::{ContentKind, Format, ModelRequest};
use crate::notebook::Notebook;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runtime context for CLI execution: workspace root and the contents manager.
/// Built from the workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    manager: ContentsManager,
    workspace_root: PathBuf,
}

impl RunContext {
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ContentsError> {
        let config = ConfigLoader::load_with(&workspace_root, config_path.as_deref())?;
        let manager = ContentsManager::from_config(&config, &workspace_root)?;
        Ok(Self {
            manager,
            workspace_root,
        })
    }

    /// Context over an already built manager
    pub fn with_manager(manager: ContentsManager, workspace_root: PathBuf) -> Self {
        Self {
            manager,
            workspace_root,
        }
    }

    pub fn manager(&self) -> &ContentsManager {
        &self.manager
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ContentsError> {
        let cm = &self.manager;
        match command {
            Commands::Ls { path, format } => {
                let model = cm.get_with(
                    path,
                    GetOptions {
                        kind: Some(ContentKind::Directory),
                        ..GetOptions::default()
                    },
                )?;
                match format.as_str() {
                    "json" => format_model_json(&model),
                    _ => Ok(format_directory_table(&model)),
                }
            }
            Commands::Get {
                path,
                no_content,
                encoding,
            } => {
                let format = encoding
                    .as_deref()
                    .map(str::parse::<Format>)
                    .transpose()?;
                let model = cm.get_with(
                    path,
                    GetOptions {
                        content: !no_content,
                        kind: format.map(|_| ContentKind::File),
                        format,
                    },
                )?;
                format_model_json(&model)
            }
            Commands::New { path, ext, dir } => {
                let request = dir.then(ModelRequest::directory);
                let model = cm.create(request, path, ext)?;
                Ok(format_saved("Created", &model))
            }
            Commands::Mkdir { path } => {
                let model = cm.create(Some(ModelRequest::directory()), path, "")?;
                Ok(format_saved("Created", &model))
            }
            Commands::Save { path, from } => {
                let request = request_from_local_file(path, from)?;
                let model = cm.save(request, path)?;
                Ok(format_saved("Saved", &model))
            }
            Commands::Cp { from, to } => {
                let model = cm.copy(from, to.as_deref())?;
                Ok(format_saved("Copied to", &model))
            }
            Commands::Mv { from, to } => {
                let model = cm.update(ModelRequest::rename(to.clone()), from)?;
                Ok(format_saved("Moved to", &model))
            }
            Commands::Rm { path } => {
                cm.delete(path)?;
                Ok(format!("Deleted {}", path))
            }
            Commands::Trust { path } => {
                let state = cm.trust_notebook(path)?;
                debug!(path = %path, state = ?state, "Trusted notebook");
                Ok(format!("Trusted {}", path))
            }
            Commands::Untrust { path } => {
                let state = cm.untrust_notebook(path)?;
                debug!(path = %path, state = ?state, "Untrusted notebook");
                Ok(format!("Untrusted {}", path))
            }
            Commands::Checkpoint { command } => self.execute_checkpoint(command),
        }
    }

    fn execute_checkpoint(&self, command: &CheckpointCommands) -> Result<String, ContentsError> {
        let cm = &self.manager;
        match command {
            CheckpointCommands::Create { path } => {
                let cp = cm.create_checkpoint(path)?;
                serde_json::to_string_pretty(&json!({ "path": path, "checkpoint": cp }))
                    .map_err(|e| ContentsError::InvalidContent(e.to_string()))
            }
            CheckpointCommands::List { path } => {
                let checkpoints = cm.list_checkpoints(path)?;
                Ok(format_checkpoint_table(path, &checkpoints))
            }
            CheckpointCommands::Restore { path, id } => {
                cm.restore_checkpoint(path, id)?;
                Ok(format!("Restored {} to checkpoint {}", path, id))
            }
            CheckpointCommands::Delete { path, id } => {
                cm.delete_checkpoint(path, id)?;
                Ok(format!("Deleted checkpoint {} of {}", id, path))
            }
        }
    }
}

/// Model request for a local file: notebook by extension, else text or binary
fn request_from_local_file(target: &str, source: &Path) -> Result<ModelRequest, ContentsError> {
    let bytes = std::fs::read(source).map_err(StorageError::from)?;
    if target.ends_with(NOTEBOOK_EXTENSION) {
        return ModelRequest::notebook(&Notebook::from_slice(&bytes)?);
    }
    Ok(match String::from_utf8(bytes) {
        Ok(text) => ModelRequest::text(text),
        Err(e) => ModelRequest::binary(e.as_bytes()),
    })
}
