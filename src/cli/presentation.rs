//! CLI presentation: text and json formatters for models and checkpoints.

use crate::checkpoints::CheckpointModel;
use crate::error::ContentsError;
use crate::model::Model;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_model_json(model: &Model) -> Result<String, ContentsError> {
    serde_json::to_string_pretty(model).map_err(|e| ContentsError::InvalidContent(e.to_string()))
}

/// Directory listing as a table; empty directories get a one-line note
pub fn format_directory_table(model: &Model) -> String {
    let children = model.children().unwrap_or_default();
    if children.is_empty() {
        return format!("{} is empty", display_path(model));
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Type", "Last modified", "Writable"]);
    for child in children {
        table.add_row(vec![
            child.name.clone(),
            child.kind.to_string(),
            child.last_modified.format(TIME_FORMAT).to_string(),
            if child.writable { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_checkpoint_table(path: &str, checkpoints: &[CheckpointModel]) -> String {
    if checkpoints.is_empty() {
        return format!("No checkpoints for {}", path);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Checkpoint", "Last modified"]);
    for cp in checkpoints {
        table.add_row(vec![
            cp.id.clone(),
            cp.last_modified.format(TIME_FORMAT).to_string(),
        ]);
    }
    table.to_string()
}

/// One-line summary after a write, with any validation message below it
pub fn format_saved(verb: &str, model: &Model) -> String {
    let mut out = format!("{} {} {}", verb, model.kind, display_path(model));
    if let Some(message) = &model.message {
        out.push_str(&format!("\nwarning: {}", message));
    }
    out
}

fn display_path(model: &Model) -> String {
    if model.path.is_root() {
        "/".to_string()
    } else {
        model.path.to_string()
    }
}
