//! Structural validation of notebook documents
//!
//! Checks run over the document's JSON, so shapes the typed view cannot hold
//! are still reported. Failures are reported as
//! [`ContentsError::ValidationFailed`]; callers attach the message to the model
//! instead of aborting.

use super::{Notebook, NBFORMAT};
use crate::error::ContentsError;
use serde_json::{Map, Value};

const CELL_TYPES: &[&str] = &["code", "markdown", "raw"];
const OUTPUT_TYPES: &[&str] = &["stream", "display_data", "execute_result", "error"];

/// First structural problem found in a document
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub reason: String,
    /// The offending JSON fragment
    pub instance: Value,
}

impl Violation {
    fn new(reason: impl Into<String>, instance: Value) -> Self {
        Self {
            reason: reason.into(),
            instance,
        }
    }

    pub fn message(&self) -> String {
        let instance = serde_json::to_string_pretty(&self.instance)
            .unwrap_or_else(|_| "<UNKNOWN>".to_string());
        format!("{}:\n{}", self.reason, instance)
    }
}

impl From<Violation> for ContentsError {
    fn from(v: Violation) -> Self {
        ContentsError::ValidationFailed(v.message())
    }
}

/// Validate a notebook, reporting the first violation
pub fn validate(nb: &Notebook) -> Result<(), ContentsError> {
    find_violation(nb).map_or(Ok(()), |v| Err(v.into()))
}

/// First violation, if any
pub fn find_violation(nb: &Notebook) -> Option<Violation> {
    check_document(&nb.to_value())
}

/// First violation in a raw notebook document
pub fn check_document(doc: &Value) -> Option<Violation> {
    let Some(fields) = doc.as_object() else {
        return Some(Violation::new("notebook must be an object", doc.clone()));
    };
    let field = |key: &str| fields.get(key).cloned().unwrap_or(Value::Null);

    match fields.get("nbformat") {
        Some(v) if v.as_u64() == Some(u64::from(NBFORMAT)) => {}
        Some(v) => {
            return Some(Violation::new(format!("unsupported nbformat {}", v), v.clone()))
        }
        None => return Some(Violation::new("missing nbformat", Value::Null)),
    }
    if !fields.get("nbformat_minor").is_some_and(Value::is_u64) {
        return Some(Violation::new(
            "nbformat_minor must be a non-negative integer",
            field("nbformat_minor"),
        ));
    }
    if !fields.get("metadata").is_some_and(Value::is_object) {
        return Some(Violation::new("metadata must be an object", field("metadata")));
    }
    let Some(cells) = fields.get("cells").and_then(Value::as_array) else {
        return Some(Violation::new("cells must be a list", field("cells")));
    };
    cells
        .iter()
        .enumerate()
        .find_map(|(idx, cell)| check_cell(idx, cell))
}

fn is_multiline_string(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(_)) => true,
        Some(Value::Array(items)) => items.iter().all(Value::is_string),
        _ => false,
    }
}

fn check_cell(idx: usize, cell: &Value) -> Option<Violation> {
    let Some(fields) = cell.as_object() else {
        return Some(Violation::new(format!("cell {}: must be an object", idx), cell.clone()));
    };
    let violation = |reason: String| Some(Violation::new(reason, cell.clone()));

    let cell_type = match fields.get("cell_type") {
        Some(Value::String(t)) if CELL_TYPES.contains(&t.as_str()) => t.as_str(),
        Some(other) => return violation(format!("cell {}: unknown cell_type {}", idx, other)),
        None => return violation(format!("cell {}: missing cell_type", idx)),
    };
    if !is_multiline_string(fields.get("source")) {
        return violation(format!(
            "cell {}: source must be a string or a list of strings",
            idx
        ));
    }
    if !fields.get("metadata").is_some_and(Value::is_object) {
        return violation(format!("cell {}: metadata must be an object", idx));
    }

    if cell_type != "code" {
        if fields.contains_key("outputs") {
            return violation(format!("cell {}: {} cells cannot have outputs", idx, cell_type));
        }
        return None;
    }
    check_code_cell(idx, cell, fields)
}

fn check_code_cell(idx: usize, cell: &Value, fields: &Map<String, Value>) -> Option<Violation> {
    let Some(outputs) = fields.get("outputs").and_then(Value::as_array) else {
        return Some(Violation::new(
            format!("cell {}: code cell requires an outputs list", idx),
            cell.clone(),
        ));
    };

    match fields.get("execution_count") {
        Some(Value::Null) => {}
        Some(Value::Number(n)) if n.is_u64() => {}
        Some(_) => {
            return Some(Violation::new(
                format!("cell {}: execution_count must be null or a non-negative integer", idx),
                cell.clone(),
            ))
        }
        None => {
            return Some(Violation::new(
                format!("cell {}: code cell requires execution_count", idx),
                cell.clone(),
            ))
        }
    }

    outputs.iter().enumerate().find_map(|(out_idx, output)| {
        let kind = output.get("output_type").and_then(Value::as_str);
        match kind {
            Some(k) if OUTPUT_TYPES.contains(&k) => None,
            _ => Some(Violation::new(
                format!("cell {} output {}: invalid output_type", idx, out_idx),
                output.clone(),
            )),
        }
    })
}
