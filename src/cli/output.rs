//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ContentsError;

/// Map a contents error to a single line for the terminal, prefixed with its status code
pub fn map_error(e: &ContentsError) -> String {
    format!("error[{}]: {}", e.status_code(), e)
}
