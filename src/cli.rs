//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to the contents manager.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{CheckpointCommands, Cli, Commands};
pub use presentation::{
    format_checkpoint_table, format_directory_table, format_model_json, format_saved,
};
pub use route::RunContext;
