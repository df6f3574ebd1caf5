//! CLI parse: clap types for nbcontents. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// nbcontents CLI - files, notebooks and checkpoints under a contents root
#[derive(Parser)]
#[command(name = "nbcontents")]
#[command(about = "Manage notebooks, files and checkpoints under a contents root")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (served unless `root_dir` is configured)
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Extra configuration file, layered above workspace config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path, used when output is file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the model for a path as JSON
    Get {
        path: String,
        /// Metadata only
        #[arg(long)]
        no_content: bool,
        /// Force file content encoding (text or base64)
        #[arg(long)]
        encoding: Option<String>,
    },
    /// Create an untitled entity in a directory, or at an exact path
    New {
        #[arg(default_value = "")]
        path: String,
        /// Extension deciding notebook vs. text file
        #[arg(long, default_value = ".ipynb")]
        ext: String,
        /// Create a directory instead
        #[arg(long)]
        dir: bool,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Save a local file at a path (notebook if it ends in .ipynb)
    Save {
        path: String,
        /// Local file to read
        #[arg(long)]
        from: PathBuf,
    },
    /// Copy a file; the destination defaults to the source's directory
    Cp { from: String, to: Option<String> },
    /// Rename or move
    Mv { from: String, to: String },
    /// Delete a file or an empty directory
    Rm { path: String },
    /// Trust a notebook's current code cells
    Trust { path: String },
    /// Withdraw trust from a notebook
    Untrust { path: String },
    /// Checkpoint commands
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommands,
    },
}

#[derive(Subcommand)]
pub enum CheckpointCommands {
    /// Snapshot a file
    Create { path: String },
    /// List a path's checkpoints, oldest first
    List { path: String },
    /// Overwrite a file with a checkpoint
    Restore { path: String, id: String },
    /// Drop a checkpoint
    Delete { path: String, id: String },
}
