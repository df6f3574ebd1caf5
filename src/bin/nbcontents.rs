//! nbcontents CLI Binary
//!
//! Command-line interface over the contents manager.

use clap::Parser;
use nbcontents::cli::{Cli, RunContext};
use nbcontents::config::ConfigLoader;
use nbcontents::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("nbcontents CLI starting");

    let context = match RunContext::new(cli.root.clone(), cli.config.clone()) {
        Ok(ctx) => {
            info!(info = %ctx.manager().info_string(), "CLI context initialized");
            ctx
        }
        Err(e) => {
            error!("Error initializing contents manager: {}", e);
            eprintln!("{}", nbcontents::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", nbcontents::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    // Logging stays off unless --verbose is set
    if !cli.verbose {
        return LoggingConfig {
            level: "off".to_string(),
            ..LoggingConfig::default()
        };
    }

    let loaded = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.root),
    };
    let (mut config, data_dir) = match loaded {
        Ok(c) => {
            let data_dir = c.data_dir(&cli.root);
            (c.logging, Some(data_dir))
        }
        Err(_) => (LoggingConfig::default(), None),
    };

    // CLI arguments take precedence
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    } else if config.file.is_relative() {
        // Relative log files live in the data directory
        if let Some(dir) = data_dir {
            config.file = dir.join(&config.file);
        }
    }

    config
}
