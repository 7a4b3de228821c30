// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # selfheal
//!
//! Command line entry point for the self-healing error analysis service.
//!
//! ## Commands
//!
//! - `selfheal serve` - Run the HTTP API until Ctrl+C or SIGTERM
//! - `selfheal config show|validate|generate` - Configuration management
//! - `selfheal analyze --error-type T --message M` - One-shot synthetic analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use selfheal::commands::{self, AnalyzeArgs, ConfigCommand};
use selfheal_core::domain::config::ServiceConfigManifest;

/// Self-healing error analysis service
#[derive(Parser)]
#[command(name = "selfheal")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SELFHEAL_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API bind address (overrides spec.network.bind_address)
    #[arg(long, global = true, env = "SELFHEAL_HOST")]
    host: Option<String>,

    /// HTTP API port (overrides spec.network.port)
    #[arg(long, global = true, env = "SELFHEAL_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SELFHEAL_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    #[command(name = "serve")]
    Serve,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Analyze a synthetic error scenario and print the result
    #[command(name = "analyze")]
    Analyze(AnalyzeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; a broken file
    // is reported by the command itself.
    let loaded = ServiceConfigManifest::load_or_default(cli.config.clone());
    let (level, format) = match &loaded {
        Ok(config) => (
            config.spec.observability.logging.level.clone(),
            config.spec.observability.logging.format.clone(),
        ),
        Err(_) => ("info".to_string(), "text".to_string()),
    };
    init_logging(cli.log_level.as_deref().unwrap_or(&level), &format)?;

    match cli.command {
        Some(Commands::Serve) => {
            let mut config = loaded.context("Failed to load configuration")?;
            if let Some(host) = cli.host {
                config.spec.network.bind_address = host;
            }
            if let Some(port) = cli.port {
                config.spec.network.port = port;
            }
            commands::serve::run(config).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Analyze(args)) => {
            let config = loaded.context("Failed to load configuration")?;
            commands::analyze::run(args, config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.with_target(false).compact().init();
    }

    Ok(())
}
