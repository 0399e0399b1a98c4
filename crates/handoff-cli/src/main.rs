//! Escalation routing command line tool
//!
//! Routes, tests and profiles escalation events against rule files.

mod commands;
mod config;

use crate::config::{CliConfig, LogFormat};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "handoff", version, about = "Escalation rule routing engine")]
struct Cli {
    /// Config file (defaults to config/handoff.* when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Override the configured log format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Route an event and print the response
    Route {
        /// Rule files, registered in the given order
        #[arg(long = "rules", required = true, num_args = 1..)]
        rules: Vec<PathBuf>,
        /// Event JSON file, or `-` for stdin
        #[arg(long)]
        event: PathBuf,
        /// Evaluate without applying actions
        #[arg(long)]
        dry_run: bool,
    },
    /// Evaluate one registered rule with per-condition detail
    TestRule {
        #[arg(long = "rules", required = true, num_args = 1..)]
        rules: Vec<PathBuf>,
        /// Rule name
        #[arg(long)]
        rule: String,
        #[arg(long)]
        event: PathBuf,
    },
    /// Evaluate every rule and report per-rule cost
    Profile {
        #[arg(long = "rules", required = true, num_args = 1..)]
        rules: Vec<PathBuf>,
        #[arg(long)]
        event: PathBuf,
    },
    /// Load and validate rule files
    Validate {
        #[arg(long = "rules", required = true, num_args = 1..)]
        rules: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => CliConfig::load_from(path)?,
        None => CliConfig::load()?,
    };
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        settings.log_format = format;
    }

    init_tracing(&settings)?;
    tracing::debug!("Loaded configuration: {:?}", settings);

    let output = match cli.command {
        Commands::Route {
            rules,
            event,
            dry_run,
        } => {
            let router = commands::build_router(&rules, &settings).await?;
            commands::route(&router, commands::read_event(&event)?, dry_run)?
        }
        Commands::TestRule { rules, rule, event } => {
            let router = commands::build_router(&rules, &settings).await?;
            commands::test_rule(&router, &rule, &commands::read_event(&event)?)?
        }
        Commands::Profile { rules, event } => {
            let router = commands::build_router(&rules, &settings).await?;
            commands::profile(&router, &commands::read_event(&event)?)?
        }
        Commands::Validate { rules } => {
            let router = commands::build_router(&rules, &settings).await?;
            commands::validate(&router)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Initialize tracing subscriber. Logs go to stderr so stdout stays JSON.
fn init_tracing(settings: &CliConfig) -> Result<()> {
    let level = &settings.log_level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "handoff={level},handoff_sdk={level},handoff_runtime={level},handoff_core={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
