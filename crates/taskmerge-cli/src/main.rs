//! Taskmerge CLI - Command-line interface for the Taskmerge conflict engine
//!
//! Provides commands for:
//! - Analyzing per-task change sets of one file for conflicts
//! - Inspecting the compatibility rule table
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taskmerge_core::config::Config;

mod commands;
mod output;

use commands::{analyze::AnalyzeCommand, config::ConfigCommand, rules::RulesCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "taskmerge",
    version,
    about = "Detect and resolve conflicts between concurrent task edits"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect conflicts in a file's per-task analyses
    Analyze(AnalyzeCommand),
    /// Show the change-kind compatibility table
    Rules(RulesCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing; RUST_LOG wins over flags and config
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let format = OutputFormat::from_json_flag(cli.json);

    match cli.command {
        Commands::Analyze(cmd) => cmd.execute(&config, format).await,
        Commands::Rules(cmd) => cmd.execute(format).await,
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
    }
}
