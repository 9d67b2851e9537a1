//! SmartMix CLI - session-aware client for the SmartMix backend

mod commands;
mod logging;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use commands::{Commands, Context};
use smartmix_core::ClientConfig;
use std::path::PathBuf;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "smartmix")]
#[command(about = "Command line client for the SmartMix production system")]
#[command(version)]
struct Cli {
    /// Set logging level (overrides the configured level)
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    /// Log as JSON lines instead of human readable text
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short = 'c', long, global = true, env = "SMARTMIX_CONFIG")]
    config: Option<PathBuf>,

    /// API base URL (overrides configuration)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
        config.validate()?;
    }

    let filter = cli.log_level.map_or_else(
        || config.log_level.clone(),
        |level| Level::from(level).as_str().to_lowercase(),
    );
    logging::init_logging(&filter, cli.json_logs)?;

    debug!(base_url = %config.api.base_url, "Starting SmartMix CLI");

    let context = Context::open(&config)?;
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = cli.command.execute(&context, &mut stdout).await {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
