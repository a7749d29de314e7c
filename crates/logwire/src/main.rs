//! logwire - real-time log streaming
//!
//! # Usage
//!
//! ```bash
//! # Run the collector
//! logwire serve
//! logwire --config logwire.toml serve
//!
//! # Watch lines from every api process of the web app
//! logwire tail --app web --proc api
//!
//! # Ship a command's output
//! logwire agent --app web --proc api --command "./server"
//! ```

mod cmd;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logwire_config::{Config, LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// logwire - real-time log streaming
#[derive(Parser, Debug)]
#[command(name = "logwire")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the collector
    Serve(cmd::serve::ServeArgs),

    /// Stream matching lines from a running collector
    Tail(cmd::tail::TailArgs),

    /// Ship stdin, a file, or a command's output to a collector
    Agent(cmd::agent::AgentArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let level = cli
        .log_level
        .unwrap_or_else(|| config.log.level.as_str().to_string());
    init_logging(&level, &config.log)?;

    match cli.command {
        Command::Serve(args) => cmd::serve::run(args, config).await,
        Command::Tail(args) => cmd::tail::run(args).await,
        Command::Agent(args) => cmd::agent::run(args, config.agent).await,
    }
}

/// Load the config file if one was given, defaults otherwise
fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    if !path.exists() {
        anyhow::bail!("config file not found: {}", path.display());
    }
    Config::from_file(path).context("failed to load configuration")
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {e}"))?;

    let (writer, ansi) = match &log.output {
        LogOutput::Stdout => (
            BoxMakeWriter::new(std::io::stdout),
            atty::is(atty::Stream::Stdout),
        ),
        LogOutput::Stderr => (
            BoxMakeWriter::new(std::io::stderr),
            atty::is(atty::Stream::Stderr),
        ),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match log.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    Ok(())
}
