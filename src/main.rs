mod app;
mod backend;
mod clipboard;
mod commands;
mod config;
mod events;
mod markdown;
mod ui;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "nivesh")]
#[command(version)]
#[command(about = "Chat with the Nivesh financial assistant from your terminal", long_about = None)]
struct Cli {
    /// Chat backend URL (overrides NIVESH_ENDPOINT and the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// The prompt; multiple words are joined with spaces
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.set_endpoint(endpoint);
    }

    match cli.command {
        None => {
            init_file_logging(cli.verbose, &config)?;
            commands::start_chat(config).await
        }
        Some(Commands::Ask { prompt }) => {
            init_stderr_logging(cli.verbose);
            commands::ask(&config, prompt.join(" ")).await
        }
        Some(Commands::InitConfig { force }) => {
            init_stderr_logging(cli.verbose);
            let path = cli
                .config
                .unwrap_or_else(|| config.nivesh_home.join("config.toml"));
            commands::init_config(&path, force)
        }
    }
}

fn env_filter(verbosity: u8) -> EnvFilter {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// The chat screen owns the terminal, so its logs go to a file
fn init_file_logging(verbosity: u8, config: &Config) -> Result<()> {
    let path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(env_filter(verbosity))
        .init();
    Ok(())
}

fn init_stderr_logging(verbosity: u8) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter(verbosity))
        .init();
}
