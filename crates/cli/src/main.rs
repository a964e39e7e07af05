//! Hearthstone Unplug CLI
//!
//! Briefly blocks the game's network traffic, then restores it.

mod app;
mod commands;
mod config;
mod logging;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "hs-unplug")]
#[command(about = "Temporarily cut Hearthstone's network connection", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, env = "HSU_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one disruption cycle and wait for the network to come back
    Unplug {
        /// Block duration in seconds (1-3600)
        #[arg(short, long)]
        duration: Option<u32>,

        /// Print the final status as JSON instead of a progress display
        #[arg(long)]
        json: bool,
    },

    /// Trigger a cycle on every Enter, q to quit
    Interactive {
        /// Block duration in seconds (1-3600)
        #[arg(short, long)]
        duration: Option<u32>,
    },

    /// Print target process status changes until Ctrl+C
    Watch {
        /// Poll interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Manage the stored administrator password
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Read the password from stdin and store it in the OS keyring
    Set,
    /// Remove the stored password
    Delete,
    /// Report whether a password is stored
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let log_dir = if config.log_file { config::log_dir() } else { None };
    let _log_guard = logging::init(config.log_format, log_dir.as_deref())?;

    info!("Hearthstone Unplug v{} starting", unplug_core::VERSION);

    match cli.command {
        Commands::Unplug { duration, json } => {
            let config = config.with_duration(duration)?;
            let controller = app::build_controller(&config)?;
            let succeeded =
                commands::unplug::run(controller, config.block_duration()?, json).await?;
            if !succeeded {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Interactive { duration } => {
            let config = config.with_duration(duration)?;
            let controller = app::build_controller(&config)?;
            commands::interactive::run(controller, config.block_duration()?).await?;
        }

        Commands::Watch { interval } => {
            let poll_interval = match interval {
                Some(0) => anyhow::bail!("--interval must be positive"),
                Some(secs) => std::time::Duration::from_secs(secs),
                None => config.poll_interval(),
            };
            commands::watch::run(
                config.target_process.clone(),
                app::build_detector(&config),
                poll_interval,
            )
            .await?;
        }

        Commands::Credential { action } => {
            let store = app::build_secret_store(&config);
            match action {
                CredentialAction::Set => commands::credential::set(store).await?,
                CredentialAction::Delete => commands::credential::delete(store).await?,
                CredentialAction::Status => commands::credential::status(store).await?,
            }
        }

        Commands::Config => commands::config::show(&config)?,
    }

    Ok(ExitCode::SUCCESS)
}
