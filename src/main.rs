mod api;
mod commands;
mod config;
mod credentials;
mod events;
mod lex;
#[cfg(test)]
mod testing;
mod ui;
mod user_info;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grocer")]
#[command(version)]
#[command(about = "Storefront chatbot and user-info client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chatbot (default)
    Chat,
    /// Show the signed-in user and the backend storage config
    Whoami,
    /// List registered users with their avatars
    Users,
    /// Resolve the avatar URL for a user
    Avatar {
        username: String,
        /// Patch the current user's avatar locally before resolving
        #[arg(long)]
        set: Option<String>,
    },
}

/// Install the tracing subscriber. The chat UI owns the terminal, so it logs to a file.
fn init_logging(config: &Config, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("grocer=info"));

    if to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_path())
            .context("Failed to open log file")?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            init_logging(&config, true)?;
            ui::run_chat(&config).await
        }
        Commands::Whoami => {
            init_logging(&config, false)?;
            commands::whoami(&config).await
        }
        Commands::Users => {
            init_logging(&config, false)?;
            commands::users(&config).await
        }
        Commands::Avatar { username, set } => {
            init_logging(&config, false)?;
            commands::avatar(&config, &username, set).await
        }
    }
}
