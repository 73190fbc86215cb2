mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sift::config::SiftConfig;
use sift::server;

#[derive(Parser)]
#[command(name = "sift", version, about = "Grounded question answering over document and graph evidence")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP query server
    Serve,
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,
        /// Override the initial per-source retrieval limit
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Check seed data and configuration health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = SiftConfig::load()?;

    // Initialize tracing with the configured log level, logging to stderr so
    // stdout stays clean for `ask` output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Ask { question, limit } => {
            cli::ask(config, question, limit).await?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
    }

    Ok(())
}
