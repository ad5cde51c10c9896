use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// Replays recorded visitor sessions into personalization experiment facts
#[derive(Parser)]
#[command(name = "exposure", version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log skipped pages and renderings (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate personalization facts from a sessions file
    Aggregate(commands::aggregate::AggregateArgs),
    /// Inspect layered configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Facts go to stdout, logs to stderr
    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Aggregate(args) => commands::aggregate::run(args).await,
        Commands::Config(args) => commands::config::run(args),
    }
}
