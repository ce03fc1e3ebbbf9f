//! Parqués CLI - Command-line interface
//!
//! Commands:
//! - serve: Start the match server
//! - simulate: Play bot-vs-bot matches and report statistics

mod options;
mod server;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use server::ServerArgs;
use simulate::SimulateArgs;

#[derive(Parser)]
#[command(name = "parques")]
#[command(about = "Parqués match server and simulator")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the match server
    Serve(ServerArgs),
    /// Play bot matches in parallel
    Simulate(SimulateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Serve(args) => server::run(args),
        Commands::Simulate(args) => simulate::run(args, cli.seed),
    }
}

/// Install the fmt subscriber; `RUST_LOG` wins over `--log-level`
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
