//! Conductor CLI - Command-line interface for the contract workflow engine
//!
//! This CLI gives operators a terminal interface to:
//! - Seed stage and flow definitions from a JSON document
//! - Export per-flow stage duration metrics as TSV

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

pub use error::{CliError, CliResult};

/// Conductor CLI application
#[derive(Parser)]
#[command(name = "conductor")]
#[command(about = "Conductor - municipal contract workflow CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Load stages, flows, and contracts from a JSON seed document
    Seed {
        /// Path to the seed JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export per-flow stage duration metrics as TSV
    Metrics {
        /// Path to the seed JSON file holding the workflow state
        #[arg(short, long)]
        file: PathBuf,

        /// Flow name to report on
        #[arg(long)]
        flow: String,

        /// Write the table to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    // Execute command
    match cli.command {
        Commands::Seed { file } => commands::seed::execute(&file),
        Commands::Metrics { file, flow, out } => {
            commands::metrics::execute(&file, &flow, out.as_deref())
        }
    }
}
