//! Specsniff CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod discover;

#[derive(Parser)]
#[command(name = "specsniff")]
#[command(
    about = "Find API specifications in a repository with a budgeted LLM oracle",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Overrides applied on top of the environment configuration
#[derive(clap::Args, Debug, Default)]
pub struct OracleArgs {
    /// Oracle provider (anthropic, openai, local)
    #[arg(long)]
    provider: Option<String>,

    /// Daily budget ceiling in USD
    #[arg(long)]
    budget: Option<f64>,

    /// Files classified concurrently per group
    #[arg(long)]
    group_size: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover candidate files under a directory and classify them
    Scan {
        /// Directory to scan (defaults to current directory)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        #[command(flatten)]
        oracle: OracleArgs,
    },
    /// Classify specific files
    Check {
        /// Files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        oracle: OracleArgs,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("specsniff={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Scan { root, oracle } => {
            tracing::info!("Specsniff v{}", env!("CARGO_PKG_VERSION"));
            commands::scan(root, oracle).await
        }
        Commands::Check { files, oracle } => commands::check(files, oracle).await,
        Commands::Version => {
            println!("Specsniff v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
