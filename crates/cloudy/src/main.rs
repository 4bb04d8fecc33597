//! Cloudy CLI - Benchmark image-tagging vendors against a shared corpus.
//!
//! Cloudy sends every image in a corpus to each configured tagging service,
//! caches the raw responses, matches the returned tags against ground truth
//! and reports per-vendor accuracy and latency.
//!
//! # Usage
//!
//! ```bash
//! # Benchmark every configured vendor
//! cloudy run
//!
//! # Two vendors, a different corpus, no ground truth
//! cloudy run --input ./corpus --vendor msft --vendor google --no-ground-truth
//!
//! # Which vendors have credentials
//! cloudy vendors
//!
//! # View configuration
//! cloudy config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Cloudy - Benchmark image-tagging vendors against ground truth.
#[derive(Parser, Debug)]
#[command(name = "cloudy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to ./cloudy.toml, then the user config directory)
    #[arg(short, long, global = true, env = "CLOUDY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the benchmark over the image corpus
    Run(cli::run::RunArgs),

    /// List vendors and whether their credentials are configured
    Vendors,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI overrides.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default logging settings. Check your config file with `cloudy config path`."
            );
            cloudy_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Cloudy v{}", cloudy_core::VERSION);

    // Dispatch to the appropriate command handler
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config_path).await,
        Commands::Vendors => cli::vendors::execute(config_path),
        Commands::Config(args) => cli::config::execute(args, config_path),
    }
}
