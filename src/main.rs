//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest bulk fetcher.

use anyhow::Context;
use clap::Parser;
use page_harvest::config::{apply_env_overrides, load_config_with_hash, validate, Config};
use page_harvest::crawler::harvest;
use page_harvest::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: a bulk concurrent page fetcher
///
/// Fetches every URL of a newline-delimited list in fixed-size concurrent
/// chunks and streams the raw HTML of each page into a JSON array file.
/// Without arguments, reads `urls.txt` and writes `all_content.json`.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version)]
#[command(about = "A bulk concurrent page fetcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// URL list to read (overrides the config file)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file to write (overrides the config file)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// URLs fetched concurrently per chunk (overrides the config file)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;

    let stats = harvest(&config).await.context("Harvest failed")?;

    print_statistics(&stats);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Log lines go to stderr; stdout is reserved for the run summary.
fn setup_logging(verbose: u8, quiet: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = logging_filter(verbose, quiet, rust_log.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Picks the log filter: a valid `RUST_LOG` wins over the verbosity flags
fn logging_filter(verbose: u8, quiet: bool, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Ignoring invalid RUST_LOG ({}): {}", directives, e),
        }
    }

    if quiet {
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::new("page_harvest=info,warn"),
        1 => EnvFilter::new("page_harvest=debug,info"),
        2 => EnvFilter::new("page_harvest=trace,debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Loads the config file (if any), then applies environment and CLI overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            let mut config = Config::default();
            apply_env_overrides(&mut config);
            config
        }
    };

    if let Some(input) = &cli.input {
        config.input.urls_path = input.display().to_string();
    }
    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.crawler.chunk_size = chunk_size;
    }

    validate(&config).context("Invalid configuration")?;

    Ok(config)
}
