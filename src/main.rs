//! Scholar-Harvest main entry point
//!
//! This is the command-line interface for the Scholar-Harvest results harvester.

use anyhow::Context;
use clap::Parser;
use scholar_harvest::config::{load_config_with_hash, validate, Config};
use scholar_harvest::crawler::{run_crawl, CancelFlag};
use scholar_harvest::output::write_csv;
use scholar_harvest::query::{page_count, page_url};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Scholar-Harvest: a paced bibliographic results harvester
///
/// Scholar-Harvest walks the result pages of a scholarly search one at a time,
/// waiting a randomized delay between requests, and writes the collected
/// records as a CSV table sorted by year and citation count.
#[derive(Parser, Debug)]
#[command(name = "scholar-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paced bibliographic results harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Search term, overriding the config file
    #[arg(long)]
    term: Option<String>,

    /// Number of records to collect, overriding the config file
    #[arg(long)]
    target: Option<usize>,

    /// CSV output path, overriding the config file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Seed for delays and identity rotation
    #[arg(long)]
    seed: Option<u64>,

    /// Validate config and show what would be requested without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(&config, cli.seed).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scholar_harvest=info,warn"),
            1 => EnvFilter::new("scholar_harvest=debug,info"),
            2 => EnvFilter::new("scholar_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line values win over the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(term) = &cli.term {
        config.query.term = term.clone();
    }
    if let Some(target) = cli.target {
        config.crawler.target_count = target;
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = Some(output.display().to_string());
    }
}

/// Handles the --dry-run mode: validates config and shows what would be requested
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let base_query = config
        .search_query()
        .to_url(&config.query.base_url)
        .context("Failed to build the search URL")?;
    let target = config.crawler.target_count;

    println!("=== Scholar-Harvest Dry Run ===\n");

    println!("Query:");
    println!("  Term: {}", config.query.term);
    match (config.query.year_low, config.query.year_high) {
        (None, None) => println!("  Years: any"),
        (low, high) => println!(
            "  Years: {} to {}",
            low.map_or("any".to_string(), |y| y.to_string()),
            high.map_or("any".to_string(), |y| y.to_string())
        ),
    }
    println!("  Language: {}", config.query.language);

    println!("\nCrawler Configuration:");
    println!("  Target records: {}", target);
    println!("  Pages (at most): {}", page_count(target));
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Request delay: {}-{}ms",
        config.crawler.request_delay.min, config.crawler.request_delay.max
    );
    println!(
        "  Page delay: {}-{}ms",
        config.crawler.page_delay.min, config.crawler.page_delay.max
    );
    if let Some(proxy) = &config.crawler.proxy {
        println!("  Proxy: {}", proxy);
    }

    println!("\nIdentities ({}):", config.identity.pool.len());
    for identity in &config.identity.pool {
        println!("  - {}", identity);
    }

    println!("\nOutput:");
    println!("  CSV: {}", config.csv_path().display());

    println!("\n✓ Configuration is valid");
    println!("✓ First request would be: {}", page_url(&base_query, 0));

    Ok(())
}

/// Handles the main crawl: fetch, finalize, write
async fn handle_crawl(config: &Config, seed: Option<u64>) -> anyhow::Result<()> {
    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            on_signal.cancel();
        }
    });

    tracing::info!(
        "Searching for '{}' ({} records)",
        config.query.term,
        config.crawler.target_count
    );

    let report = run_crawl(config, seed, cancel)
        .await
        .context("Failed to start the crawl")?;

    if report.stop_reason.is_failure() {
        tracing::warn!(
            "Crawl stopped early ({}); keeping {} records",
            report.stop_reason,
            report.records.len()
        );
    }

    let elapsed = report.duration().num_seconds();
    let path = config.csv_path();
    let finalized = write_csv(report.records, Some(config.crawler.target_count), &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(
        "Done: {} records ({}) written to {} in {}s",
        finalized.records.len(),
        if finalized.sorted { "sorted" } else { "unsorted" },
        path.display(),
        elapsed
    );

    Ok(())
}
