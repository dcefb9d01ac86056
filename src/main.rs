//! Sumi-Strata main entry point
//!
//! This is the command-line interface for the Sumi-Strata site cartographer.

use clap::Parser;
use std::path::PathBuf;
use sumi_strata::config::{load_config_with_hash, Config};
use sumi_strata::crawler::run_crawl;
use sumi_strata::output::print_summary;
use sumi_strata::pipeline::run_extraction;
use tracing_subscriber::EnvFilter;

/// Sumi-Strata: a site cartographer that reads pages in layers
///
/// Sumi-Strata crawls a single site, following links that only appear after
/// pagination, load-more controls or scrolling, then decomposes every page
/// it found into components and runs eight analysis passes over it.
#[derive(Parser, Debug)]
#[command(name = "sumi-strata")]
#[command(version = "1.0.0")]
#[command(about = "A site cartographer that reads pages in layers", long_about = None)]
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

    /// Crawl and write the URL list, without extracting
    #[arg(long, conflicts_with_all = ["extract_only", "dry_run"])]
    crawl_only: bool,

    /// Extract pages from an existing URL list, without crawling
    #[arg(long, conflicts_with_all = ["crawl_only", "dry_run"])]
    extract_only: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["crawl_only", "extract_only"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    if !cli.extract_only {
        handle_crawl(config.clone(), config_hash).await?;
    }

    if !cli.crawl_only {
        handle_extract(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_strata=info,warn"),
            1 => EnvFilter::new("sumi_strata=debug,info"),
            2 => EnvFilter::new("sumi_strata=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Sumi-Strata Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Mode: {:?}", config.crawler.mode);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.effective_max_depth());
    println!("  Fetch mode: {:?}", config.crawler.fetch_mode);
    println!("  Dynamic discovery: {}", config.crawler.dynamic_discovery);
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Workers: {}", config.crawler.pool_size());
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    if config.crawler.renders() {
        let discovery = &config.discovery;
        println!("\nDynamic Discovery:");
        println!("  Pagination clicks: {}", discovery.max_pagination_clicks);
        println!("  Interactions: {}", discovery.max_interactions);
        println!("  Repeat clicks: {}", discovery.max_repeat_clicks);
        println!("  Scroll attempts: {}", discovery.max_scroll_attempts);

        println!("\nBrowser:");
        println!(
            "  Executable: {}",
            config
                .browser
                .chrome_executable
                .as_deref()
                .unwrap_or("(auto-detect)")
        );
        println!("  Page load timeout: {}s", config.browser.page_load_timeout);
        println!("  Headless: {}", config.browser.headless);
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  URL list: {}", config.output.urls_path);
    println!("  Output directory: {}", config.output.output_dir);
    println!("  Extract workers: {}", config.output.extract_workers);
    println!("  Extract timeout: {}s", config.output.extract_timeout);

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}

/// Handles the crawl phase
async fn handle_crawl(config: Config, config_hash: String) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting crawl of {} (max {} pages)",
        config.crawler.base_url,
        config.crawler.max_pages
    );

    match run_crawl(config, config_hash).await {
        Ok(report) => {
            print_summary(&report.summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the extraction phase
async fn handle_extract(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match run_extraction(config).await {
        Ok(totals) => {
            println!(
                "\n✓ Extraction complete: {} successful ({} skipped), {} failed",
                totals.successful(),
                totals.skipped,
                totals.failed
            );
            println!("✓ Output directory: {}", config.output.output_dir);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Extraction failed: {}", e);
            Err(e.into())
        }
    }
}
