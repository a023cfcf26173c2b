//! Driftnet main entry point
//!
//! This is the command-line interface for the Driftnet article crawler.

use anyhow::Context;
use clap::Parser;
use driftnet::config::{load_config_with_hash, ClassifierConfig, Config};
use driftnet::crawler::{run_crawl, CrawlOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Driftnet: a polite, resumable article crawler
///
/// Driftnet crawls configured content sources while respecting robots.txt,
/// per-domain pacing and depth bounds. It stores article content with
/// change detection and periodically revisits stale documents.
///
/// While crawling, type `pause`, `resume` or `stop` on stdin.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version = "1.0.0")]
#[command(about = "A polite, resumable article crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "watch"])]
    dry_run: bool,

    /// Show document statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "watch"])]
    stats: bool,

    /// Keep running and recrawl stale documents on a timer
    #[arg(long)]
    watch: bool,

    /// Do not read pause/resume/stop commands from stdin
    #[arg(long)]
    no_stdin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        let options = CrawlOptions {
            watch: cli.watch,
            read_stdin: !cli.no_stdin,
        };
        handle_crawl(&config, options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated crawl plan
fn handle_dry_run(config: &Config) {
    println!("=== Driftnet Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Per-domain delay: {}ms", config.crawler.delay_ms);
    println!(
        "  Per-domain concurrency: {}",
        config.crawler.max_domain_concurrency
    );
    println!("  Request timeout: {}s", config.crawler.timeout_secs);

    println!("\nRecrawl:");
    if config.recrawl.enabled {
        println!("  Threshold: {}h", config.recrawl.threshold_hours);
        println!("  Batch size: {}", config.recrawl.batch_size);
        println!("  Watch interval: {} minutes", config.recrawl.interval_minutes);
    } else {
        println!("  Disabled");
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());
    println!("  Referer: {}", config.user_agent.referer);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let kind = match source.classifier {
            ClassifierConfig::DatedArticle(_) => "dated-article",
            ClassifierConfig::Namespaced(_) => "namespaced",
        };
        println!(
            "  - {} [{}] domains: {}",
            source.name,
            kind,
            source.domains.join(", ")
        );
        for seed in &source.seeds {
            println!("    * {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.sources.iter().map(|s| s.seeds.len()).sum::<usize>()
    );
}

/// Handles the --stats mode: shows document statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use driftnet::output::{load_statistics, print_statistics};
    use driftnet::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open database {}", config.output.database_path))?;
    let stats = load_statistics(&storage, config.recrawl.threshold_hours)
        .context("failed to load statistics")?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, options: CrawlOptions) -> anyhow::Result<()> {
    let seed_count: usize = config.sources.iter().map(|s| s.seeds.len()).sum();
    tracing::info!(
        "Sources: {}, seed URLs: {}",
        config.sources.len(),
        seed_count
    );

    let report = run_crawl(config, options).await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    if report.stopped {
        tracing::info!("Crawl stopped by operator");
    } else {
        tracing::info!("Crawl completed successfully");
    }

    Ok(())
}
