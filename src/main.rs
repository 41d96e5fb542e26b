//! Weibo-Threads main entry point
//!
//! This is the command-line interface for the Weibo-Threads comment collector.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use weibo_threads::config::{collect_post_urls, load_config_with_hash, Config};
use weibo_threads::crawler::run_crawl;
use weibo_threads::output::{load_statistics, print_statistics};
use weibo_threads::shortcode::{decode, parse_post_url};
use weibo_threads::storage::SqliteStorage;

/// Weibo-Threads: a paced collector for Weibo comment trees
///
/// Weibo-Threads decodes post short codes and walks every root comment and
/// reply of each post, writing them to CSV and/or SQLite.
#[derive(Parser, Debug)]
#[command(name = "weibo-threads")]
#[command(version = "1.0.0")]
#[command(about = "A paced collector for Weibo comment trees", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "decode")]
    config: Option<PathBuf>,

    /// Post URL to crawl (repeatable); replaces the URLs from the configuration
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Print the message ID of a short code and exit
    #[arg(long, value_name = "CODE", conflicts_with_all = ["dry_run", "stats"])]
    decode: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Truncate the CSV output instead of appending to it
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(code) = &cli.decode {
        return handle_decode(code);
    }

    let config_path = cli
        .config
        .as_deref()
        .context("a configuration file is required")?;

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", config_path.display());
    let (config, config_hash) = load_config_with_hash(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.stats {
        return handle_stats(&config);
    }

    let urls = if cli.urls.is_empty() {
        collect_post_urls(&config).context("failed to read post URLs")?
    } else {
        cli.urls.clone()
    };

    if cli.dry_run {
        handle_dry_run(&config, &urls)
    } else {
        handle_crawl(&config, &config_hash, &urls, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("weibo_threads=info,warn"),
            1 => EnvFilter::new("weibo_threads=debug,info"),
            2 => EnvFilter::new("weibo_threads=trace,debug"),
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

/// Handles the --decode mode: prints the message ID of a short code
fn handle_decode(code: &str) -> anyhow::Result<()> {
    let mid = decode(code).with_context(|| format!("cannot decode {:?}", code))?;
    println!("{}", mid);
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    println!("=== Weibo-Threads Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page size: {}", config.crawler.page_size);
    println!(
        "  Pause every {} comments for {}-{}ms",
        config.crawler.pacing_interval,
        config.crawler.pacing_min_delay_ms,
        config.crawler.pacing_max_delay_ms
    );
    println!(
        "  Pause between posts: {}-{}ms",
        config.crawler.post_pause_min_ms, config.crawler.post_pause_max_ms
    );
    println!(
        "  Post details: {}",
        if config.crawler.fetch_post_details { "fetched" } else { "skipped" }
    );
    println!(
        "  Retry: {} attempts, {}ms initial delay, x{} backoff, {}ms cap",
        config.retry.max_attempts,
        config.retry.initial_delay_ms,
        config.retry.backoff_factor,
        config.retry.max_delay_ms
    );

    println!("\nRequest:");
    println!("  Base URL: {}", config.request.base_url);
    println!("  Locale: {}", config.request.locale);
    println!("  Timeout: {}s", config.request.timeout_secs);
    if let Some(headers) = &config.request.headers_file {
        println!("  Headers file: {}", headers);
    }

    println!("\nOutput:");
    if let Some(csv) = &config.output.csv_path {
        println!(
            "  CSV: {} ({})",
            csv,
            if config.output.append { "append" } else { "truncate" }
        );
    }
    if let Some(posts) = &config.output.posts_csv_path {
        println!("  Posts CSV: {}", posts);
    }
    if let Some(db) = &config.output.database_path {
        println!("  Database: {}", db);
    }

    println!("\nPosts ({}):", urls.len());
    let mut invalid = 0;
    for url in urls {
        match parse_post_url(url) {
            Ok(post) => println!("  - {} -> mid {} (author {})", url, post.mid, post.author_uid),
            Err(e) => {
                invalid += 1;
                println!("  - {} -> {}", url, e);
            }
        }
    }

    println!("\n✓ Configuration is valid");
    if invalid > 0 {
        bail!("{} of {} post URLs are invalid", invalid, urls.len());
    }
    println!("✓ Would crawl {} posts", urls.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let Some(database_path) = &config.output.database_path else {
        bail!("--stats needs output.database-path in the configuration");
    };

    println!("Database: {}\n", database_path);

    // Open the database
    let storage = SqliteStorage::new(Path::new(database_path))
        .with_context(|| format!("failed to open {}", database_path))?;

    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    urls: &[String],
    fresh: bool,
) -> anyhow::Result<()> {
    if urls.is_empty() {
        bail!("no post URLs given; set input.urls, input.urls-file or pass --url");
    }

    if fresh {
        tracing::info!("Truncating existing CSV output");
    }

    let summary = run_crawl(config, config_hash, urls, fresh)
        .await
        .context("crawl failed")?;

    println!(
        "Collected {} comments ({} root, {} replies) from {}/{} posts ({:.1}%)",
        summary.total_comments(),
        summary.root_comments,
        summary.child_comments,
        summary.posts_completed,
        summary.posts_attempted,
        summary.success_rate()
    );

    if summary.details_failed > 0 {
        println!("  Post details unavailable for {} posts", summary.details_failed);
    }

    for failure in &summary.failures {
        println!("  ✗ {}: {}", failure.url, failure.message);
    }

    Ok(())
}
