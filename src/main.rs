//! Sitemapper main entry point
//!
//! This is the command-line interface for the Sitemapper site crawler.

use anyhow::{Context, Result};
use clap::Parser;
use sitemapper::config::{load_config_with_hash, Config};
use sitemapper::crawler::build_http_client;
use sitemapper::mapper::SitemapSettings;
use sitemapper::{Crawler, CycleOutcome, LogSinks, SiteMapper};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sitemapper: keeps a sitemap of one site up to date
///
/// Sitemapper crawls every page reachable from a starting path on a single
/// domain, recrawls on a schedule, and writes the discovered pages as a
/// sitemap.xml document.
#[derive(Parser, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "A single-domain sitemap crawler", long_about = None)]
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
    #[arg(long, conflicts_with = "once")]
    dry_run: bool,

    /// Crawl once, print or write the sitemap, and exit
    #[arg(long, conflicts_with = "dry_run")]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.once {
        handle_once(&config).await
    } else {
        handle_serve(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemapper=info,warn"),
            1 => EnvFilter::new("sitemapper=debug,info"),
            2 => EnvFilter::new("sitemapper=trace,debug"),
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

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config) -> Result<()> {
    let sitemap = SitemapSettings::from_config(config)?;

    println!("=== Sitemapper Dry Run ===\n");

    println!("Site:");
    println!("  Domain: {}", config.domain()?);
    println!("  Starting URL: {}", config.site.starting_url);
    match &config.site.link_attributes {
        Some(attributes) => println!("  Link attributes: {}", attributes.join(", ")),
        None => println!("  Link attributes: (anchors only)"),
    }

    println!("\nSchedule:");
    println!("  Startup delay: {:?}", config.schedule.startup_delay());
    if config.schedule.crawl_interval().is_zero() {
        println!("  Crawl interval: manual only");
    } else {
        println!("  Crawl interval: {:?}", config.schedule.crawl_interval());
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Request timeout: {}s", config.http.request_timeout_secs);

    println!("\nSitemap:");
    println!("  Output domain: {}", sitemap.base_domain);
    println!(
        "  Exclude pattern: {}",
        sitemap.exclude_pattern.as_deref().unwrap_or("(none)")
    );
    println!("  Trailing slash: {}", sitemap.trailing_slash);
    match &sitemap.output_path {
        Some(path) => println!("  Output path: {}", path.display()),
        None => println!("  Output path: (not written)"),
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --once mode: a single crawl cycle, then the sitemap
async fn handle_once(config: &Config) -> Result<()> {
    let sitemap = SitemapSettings::from_config(config)?;
    let client = build_http_client(&config.http).context("failed to build HTTP client")?;
    let crawler = Crawler::new(
        config.domain()?,
        config.link_attributes()?,
        client,
        LogSinks::new(),
    );

    match crawler.run_cycle(&config.site.starting_url).await {
        CycleOutcome::Completed(stats) => {
            tracing::info!("Crawl found {} pages ({} failed)", stats.visited, stats.failed)
        }
        CycleOutcome::SeedRejected => anyhow::bail!(
            "starting URL {} is not part of {}",
            config.site.starting_url,
            crawler.domain()
        ),
    }

    if sitemap.output_path.is_some() {
        sitemap
            .publish(&crawler)
            .context("failed to write sitemap")?;
    } else {
        let xml = crawler
            .generate_sitemap(&sitemap.options())
            .context("failed to render sitemap")?;
        print!("{}", xml);
    }

    Ok(())
}

/// Handles the default mode: crawl on schedule until Ctrl-C
async fn handle_serve(config: Config) -> Result<()> {
    let sitemap = SitemapSettings::from_config(&config)?;

    if sitemap.output_path.is_none() {
        tracing::warn!("No sitemap output-path configured; sitemaps will not be written");
    }

    let on_crawl = sitemap.clone();
    let mapper = SiteMapper::builder(config)
        .on_crawl(move |crawler| {
            // errors are logged by the publish task
            let _ = on_crawl.spawn_publish(crawler);
        })
        .start()
        .context("failed to start sitemapper")?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // the startup crawl does not invoke the callback
    let interrupted = tokio::select! {
        result = &mut ctrl_c => {
            result.context("failed to listen for Ctrl-C")?;
            true
        }
        _ = mapper.wait_for_cycles(1) => false,
    };

    if !interrupted {
        let _ = sitemap.spawn_publish(mapper.crawler()).await;
        ctrl_c.await.context("failed to listen for Ctrl-C")?;
    }

    tracing::info!("Shutting down after {} crawl cycles", mapper.cycles_completed());
    mapper.shutdown().await;

    Ok(())
}
