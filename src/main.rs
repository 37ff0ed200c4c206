//! Marketrake main entry point
//!
//! Command-line interface for the multi-channel catalog harvester.

use clap::Parser;
use marketrake::channel::{channel_url, Channel};
use marketrake::config::load_config_with_hash;
use marketrake::orchestrator::MultiChannelCrawler;
use marketrake::scheduler::Scheduler;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Marketrake: a multi-channel marketplace catalog harvester
///
/// Marketrake walks a marketplace's discovery channels (best sellers,
/// movers & shakers, outlet, warehouse deals) through a rotating proxy
/// pool, filters out restricted listings, and writes provenance-stamped
/// product records plus compliance reports.
#[derive(Parser, Debug)]
#[command(name = "marketrake")]
#[command(version = "1.0.0")]
#[command(about = "A multi-channel marketplace catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Channel to harvest
    #[arg(long, default_value = "all",
          value_parser = ["all", "best_sellers", "movers_shakers", "outlet", "warehouse"])]
    channel: String,

    /// Restrict the run to one category (e.g. electronics)
    #[arg(long)]
    category: Option<String>,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with = "schedule")]
    dry_run: bool,

    /// Keep running, re-harvesting each channel on its configured cadence
    #[arg(long)]
    schedule: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

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

    let channels = selected_channels(&cli.channel)?;

    if cli.dry_run {
        handle_dry_run(&config, &channels, cli.category.as_deref())?;
    } else if cli.schedule {
        handle_schedule(config, config_hash).await?;
    } else {
        handle_harvest(config, config_hash, &channels, cli.category.as_deref()).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("marketrake=info,warn"),
            1 => EnvFilter::new("marketrake=debug,info"),
            2 => EnvFilter::new("marketrake=trace,debug"),
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

fn selected_channels(name: &str) -> Result<Vec<Channel>, Box<dyn std::error::Error>> {
    if name == "all" {
        Ok(Channel::ALL.to_vec())
    } else {
        Ok(vec![Channel::from_name(name)?])
    }
}

/// Handles the --dry-run mode: validates config and shows the harvest plan
fn handle_dry_run(
    config: &marketrake::config::Config,
    channels: &[Channel],
    category: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    use marketrake::channel::ChannelManager;

    println!("=== Marketrake Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Region: {}", config.crawler.region);
    println!("  Requests per second: {}", config.crawler.requests_per_second);
    println!("  Retry count: {}", config.crawler.retry_count);
    println!("  Max workers: {}", config.crawler.max_workers);
    println!("  Timeout: {}s", config.crawler.timeout_secs);

    println!("\nProxy:");
    if config.proxy.list_path.is_empty() {
        println!("  (none, running direct)");
    } else {
        println!("  List: {}", config.proxy.list_path);
        println!("  Verify on start: {}", config.proxy.verify_on_start);
    }

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);

    let manager = ChannelManager::with_overrides(&config.channels)?;
    for channel in channels {
        let profile = manager.profile(*channel);
        println!("\nChannel: {}", channel.display_name());
        println!("  Depth: {}", profile.depth);
        println!("  Products per category: {}", profile.max_products);
        let categories: Vec<&str> = match category {
            Some(cat) => vec![cat],
            None => profile.categories.iter().map(String::as_str).collect(),
        };
        for cat in categories {
            println!(
                "  - {} -> {}",
                cat,
                channel_url(*channel, Some(cat), &config.crawler.region)
            );
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --schedule mode: runs channels on their cadences forever
async fn handle_schedule(
    config: marketrake::config::Config,
    config_hash: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let schedule = config.schedule.clone();
    let crawler = Arc::new(
        MultiChannelCrawler::new(config)
            .await?
            .with_config_hash(config_hash),
    );

    tracing::info!("Entering scheduled mode; press Ctrl-C to stop");
    let scheduler = Scheduler::new(crawler, schedule);

    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
    }
    Ok(())
}

/// Handles a one-shot harvest of the selected channels
async fn handle_harvest(
    config: marketrake::config::Config,
    config_hash: String,
    channels: &[Channel],
    category: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let crawler = MultiChannelCrawler::new(config)
        .await?
        .with_config_hash(config_hash);

    match crawler.run(channels, category).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest complete: {} products ({} safe, {} review, {} banned)",
                summary.total_products,
                summary.safe_products,
                summary.review_products,
                summary.banned_products
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
