//! Harvester main entry point
//!
//! Loads a TOML configuration, follows `a[href]` links from a seed URL and
//! logs every fetched page.

use anyhow::Context;
use clap::Parser;
use harvester::config::load_config;
use harvester::storage::open_sqlite_store;
use harvester::{Harvester, HarvesterBuilder};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Harvester: a policy-gated link follower
///
/// Fetches the seed URL and every link reachable from it that passes
/// robots.txt, the configured allow/deny prefixes and the depth limit.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(version = "1.0.0")]
#[command(about = "A policy-gated link follower", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URL to start from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Keep visited URLs in this SQLite database across runs
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let mut builder = HarvesterBuilder::from_config(config);
    if let Some(path) = &cli.store {
        let store = open_sqlite_store(path)
            .with_context(|| format!("failed to open visited store {}", path.display()))?;
        builder = builder.store(store);
    }
    let harvester = builder.build()?;

    let pages = follow_links(&harvester)?;

    harvester
        .visit(&cli.seed)
        .with_context(|| format!("failed to visit seed {}", cli.seed))?;

    tracing::info!("Done: {} pages fetched", pages.load(Ordering::Relaxed));
    Ok(())
}

/// Registers the hooks that log pages and follow their links
fn follow_links(harvester: &Harvester) -> anyhow::Result<Arc<AtomicUsize>> {
    let pages = Arc::new(AtomicUsize::new(0));

    let counter = pages.clone();
    harvester.on_response(move |res| {
        counter.fetch_add(1, Ordering::Relaxed);
        println!("{} {}", res.status().as_u16(), res.request().url());
    });

    harvester.on_html("a[href]", |el| {
        let Some(link) = el.attr("href").and_then(|href| el.request().absolute_url(href)) else {
            return;
        };
        match el.request().visit(&link) {
            Ok(()) => {}
            Err(e) if e.is_policy_rejection() || e.is_robots_rejection() => {
                tracing::debug!("Not following {}: {}", link, e);
            }
            Err(e) => tracing::warn!("Failed to visit {}: {}", link, e),
        }
    })?;

    Ok(pages)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("harvester=info,warn"),
            1 => EnvFilter::new("harvester=debug,info"),
            2 => EnvFilter::new("harvester=trace,debug"),
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
