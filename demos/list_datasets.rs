//!
//! Example program that crawls a data release and prints its dataset catalog
//! along with the published signals.
//!

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gdrive_catalog::{Client, Config};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "list_datasets", about = "List the datasets of a Drive data release")]
struct Args {
    /// Release year (default: latest configured)
    #[arg(long)]
    release: Option<u16>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Concurrent folder fetches
    #[arg(long)]
    concurrency: Option<usize>,

    /// Signals to look up, e.g. `AM Mom12m`
    signals: Vec<String>,

    /// Log debug output to stderr
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simple_logging::log_to_stderr(level);
    log_panics::init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    let client = Client::builder().config(config).build()?;
    let release = client.load_release(args.release).await?;

    println!("release {}: {} datasets", release.year, release.catalog.len());
    for row in release.catalog.rows() {
        let kind = if row.is_large_archive() { "zip" } else { "csv" };
        println!("  {:<16} {kind}  {}", row.download_key, row.full_path);
    }

    println!("{} signals published", release.signals.len());
    if !args.signals.is_empty() {
        let selection = release.signals.select(&args.signals);
        for signal in selection.found {
            println!("  {:<16} {}", signal.name, signal.download_url);
        }
        for name in selection.missing {
            println!("  {name:<16} (not available)");
        }
    }

    Ok(())
}
