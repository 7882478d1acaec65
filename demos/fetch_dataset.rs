//!
//! Example program that downloads one dataset of a data release
//! with progress reporting.
//!

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gdrive_catalog::{Client, Config, FetchTarget};
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, info};

#[derive(Parser, Debug)]
#[command(name = "fetch_dataset", about = "Download a dataset of a Drive data release")]
struct Args {
    /// Dataset key, e.g. `signal_doc` or `firm_char`
    key: String,

    /// Release year (default: latest configured)
    #[arg(long)]
    release: Option<u16>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Spool the body to a temporary file instead of memory
    #[arg(long)]
    spool: bool,

    /// Output directory
    #[arg(long, short, default_value = ".")]
    output: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    simple_logging::log_to_stderr(LevelFilter::Info);
    log_panics::init();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    let client = Client::builder().config(config).build()?;

    let (_, release) = client.config().release(args.release)?;
    let catalog = client.catalog(release).await?;
    let row = catalog.get(&args.key)?;
    info!("{} is {}", row.download_key, row.full_path);

    let target = if args.spool {
        FetchTarget::Spool
    } else {
        FetchTarget::Memory
    };

    let bar = ProgressBar::no_length();
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bytes} {bytes_per_sec} {msg}")?,
    );
    bar.set_message(row.raw_name.clone());

    let fetched = client
        .download(row, target, &|total: u64| bar.set_position(total))
        .await?;
    bar.finish_with_message(format!("{} downloaded", row.raw_name));

    let (name, data) = if row.is_large_archive() {
        let entry = fetched.first_entry()?;
        (entry.name, entry.data)
    } else {
        (row.raw_name.clone(), fetched.into_bytes()?)
    };

    let path = args.output.join(&name);
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    println!("saved {}", path.display());

    Ok(())
}
