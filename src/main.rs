use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use mirage::events::TracingSink;
use mirage::logging;
use mirage::sync::{SyncEngine, SyncScheduler};

#[derive(Parser)]
#[command(name = "mirage")]
#[command(about = "Periodically mirrors a source directory into a replica")]
#[command(version)]
struct Cli {
    /// Source directory to mirror from
    #[arg(short, long)]
    source: PathBuf,

    /// Replica directory kept identical to the source
    #[arg(short, long)]
    replica: PathBuf,

    /// Seconds between synchronization passes
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Log file; logging goes only to stderr when omitted
    #[arg(short, long)]
    log_file: Option<PathBuf>,
}

/// Reject root pairs that can never mirror safely.
fn validate_roots(source: &Path, replica: &Path) -> Result<()> {
    if source == replica {
        bail!("source and replica must be different directories");
    }
    if replica.starts_with(source) {
        bail!(
            "replica {} must not live inside the source tree {}",
            replica.display(),
            source.display()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.log_file.as_deref())?;

    validate_roots(&cli.source, &cli.replica)?;

    let sink = Arc::new(TracingSink);
    let engine = SyncEngine::new(cli.source, cli.replica, sink.clone());
    let (mut scheduler, stop) =
        SyncScheduler::new(engine, Duration::from_secs(cli.interval), sink);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    scheduler.run().await;
    Ok(())
}
