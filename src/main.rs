//! Main entry point for the volsink clone-target worker.

use std::fs::File;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use volsink::cli;
use volsink::dest::{self, Destination};
use volsink::error::{Result, SinkError};
use volsink::header;
use volsink::metrics::ProgressRegistry;
use volsink::progress::ProgressReporter;
use volsink::relay::CountingReader;

fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run_app() {
        error!("{e}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

fn run_app() -> Result<()> {
    info!("starting clone target");
    let args = cli::run();
    let pipe = args
        .pipe
        .ok_or_else(|| SinkError::Config("missing required --pipe argument".into()))?;
    let owner_uid = cli::owner_uid_from_env();

    let total = header::collect_total_size(&pipe)?;
    info!("size read: {total}");

    // Fresh open for the payload phase; the header handle is closed by now.
    let payload = File::open(&pipe).map_err(|source| SinkError::ChannelOpen {
        path: pipe.clone(),
        source,
    })?;
    let reader = CountingReader::new(payload);

    let registry = Arc::new(ProgressRegistry::new());
    let reporter =
        ProgressReporter::new(total, reader.counter(), owner_uid, Arc::clone(&registry)).spawn();

    let cwd = std::env::current_dir()
        .map_err(|e| SinkError::Config(format!("working directory is unusable: {e}")))?;
    let destination = Destination::detect(&args.block_output, &cwd);
    let outcome = dest::write_payload(reader, &destination);

    reporter.stop();
    outcome?;

    info!("clone complete");
    Ok(())
}
