use clap::Parser;
use std::path::PathBuf;

use crate::dest;

/// Environment variable carrying the owner identifier used as the metrics
/// label for this transfer.
pub const OWNER_UID_VAR: &str = "OWNER_UID";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path of the named pipe carrying the size header and the payload.
    ///
    /// Kept optional at the parser level so that a missing value is reported
    /// through the worker's own error handling and exit status instead of
    /// the argument parser's.
    #[arg(long)]
    pub pipe: Option<PathBuf>,

    /// `[ADVANCED]` Override the block device marker path.
    #[arg(long, default_value = dest::BLOCK_DEVICE_PATH, hide = true)]
    pub block_output: PathBuf,
}

/// Owner identifier from the environment.
///
/// An absent variable is not an error; the transfer is then reported under
/// an empty owner id.
pub fn owner_uid_from_env() -> String {
    std::env::var(OWNER_UID_VAR).unwrap_or_default()
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Args {
    Args::parse()
}
