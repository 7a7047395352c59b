use std::path::PathBuf;

use thiserror::Error;

use crate::header::SIZE_HEADER_LEN;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SinkError>;

/// The primary error type for all operations in the `volsink` crate.
///
/// Every variant is terminal. The worker never retries: an error aborts the
/// transfer and the process exits non-zero, leaving restart policy to the
/// supervising system.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A required startup parameter is missing or unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The pipe reached end-of-stream before a full size header arrived.
    #[error("short size header: got {got} of {} bytes", SIZE_HEADER_LEN)]
    ShortHeader { got: usize },

    /// The size header bytes do not form a hexadecimal integer.
    #[error("malformed size header: {reason}")]
    MalformedHeader { reason: String },

    /// Opening the named pipe failed.
    #[error("failed to open pipe '{}': {source}", .path.display())]
    ChannelOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O failure while reading payload bytes from the pipe.
    #[error("read error during payload relay: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// An I/O failure while writing to the destination.
    #[error("write error on destination: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
}
