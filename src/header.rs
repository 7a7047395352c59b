//! Phase one of the pipe protocol: the size header.
//!
//! The producer announces the payload length as exactly [`SIZE_HEADER_LEN`]
//! ASCII hexadecimal bytes, written in a dedicated open/close cycle of the
//! pipe. The payload follows in a second, independent cycle; a handle must
//! never be reused across both phases.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SinkError};

/// Exact byte length of the hexadecimal size header.
pub const SIZE_HEADER_LEN: usize = 16;

/// Reads the size header from an already-open stream and parses it.
///
/// End-of-stream before [`SIZE_HEADER_LEN`] bytes is a
/// [`SinkError::ShortHeader`]; bytes that are not hexadecimal ASCII are a
/// [`SinkError::MalformedHeader`].
pub fn read_total_size<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; SIZE_HEADER_LEN];
    let mut filled = 0;
    while filled < SIZE_HEADER_LEN {
        let n = reader
            .read(&mut buf[filled..])
            .map_err(|source| SinkError::Read { source })?;
        if n == 0 {
            return Err(SinkError::ShortHeader { got: filled });
        }
        filled += n;
    }

    let text = std::str::from_utf8(&buf).map_err(|_| SinkError::MalformedHeader {
        reason: "header is not ASCII text".into(),
    })?;
    u64::from_str_radix(text, 16).map_err(|e| SinkError::MalformedHeader {
        reason: e.to_string(),
    })
}

/// Opens the pipe, reads the size header and closes it again.
///
/// The pipe is half duplex and single use per session, so the header phase
/// gets its own open/close cycle; the caller reopens the same path for the
/// payload phase.
pub fn collect_total_size(pipe: &Path) -> Result<u64> {
    debug!("reading total size from {}", pipe.display());
    let mut file = File::open(pipe).map_err(|source| SinkError::ChannelOpen {
        path: pipe.to_path_buf(),
        source,
    })?;
    read_total_size(&mut file)
}
