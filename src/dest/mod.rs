//! Destination resolution and the two payload writers.
//!
//! The storage target is picked once per transfer from an external marker:
//! if the well-known block device path exists, the payload is relayed
//! verbatim onto that device; otherwise the payload is treated as a tar
//! stream and unpacked into a directory tree. Exactly one writer runs, and
//! either failure is fatal with no cleanup of a partially written target.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SinkError};

/// Well-known device node whose presence switches the worker to raw block
/// mode.
pub const BLOCK_DEVICE_PATH: &str = "/dev/volsink-block";

/// Copy buffer for the raw relay path.
const RELAY_BUF_SIZE: usize = 64 * 1024;

/// Where the payload ends up. Resolved once, immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Raw image bytes written verbatim to a block device node.
    BlockDevice(PathBuf),
    /// Tar payload unpacked into a directory tree.
    DirectoryTree(PathBuf),
}

impl Destination {
    /// Picks the destination from the marker: an existing block device path
    /// selects raw mode, anything else falls back to unpacking into the
    /// directory.
    pub fn detect(block_path: &Path, tree_path: &Path) -> Self {
        if block_path.exists() {
            Destination::BlockDevice(block_path.to_path_buf())
        } else {
            Destination::DirectoryTree(tree_path.to_path_buf())
        }
    }
}

/// Drives the payload stream into the resolved destination.
pub fn write_payload<R: Read>(mut reader: R, dest: &Destination) -> Result<()> {
    match dest {
        Destination::BlockDevice(path) => {
            info!("writing data to block device {}", path.display());
            let mut device = OpenOptions::new()
                .write(true)
                .open(path)
                .map_err(|source| SinkError::Write { source })?;
            relay_to_writer(&mut reader, &mut device)
        }
        Destination::DirectoryTree(path) => {
            info!("unpacking archive stream into {}", path.display());
            let mut archive = tar::Archive::new(reader);
            archive
                .unpack(path)
                .map_err(|source| SinkError::Write { source })
        }
    }
}

/// Verbatim relay with the source and sink sides mapped to their own error
/// variants.
fn relay_to_writer<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> Result<()> {
    let mut buf = vec![0u8; RELAY_BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => return Err(SinkError::Read { source }),
        };
        writer
            .write_all(&buf[..n])
            .map_err(|source| SinkError::Write { source })?;
    }
    writer.flush().map_err(|source| SinkError::Write { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{self, Cursor};

    #[test]
    fn marker_present_selects_the_block_device() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("block");
        fs::write(&marker, []).unwrap();

        let dest = Destination::detect(&marker, dir.path());
        assert_eq!(dest, Destination::BlockDevice(marker));
    }

    #[test]
    fn marker_absent_selects_the_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("no-block");

        let dest = Destination::detect(&marker, dir.path());
        assert_eq!(dest, Destination::DirectoryTree(dir.path().to_path_buf()));
    }

    #[test]
    fn block_destination_receives_the_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join("device");
        fs::write(&device, []).unwrap();

        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        write_payload(
            Cursor::new(payload.clone()),
            &Destination::BlockDevice(device.clone()),
        )
        .unwrap();

        assert_eq!(fs::read(&device).unwrap(), payload);
    }

    #[test]
    fn directory_destination_unpacks_the_tar_stream() {
        let dir = tempfile::tempdir().unwrap();

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(11);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "disk/image.raw", &b"hello clone"[..])
            .unwrap();
        let payload = builder.into_inner().unwrap();

        write_payload(
            Cursor::new(payload),
            &Destination::DirectoryTree(dir.path().to_path_buf()),
        )
        .unwrap();

        let unpacked = fs::read(dir.path().join("disk/image.raw")).unwrap();
        assert_eq!(unpacked, b"hello clone");
    }

    #[test]
    fn garbage_tar_stream_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_payload(
            Cursor::new(vec![0xa5u8; 2048]),
            &Destination::DirectoryTree(dir.path().to_path_buf()),
        );
        assert!(matches!(result, Err(SinkError::Write { .. })));
    }

    #[test]
    fn missing_device_node_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_payload(
            Cursor::new(vec![1u8; 16]),
            &Destination::BlockDevice(dir.path().join("absent")),
        );
        assert!(matches!(result, Err(SinkError::Write { .. })));
    }

    #[test]
    fn sink_failure_mid_stream_is_a_write_error() {
        // Accepts the first buffer, then the device "fills up".
        struct FlakySink {
            writes: usize,
        }
        impl Write for FlakySink {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.writes += 1;
                if self.writes > 1 {
                    Err(io::Error::new(io::ErrorKind::WriteZero, "device full"))
                } else {
                    Ok(buf.len())
                }
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut source = Cursor::new(vec![0u8; RELAY_BUF_SIZE * 3]);
        let mut sink = FlakySink { writes: 0 };
        let result = relay_to_writer(&mut source, &mut sink);
        assert!(matches!(result, Err(SinkError::Write { .. })));
    }

    #[test]
    fn source_failure_is_a_read_error() {
        struct BrokenSource;
        impl Read for BrokenSource {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "producer died"))
            }
        }

        let mut sink = Vec::new();
        let result = relay_to_writer(&mut BrokenSource, &mut sink);
        assert!(matches!(result, Err(SinkError::Read { .. })));
    }
}
