//! Pass-through reader that counts relayed bytes.

use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A `Read` decorator that adds the size of every successful read to a
/// shared counter.
///
/// The counter is the only state shared between the relay path and the
/// progress reporter; with exactly one incrementing side and one sampling
/// side a relaxed atomic is sufficient. Bytes are never buffered or
/// reordered, and underlying stream errors pass through unchanged without
/// touching the counter.
pub struct CountingReader<R> {
    inner: R,
    transferred: Arc<AtomicU64>,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            transferred: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared handle to the live byte count.
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.transferred)
    }

    /// Bytes consumed from the source so far.
    pub fn bytes_transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.transferred.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}
