//! Background progress publication for a single transfer.
//!
//! One reporter thread samples the relay counter on a fixed cadence and
//! feeds the metrics registry. The published value is monotonic by
//! construction: each tick only ever adds the positive difference between
//! the freshly computed percentage and what was already published, so
//! sampling jitter or a counter anomaly can never make the external metric
//! regress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::debug;

use crate::metrics::ProgressRegistry;

/// Cadence of metric publication.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Samples a transfer's byte counter and publishes monotonic percentage
/// updates for one owner.
pub struct ProgressReporter {
    total: u64,
    transferred: Arc<AtomicU64>,
    owner_uid: String,
    registry: Arc<ProgressRegistry>,
}

impl ProgressReporter {
    pub fn new(
        total: u64,
        transferred: Arc<AtomicU64>,
        owner_uid: String,
        registry: Arc<ProgressRegistry>,
    ) -> Self {
        Self {
            total,
            transferred,
            owner_uid,
            registry,
        }
    }

    /// Publishes one sample.
    ///
    /// A zero total publishes nothing (the ratio would be meaningless).
    /// Otherwise the completed percentage is compared with the last
    /// published value and only a strictly positive difference is added.
    pub fn publish_once(&self) {
        if self.total == 0 {
            return;
        }
        let current = self.transferred.load(Ordering::Relaxed) as f64 / self.total as f64 * 100.0;
        let published = self.registry.get(&self.owner_uid);
        if current > published {
            self.registry.add(&self.owner_uid, current - published);
        }
        debug!(owner_uid = %self.owner_uid, "clone progress {:.2}%", current);
    }

    /// Spawns the reporting thread, ticking once per [`REPORT_INTERVAL`]
    /// until the returned handle is stopped or dropped.
    pub fn spawn(self) -> ReporterHandle {
        self.spawn_with_interval(REPORT_INTERVAL)
    }

    fn spawn_with_interval(self, interval: Duration) -> ReporterHandle {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let thread = thread::spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => self.publish_once(),
                    recv(stop_rx) -> _ => break,
                }
            }
        });
        ReporterHandle {
            stop: Some(stop_tx),
            thread: Some(thread),
        }
    }
}

/// Handle binding the reporter thread to the transfer's lifetime.
///
/// The orchestrator stops the reporter on success and failure paths alike;
/// dropping the handle has the same effect, so early returns cannot leak the
/// thread.
pub struct ReporterHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ReporterHandle {
    /// Signals the reporter thread and waits for it to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel, which wakes the
        // select loop immediately.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ReporterHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
