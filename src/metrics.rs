//! Explicit progress-metric registry.
//!
//! One cumulative counter per owner identifier, updated only through
//! non-negative deltas. The registry is created by the orchestrator and
//! handed to the progress reporter at construction; it is dropped with the
//! process rather than living in process-global state.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Mutex;

/// Metric name used in the text exposition.
pub const CLONE_PROGRESS_METRIC: &str = "volsink_clone_progress";

/// Cumulative per-owner progress counters.
///
/// The published value for an owner only ever grows: updates are additive
/// and negative deltas are discarded.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
    counters: Mutex<HashMap<String, f64>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current published value for `owner`, `0.0` if nothing was published.
    pub fn get(&self, owner: &str) -> f64 {
        self.counters
            .lock()
            .unwrap()
            .get(owner)
            .copied()
            .unwrap_or(0.0)
    }

    /// Adds a non-negative delta to the owner's counter.
    ///
    /// Negative deltas are dropped, keeping every published value monotonic
    /// regardless of what the caller computed.
    pub fn add(&self, owner: &str, delta: f64) {
        if delta < 0.0 {
            return;
        }
        let mut counters = self.counters.lock().unwrap();
        *counters.entry(owner.to_string()).or_insert(0.0) += delta;
    }

    /// Text exposition of every counter, one line per owner in sorted order,
    /// for the external collector transport to scrape.
    pub fn render(&self) -> String {
        let counters = self.counters.lock().unwrap();
        let mut owners: Vec<_> = counters.iter().collect();
        owners.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = String::new();
        for (owner, value) in owners {
            let _ = writeln!(out, "{CLONE_PROGRESS_METRIC}{{owner_uid=\"{owner}\"}} {value}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpublished_owner_reads_zero() {
        let registry = ProgressRegistry::new();
        assert_eq!(registry.get("nobody"), 0.0);
    }

    #[test]
    fn deltas_accumulate_per_owner() {
        let registry = ProgressRegistry::new();
        registry.add("a", 12.5);
        registry.add("a", 37.5);
        registry.add("b", 1.0);

        assert_eq!(registry.get("a"), 50.0);
        assert_eq!(registry.get("b"), 1.0);
    }

    #[test]
    fn negative_deltas_are_dropped() {
        let registry = ProgressRegistry::new();
        registry.add("a", 40.0);
        registry.add("a", -10.0);
        assert_eq!(registry.get("a"), 40.0);
    }

    #[test]
    fn render_lists_owners_in_sorted_order() {
        let registry = ProgressRegistry::new();
        registry.add("beta", 75.0);
        registry.add("alpha", 25.0);

        let exposition = registry.render();
        assert_eq!(
            exposition,
            "volsink_clone_progress{owner_uid=\"alpha\"} 25\n\
             volsink_clone_progress{owner_uid=\"beta\"} 75\n"
        );
    }

    #[test]
    fn render_of_empty_registry_is_empty() {
        assert!(ProgressRegistry::new().render().is_empty());
    }
}
