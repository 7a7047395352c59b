//! # Volsink Core Library
//!
//! This crate provides the core functionality for the `volsink` clone-target
//! worker.
//!
//! The worker receives a single cloned volume image over a local named pipe
//! and persists it to a storage target, while a background task publishes
//! transfer progress to a metrics registry. The pipe protocol has two phases:
//! a 16-byte hexadecimal size header sent in its own open/close cycle, then
//! the raw payload in a second cycle.
//!
//! ## Key Modules
//!
//! - [`header`]: Reads and parses the size header phase of the pipe protocol.
//! - [`relay`]: A pass-through reader that counts every relayed byte.
//! - [`progress`]: The background reporter publishing monotonic percentages.
//! - [`metrics`]: The explicit per-owner progress counter registry.
//! - [`dest`]: Destination resolution and the two payload writers.

pub mod cli;
pub mod dest;
pub mod error;
pub mod header;
pub mod metrics;
pub mod progress;
pub mod relay;

pub use error::SinkError;
