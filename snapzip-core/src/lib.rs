//! # snapzip-core
//!
//! Streaming snappy compression and tar packing/extraction engine.
//!
//! This crate provides the pieces `snapzip` is built from: content sniffing,
//! a deterministic directory walker, a tar writer with hardlink deduplication,
//! a tar extractor with collision-safe renaming, and a bounded-chunk snappy
//! framing pipeline with progress accounting.

pub mod archive;
pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod signature;
pub mod walk;

pub use config::StreamSummary;
pub use error::{Error, Result};
pub use progress::{ProgressSink, Silent};
pub use signature::Signature;
