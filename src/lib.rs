// src/lib.rs
// Public library surface for the digest binary and integration tests.

pub mod config;
pub mod ingest;
pub mod news;
pub mod rank;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::DigestConfig;
pub use crate::ingest::{Aggregator, PipelineConfig, PipelineReport};
pub use crate::news::{News, Place};
pub use crate::rank::{DateWindow, RankSelector};
