//! # Pipeline Module
//!
//! Orchestrates a duplicate scan.
//!
//! ## Pipeline Stages
//! 1. **Index** - Walk the base directory for photos and videos
//! 2. **Detect** - Size, prefix-hash and full-hash tiers
//! 3. **Inspect** - Optional re-encode check on videos (needs ffprobe)
//! 4. **Report** - Text report and JSON-lines records in the base directory
//!
//! Everything runs on the calling thread; progress goes out as events.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineResult};
