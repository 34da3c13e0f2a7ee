//! # Media Curator
//!
//! Finds duplicate photos and videos, consolidates them, and files the rest
//! into year/month folders by capture date.
//!
//! ## Core Philosophy
//! - **Content decides** - duplicates are byte-identical, never guessed
//! - **Keep the best copy** - the keeper is chosen by trustworthy capture dates
//! - **Leave a trail** - every move, delete and conflict is journaled
//! - **Survive interruption** - organizing resumes where it stopped
//!
//! ## Architecture
//! - `core` - The curation engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{CurateError, Result};

/// Initialize tracing for the library
///
/// Called by the binary. Honors `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default tracing subscriber: {}", e);
    }
}
