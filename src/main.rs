//! # curate CLI
//!
//! Command-line interface for the media curator.
//!
//! ## Usage
//! ```bash
//! curate scan ~/Pictures --recursive --near-duplicates
//! curate scan ~/Pictures --recursive --consolidate quarantine --yes
//! curate organize ~/Pictures/Inbox --dry-run --limit 200
//! ```

mod cli;

use media_curator::Result;

fn main() -> Result<()> {
    media_curator::init_tracing();
    cli::run()
}
