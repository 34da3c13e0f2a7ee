//! # Organize Module
//!
//! Files the top-level media of a directory into `YYYY/MM` folders by
//! capture date.
//!
//! ## Flow
//! 1. Candidates: top-level media, oldest modification time first,
//!    optionally capped to the N oldest. The list is frozen in a manifest.
//! 2. Capture dates for all remaining candidates, resolved in batches.
//! 3. Per candidate: move into an empty slot, report an identical file
//!    already there as a duplicate, and leave a different one alone as a
//!    conflict. Sidecars follow moved files.
//! 4. A checkpoint is written after every candidate so an interrupted run
//!    resumes where it stopped. A finished run leaves it as its record;
//!    the next run sees it is exhausted and starts over.

mod candidates;
mod checkpoint;
mod executor;
mod types;

pub use candidates::collect_candidates;
pub use checkpoint::{CandidateManifest, CheckpointState, CheckpointStore};
pub use executor::OrganizePipeline;
pub use types::*;
