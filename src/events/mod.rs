//! # Events Module
//!
//! Progress reporting for long-running scans.
//!
//! ## Design
//! The core library emits events through channels, so the CLI (or any other
//! front end) can draw progress without the engine knowing about terminals.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Detect(DetectEvent::TierProgress(p)) = event {
//!             println!("{}: {}/{}", p.tier, p.completed, p.total);
//!         }
//!     }
//! });
//!
//! detector.detect_with_events(files, &sender);
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
