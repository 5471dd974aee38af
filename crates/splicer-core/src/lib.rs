//! Splicer Core Engine
//!
//! Timeline editing core for the Splicer browser-based video editor.
//! Holds the timeline document model, the command engine that produces new
//! documents from edits, snapping for interactive drags, and the active clip
//! tracker used during playback.

pub mod commands;
pub mod interaction;
pub mod playback;
pub mod session;
pub mod settings;
pub mod snap;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_invariants;
