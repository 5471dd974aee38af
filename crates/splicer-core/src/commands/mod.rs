//! Edit Command System
//!
//! All document edits go through `apply`, one `EditCommand` at a time.
//! Transition sizing and overlay placement live in their own modules so the
//! interaction layer can query them without issuing a command.

mod capacity;
mod clip;
mod command;
mod engine;
mod marker;
mod overlap;
mod result;
mod transition;

pub use capacity::{
    find_neighbor, max_resizable_duration_us, transition_capacity, TransitionCapacity,
};
pub use command::*;
pub use engine::apply;
pub use overlap::{classify_overlap, resolve_overlaps, OverlapKind, SplitIdAllocator};
pub use result::{CommandResult, StateChange};
