//! Splicer Error Definitions
//!
//! The command engine itself is total and never fails; these errors cover
//! the surfaces around it (document validation, history, gestures, config).

use thiserror::Error;

use crate::{ItemId, TimeUs, TrackId};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Timeline Errors
    // =========================================================================
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid time range: start {0}us, duration {1}us")]
    InvalidTimeRange(TimeUs, TimeUs),

    #[error(
        "Item overlap on track {track_id}: {item_id} intersects {other_id}"
    )]
    ItemOverlap {
        track_id: TrackId,
        item_id: ItemId,
        other_id: ItemId,
    },

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("A drag gesture is already in progress")]
    GestureInProgress,

    #[error("No drag gesture in progress")]
    NoActiveGesture,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
