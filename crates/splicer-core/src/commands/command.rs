//! Edit Command Definitions
//!
//! The closed set of edits the engine understands. Every variant is handled by
//! exactly one arm of the `match` in `engine::apply`.

use serde::{Deserialize, Serialize};

use crate::{
    timeline::{Effect, Transition},
    Edge, ItemId, MarkerId, TimeUs, TrackId,
};

// =============================================================================
// Payloads
// =============================================================================

/// What to do with one transition slot of a clip
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionUpdate {
    /// Leave the slot as it is
    #[default]
    Keep,
    /// Remove the transition. Clips that were pulled together stay overlapped.
    Clear,
    /// Set the transition; its duration is clamped to the edge capacity
    Set(Transition),
}

/// Fields merged into a clip by `update_clip_properties`.
/// Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<Effect>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_fade_in_us: Option<TimeUs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_fade_out_us: Option<TimeUs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl ClipProperties {
    /// Returns true if no field is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// =============================================================================
// EditCommand
// =============================================================================

/// A single timeline edit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EditCommand {
    /// Relocate an item on its own track. No overlap resolution.
    MoveItem {
        track_id: TrackId,
        item_id: ItemId,
        start_us: TimeUs,
    },
    /// Relocate an item onto another track of the same kind. No overlap resolution.
    MoveItemToTrack {
        from_track_id: TrackId,
        to_track_id: TrackId,
        item_id: ItemId,
        start_us: TimeUs,
    },
    /// Move one edge of an item by `delta_us`
    TrimItem {
        track_id: TrackId,
        item_id: ItemId,
        edge: Edge,
        delta_us: TimeUs,
    },
    /// Same as `TrimItem`, issued from the overlay editing path
    OverlayTrimItem {
        track_id: TrackId,
        item_id: ItemId,
        edge: Edge,
        delta_us: TimeUs,
    },
    /// Relocate an item and trim, split or delete whatever it lands on
    OverlayPlaceItem {
        from_track_id: TrackId,
        to_track_id: TrackId,
        item_id: ItemId,
        start_us: TimeUs,
    },
    UpdateClipProperties {
        track_id: TrackId,
        item_id: ItemId,
        properties: ClipProperties,
    },
    UpdateClipTransition {
        track_id: TrackId,
        item_id: ItemId,
        #[serde(default)]
        transition_in: TransitionUpdate,
        #[serde(default)]
        transition_out: TransitionUpdate,
    },
    AddMarker {
        id: MarkerId,
        time_us: TimeUs,
        text: String,
    },
    UpdateMarker {
        id: MarkerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_us: Option<TimeUs>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    RemoveMarker {
        id: MarkerId,
    },
}

impl EditCommand {
    /// Creates a same-track move
    pub fn move_item(track_id: &str, item_id: &str, start_us: TimeUs) -> Self {
        Self::MoveItem {
            track_id: track_id.to_string(),
            item_id: item_id.to_string(),
            start_us,
        }
    }

    /// Creates a cross-track move
    pub fn move_item_to_track(
        from_track_id: &str,
        to_track_id: &str,
        item_id: &str,
        start_us: TimeUs,
    ) -> Self {
        Self::MoveItemToTrack {
            from_track_id: from_track_id.to_string(),
            to_track_id: to_track_id.to_string(),
            item_id: item_id.to_string(),
            start_us,
        }
    }

    /// Creates a trim
    pub fn trim_item(track_id: &str, item_id: &str, edge: Edge, delta_us: TimeUs) -> Self {
        Self::TrimItem {
            track_id: track_id.to_string(),
            item_id: item_id.to_string(),
            edge,
            delta_us,
        }
    }

    /// Creates an overlay-mode trim
    pub fn overlay_trim_item(track_id: &str, item_id: &str, edge: Edge, delta_us: TimeUs) -> Self {
        Self::OverlayTrimItem {
            track_id: track_id.to_string(),
            item_id: item_id.to_string(),
            edge,
            delta_us,
        }
    }

    /// Creates an overlap-resolving placement
    pub fn overlay_place_item(
        from_track_id: &str,
        to_track_id: &str,
        item_id: &str,
        start_us: TimeUs,
    ) -> Self {
        Self::OverlayPlaceItem {
            from_track_id: from_track_id.to_string(),
            to_track_id: to_track_id.to_string(),
            item_id: item_id.to_string(),
            start_us,
        }
    }

    /// Creates a property merge
    pub fn update_clip_properties(
        track_id: &str,
        item_id: &str,
        properties: ClipProperties,
    ) -> Self {
        Self::UpdateClipProperties {
            track_id: track_id.to_string(),
            item_id: item_id.to_string(),
            properties,
        }
    }

    /// Creates a transition update
    pub fn update_clip_transition(
        track_id: &str,
        item_id: &str,
        transition_in: TransitionUpdate,
        transition_out: TransitionUpdate,
    ) -> Self {
        Self::UpdateClipTransition {
            track_id: track_id.to_string(),
            item_id: item_id.to_string(),
            transition_in,
            transition_out,
        }
    }

    /// Command type name, matching the serialized tag
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MoveItem { .. } => "move_item",
            Self::MoveItemToTrack { .. } => "move_item_to_track",
            Self::TrimItem { .. } => "trim_item",
            Self::OverlayTrimItem { .. } => "overlay_trim_item",
            Self::OverlayPlaceItem { .. } => "overlay_place_item",
            Self::UpdateClipProperties { .. } => "update_clip_properties",
            Self::UpdateClipTransition { .. } => "update_clip_transition",
            Self::AddMarker { .. } => "add_marker",
            Self::UpdateMarker { .. } => "update_marker",
            Self::RemoveMarker { .. } => "remove_marker",
        }
    }

    /// Human-readable label for history entries
    pub fn label(&self) -> &'static str {
        match self {
            Self::MoveItem { .. } | Self::MoveItemToTrack { .. } => "Move clip",
            Self::TrimItem { .. } | Self::OverlayTrimItem { .. } => "Trim clip",
            Self::OverlayPlaceItem { .. } => "Place clip",
            Self::UpdateClipProperties { .. } => "Edit clip properties",
            Self::UpdateClipTransition { .. } => "Edit transition",
            Self::AddMarker { .. } => "Add marker",
            Self::UpdateMarker { .. } => "Edit marker",
            Self::RemoveMarker { .. } => "Remove marker",
        }
    }
}
