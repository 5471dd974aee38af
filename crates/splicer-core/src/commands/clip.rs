//! Clip Command Handlers
//!
//! Move, trim and property edits. Each handler returns `None` when the
//! document would not change; the engine turns that into a no-op result.

use tracing::{debug, trace, warn};

use crate::{
    commands::{
        engine::{is_item_locked, locate_item},
        result::{Edit, StateChange},
        ClipProperties,
    },
    timeline::{Clip, Item, TimelineDocument},
    Edge, TimeUs,
};

const MAX_CLIP_GAIN: f64 = 4.0;

// =============================================================================
// Move
// =============================================================================

/// Moves an item to `start_us` on `to_track_id`. Same-track moves pass the
/// same id twice.
pub(crate) fn move_item(
    document: &TimelineDocument,
    from_track_id: &str,
    to_track_id: &str,
    item_id: &str,
    start_us: TimeUs,
) -> Option<Edit> {
    let start_us = start_us.max(0);
    let (from_idx, item_idx) = locate_item(document, from_track_id, item_id)?;
    let to_idx = document.track_index(to_track_id)?;

    let from_track = &document.tracks[from_idx];
    let to_track = &document.tracks[to_idx];
    if from_track.locked || to_track.locked {
        debug!("move_item: track {} or {} is locked", from_track_id, to_track_id);
        return None;
    }
    if from_track.kind != to_track.kind {
        debug!(
            "move_item: cannot move {} from {:?} track to {:?} track",
            item_id, from_track.kind, to_track.kind
        );
        return None;
    }

    let item = &from_track.items[item_idx];
    if is_item_locked(item) {
        return None;
    }
    let start_us = start_us.min(latest_start_us(item));
    if from_idx == to_idx && item.start_us() == start_us {
        return None;
    }

    let mut next = document.clone();
    let mut item = next.tracks[from_idx].items.remove(item_idx);
    item.timeline_range_mut().start_us = start_us;
    next.tracks[to_idx].items.push(item);
    next.tracks[to_idx].sort_items();

    let change = if from_idx == to_idx {
        StateChange::item_modified(to_track_id, item_id)
    } else {
        StateChange::ItemMoved {
            from_track_id: from_track_id.to_string(),
            to_track_id: to_track_id.to_string(),
            item_id: item_id.to_string(),
        }
    };

    Some(Edit::new(next).with_change(change))
}

// =============================================================================
// Trim
// =============================================================================

/// Latest start that keeps the item's end representable
pub(crate) fn latest_start_us(item: &Item) -> TimeUs {
    TimeUs::MAX - item.timeline_range().duration_us.max(0)
}

/// Returns the feasible `[min, max]` delta for trimming `edge` of `item`
fn trim_bounds(item: &Item, edge: Edge) -> (TimeUs, TimeUs) {
    let range = item.timeline_range();
    let media = item.as_media();

    match edge {
        Edge::Start => {
            // startUs stays >= 0, durationUs stays >= 0
            let mut min = -range.start_us;
            let mut max = range.duration_us;
            if let Some(clip) = media {
                min = min.max(-clip.source_range.start_us);
                max = max.min(clip.source_range.duration_us);
            }
            (min, max)
        }
        Edge::End => {
            // The end must stay representable
            let mut min = -range.duration_us;
            let mut max = TimeUs::MAX - range.end_us();
            if let Some(clip) = media {
                min = min.max(-clip.source_range.duration_us);
                if let Some(total) = clip.source_duration_us {
                    max = max.min(total - clip.source_range.end_us());
                }
            }
            (min, max)
        }
    }
}

/// Clamps a requested trim delta into the feasible range
pub(crate) fn clamp_trim_delta(item: &Item, edge: Edge, delta_us: TimeUs) -> TimeUs {
    let (min, max) = trim_bounds(item, edge);
    if min > max {
        warn!(
            "Item {} has no feasible trim on {:?} edge ({}..{})",
            item.id(),
            edge,
            min,
            max
        );
        return 0;
    }
    let clamped = delta_us.clamp(min, max);
    if clamped != delta_us {
        trace!(
            "Trim delta for {} clamped from {}us to {}us",
            item.id(),
            delta_us,
            clamped
        );
    }
    clamped
}

fn apply_trim(item: &mut Item, edge: Edge, delta_us: TimeUs) {
    let range = item.timeline_range_mut();
    match edge {
        Edge::Start => {
            range.start_us += delta_us;
            range.duration_us -= delta_us;
        }
        Edge::End => {
            range.duration_us = range.duration_us.saturating_add(delta_us);
        }
    }

    if let Some(clip) = item.as_clip_mut() {
        if clip.is_media() {
            match edge {
                Edge::Start => {
                    clip.source_range.start_us += delta_us;
                    clip.source_range.duration_us -= delta_us;
                }
                Edge::End => {
                    clip.source_range.duration_us =
                        clip.source_range.duration_us.saturating_add(delta_us);
                }
            }
        }
        clip.clamp_to_duration();
    }
}

/// Moves one edge of an item. The opposite edge stays fixed.
pub(crate) fn trim_item(
    document: &TimelineDocument,
    track_id: &str,
    item_id: &str,
    edge: Edge,
    delta_us: TimeUs,
) -> Option<Edit> {
    let (track_idx, item_idx) = locate_item(document, track_id, item_id)?;
    let track = &document.tracks[track_idx];
    if track.locked {
        debug!("trim_item: track {} is locked", track_id);
        return None;
    }

    let item = &track.items[item_idx];
    if is_item_locked(item) {
        return None;
    }

    let delta_us = clamp_trim_delta(item, edge, delta_us);
    if delta_us == 0 {
        return None;
    }

    let mut next = document.clone();
    apply_trim(&mut next.tracks[track_idx].items[item_idx], edge, delta_us);
    next.tracks[track_idx].sort_items();

    Some(Edit::new(next).with_change(StateChange::item_modified(track_id, item_id)))
}

// =============================================================================
// Properties
// =============================================================================

fn finite_or_warn<T: Into<f64> + Copy>(field: &str, value: T) -> Option<T> {
    if value.into().is_finite() {
        Some(value)
    } else {
        warn!("Ignoring non-finite {} in clip properties", field);
        None
    }
}

/// Keeps fade-in + fade-out within the clip. The side that was just edited
/// gives way when both do not fit.
fn normalize_fade_pair(clip: &mut Clip, fade_in_updated: bool, fade_out_updated: bool) {
    let duration = clip.duration_us().max(0);

    let fade_in = clip.audio_fade_in_us.map(|v| v.clamp(0, duration));
    let fade_out = clip.audio_fade_out_us.map(|v| v.clamp(0, duration));
    clip.audio_fade_in_us = fade_in;
    clip.audio_fade_out_us = fade_out;

    let total = fade_in.unwrap_or(0) + fade_out.unwrap_or(0);
    if total <= duration {
        return;
    }

    if fade_in_updated && !fade_out_updated {
        clip.audio_fade_in_us = Some((duration - fade_out.unwrap_or(0)).max(0));
        return;
    }

    clip.audio_fade_out_us = Some((duration - fade_in.unwrap_or(0)).max(0));
}

impl ClipProperties {
    /// Shallow-merges the present fields into `clip`, clamping numeric values
    pub fn merge_into(&self, clip: &mut Clip) {
        if let Some(name) = &self.name {
            clip.name = name.clone();
        }
        if let Some(opacity) = self.opacity.and_then(|v| finite_or_warn("opacity", v)) {
            clip.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(effects) = &self.effects {
            clip.effects = effects.clone();
        }
        if let Some(gain) = self.audio_gain.and_then(|v| finite_or_warn("audioGain", v)) {
            clip.audio_gain = gain.clamp(0.0, MAX_CLIP_GAIN);
        }
        if let Some(balance) = self
            .audio_balance
            .and_then(|v| finite_or_warn("audioBalance", v))
        {
            clip.audio_balance = balance.clamp(-1.0, 1.0);
        }
        if let Some(fade_in) = self.audio_fade_in_us {
            clip.audio_fade_in_us = Some(fade_in);
        }
        if let Some(fade_out) = self.audio_fade_out_us {
            clip.audio_fade_out_us = Some(fade_out);
        }
        if self.audio_fade_in_us.is_some() || self.audio_fade_out_us.is_some() {
            normalize_fade_pair(
                clip,
                self.audio_fade_in_us.is_some(),
                self.audio_fade_out_us.is_some(),
            );
        }
        if let Some(locked) = self.locked {
            clip.locked = locked;
        }
        if let Some(disabled) = self.disabled {
            clip.disabled = disabled;
        }
    }
}

/// Merges properties into a clip. Gaps, unknown ids and clips on locked
/// tracks are no-ops. A locked clip still takes properties so it can be
/// unlocked.
pub(crate) fn update_clip_properties(
    document: &TimelineDocument,
    track_id: &str,
    item_id: &str,
    properties: &ClipProperties,
) -> Option<Edit> {
    if properties.is_empty() {
        return None;
    }

    let (track_idx, item_idx) = locate_item(document, track_id, item_id)?;
    if document.tracks[track_idx].locked {
        debug!("update_clip_properties: track {} is locked", track_id);
        return None;
    }
    let current = document.tracks[track_idx].items[item_idx].as_clip()?;

    let mut updated = current.clone();
    properties.merge_into(&mut updated);
    if &updated == current {
        return None;
    }

    let mut next = document.clone();
    next.tracks[track_idx].items[item_idx] = Item::Clip(updated);

    Some(Edit::new(next).with_change(StateChange::item_modified(track_id, item_id)))
}

// =============================================================================
// Tests
// =============================================================================
