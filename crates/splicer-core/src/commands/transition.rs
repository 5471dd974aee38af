//! Transition Command Handler
//!
//! Sets or clears the transitions on a clip. A blend transition longer than
//! the overlap already spent pulls the two clips that meet at the cut
//! together (auto-overlap), within the capacity of that edge.

use tracing::{debug, trace};

use crate::{
    commands::{
        capacity::{compute_capacity, find_neighbor},
        engine::{is_item_locked, locate_item},
        result::{Edit, StateChange},
        TransitionUpdate,
    },
    timeline::{Clip, TimelineDocument, Track, Transition, TransitionMode},
    Edge, ItemId, TimeUs,
};

/// Minimum of two optional limits, `None` being unlimited
fn min_limit(a: Option<TimeUs>, b: Option<TimeUs>) -> Option<TimeUs> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Duration of overlap a transition already accounts for
fn spent_overlap(transition: Option<&Transition>) -> TimeUs {
    transition
        .filter(|t| t.is_blend())
        .map_or(0, |t| t.duration_us.max(0))
}

/// Extends `earlier` by `delta` and pulls `later` back by `delta`.
/// The later clip keeps its duration and the same trailing source content.
fn pull_together(earlier: &mut Clip, later: &mut Clip, delta: TimeUs) {
    earlier.timeline_range.duration_us += delta;
    if earlier.is_media() {
        earlier.source_range.duration_us += delta;
    }

    later.timeline_range.start_us -= delta;
    if later.is_media() {
        later.source_range.start_us -= delta;
    }
}

fn item_index(track: &Track, item_id: &str) -> Option<usize> {
    track.item_position(item_id)
}

fn clip_mut<'a>(track: &'a mut Track, idx: usize) -> Option<&'a mut Clip> {
    track.items.get_mut(idx).and_then(|i| i.as_clip_mut())
}

/// Applies one slot update to `track`. Returns the ids of the clips it touched.
fn apply_slot(
    track: &mut Track,
    item_id: &str,
    edge: Edge,
    update: &TransitionUpdate,
) -> Vec<ItemId> {
    let Some(idx) = item_index(track, item_id) else {
        return vec![];
    };
    let Some(clip) = track.items[idx].as_clip() else {
        return vec![];
    };

    let requested = match update {
        TransitionUpdate::Keep => return vec![],
        TransitionUpdate::Clear => {
            if clip.transition(edge).is_none() {
                return vec![];
            }
            if let Some(clip) = clip_mut(track, idx) {
                clip.set_transition(edge, None);
            }
            return vec![item_id.to_string()];
        }
        TransitionUpdate::Set(transition) => transition,
    };

    let spent = spent_overlap(clip.transition(edge));
    let capacity = compute_capacity(track, clip, edge, spent, requested.mode);
    let mut applied = requested.duration_us.clamp(0, capacity.bound());

    // Blend transitions pair up with the clip meeting this edge
    let neighbor_id = if requested.mode == TransitionMode::Blend {
        find_neighbor(track, clip, edge).map(|n| n.id.clone())
    } else {
        None
    };
    let pair = neighbor_id
        .as_deref()
        .and_then(|id| item_index(track, id))
        .map(|neighbor_idx| match edge {
            Edge::End => (idx, neighbor_idx),
            Edge::Start => (neighbor_idx, idx),
        });

    if let Some((earlier_idx, later_idx)) = pair {
        if let (Some(earlier), Some(later)) = (
            track.items[earlier_idx].as_clip(),
            track.items[later_idx].as_clip(),
        ) {
            // Source material both clips give up to overlap further. The
            // later clip must still start and end after the earlier one.
            let keep_order = ((later.end_us() - earlier.end_us() - 1) / 2)
                .min(later.start_us() - earlier.start_us() - 1);
            let pull_limit = min_limit(
                min_limit(earlier.tail_handle_us(), later.head_handle_us()),
                Some(later.start_us().min(keep_order)),
            );
            if let Some(limit) = pull_limit {
                applied = applied.min(spent + limit.max(0));
            }
        }
    }

    let mut transition = requested.clone();
    transition.duration_us = applied;

    let Some((earlier_idx, later_idx)) = pair else {
        if clip.transition(edge) == Some(&transition) {
            return vec![];
        }
        if let Some(clip) = clip_mut(track, idx) {
            clip.set_transition(edge, Some(transition));
        }
        return vec![item_id.to_string()];
    };

    let (Some(earlier), Some(later)) = (
        track.items[earlier_idx].as_clip(),
        track.items[later_idx].as_clip(),
    ) else {
        return vec![];
    };

    let unchanged = earlier.transition_out.as_ref() == Some(&transition)
        && later.transition_in.as_ref() == Some(&transition);
    if unchanged {
        return vec![];
    }

    let delta = applied - spent;
    let mut earlier = earlier.clone();
    let mut later = later.clone();
    if delta > 0 {
        trace!(
            "Auto-overlap pulls {} and {} together by {}us",
            earlier.id,
            later.id,
            delta
        );
        pull_together(&mut earlier, &mut later, delta);
    }
    earlier.transition_out = Some(transition.clone());
    later.transition_in = Some(transition);
    earlier.clamp_to_duration();
    later.clamp_to_duration();

    let touched = vec![earlier.id.clone(), later.id.clone()];
    track.items[earlier_idx] = earlier.into();
    track.items[later_idx] = later.into();
    touched
}

/// Applies the in slot, then the out slot, to a clip
pub(crate) fn update_clip_transition(
    document: &TimelineDocument,
    track_id: &str,
    item_id: &str,
    transition_in: &TransitionUpdate,
    transition_out: &TransitionUpdate,
) -> Option<Edit> {
    let (track_idx, item_idx) = locate_item(document, track_id, item_id)?;
    let track = &document.tracks[track_idx];
    if track.locked {
        debug!("update_clip_transition: track {} is locked", track_id);
        return None;
    }
    let item = &track.items[item_idx];
    if item.as_clip().is_none() || is_item_locked(item) {
        return None;
    }

    let mut next_track = track.clone();
    let mut touched = apply_slot(&mut next_track, item_id, Edge::Start, transition_in);
    touched.extend(apply_slot(&mut next_track, item_id, Edge::End, transition_out));
    if touched.is_empty() || &next_track == track {
        return None;
    }
    next_track.sort_items();

    let mut changes: Vec<StateChange> = Vec::new();
    for id in touched {
        let change = StateChange::item_modified(track_id, &id);
        if !changes.contains(&change) {
            changes.push(change);
        }
    }

    let mut next = document.clone();
    next.tracks[track_idx] = next_track;

    let mut edit = Edit::new(next);
    edit.changes = changes;
    Some(edit)
}

// =============================================================================
// Tests
// =============================================================================
