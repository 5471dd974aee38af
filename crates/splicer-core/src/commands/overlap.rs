//! Overlap Resolution
//!
//! Overlay placement: the placed item wins, and whatever it lands on is
//! trimmed, split or deleted so the track stays free of overlaps.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::{
    commands::{
        clip::latest_start_us,
        engine::{is_item_locked, locate_item},
        result::{Edit, StateChange},
    },
    timeline::{Item, TimelineDocument},
    TimeRange, TimeUs,
};

/// How an existing item relates to the placed range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapKind {
    /// No intersection
    None,
    /// Entirely inside the placed range
    Covered,
    /// The placed range covers the existing item's tail
    Tail,
    /// The placed range covers the existing item's head
    Head,
    /// The placed range sits strictly inside the existing item
    Inside,
}

/// Classifies `existing` against the placed range `[start, end)`
pub fn classify_overlap(existing: &TimeRange, placed: &TimeRange) -> OverlapKind {
    if !existing.overlaps(placed) {
        return OverlapKind::None;
    }
    let (start, end) = (placed.start_us, placed.end_us());
    if start <= existing.start_us && existing.end_us() <= end {
        OverlapKind::Covered
    } else if existing.start_us < start && end < existing.end_us() {
        OverlapKind::Inside
    } else if existing.start_us < start {
        OverlapKind::Tail
    } else {
        OverlapKind::Head
    }
}

/// Hands out ids for the right halves of split items.
///
/// Ids derive from the split item's id so the same edit always produces the
/// same document.
#[derive(Debug, Default)]
pub struct SplitIdAllocator {
    taken: HashSet<String>,
}

impl SplitIdAllocator {
    /// Reserves every item id already present in the document
    pub fn from_document(document: &TimelineDocument) -> Self {
        let taken = document
            .tracks
            .iter()
            .flat_map(|t| t.items.iter())
            .map(|i| i.id().to_string())
            .collect();
        Self { taken }
    }

    /// Returns `<base>-split`, or `<base>-split-N` if that is taken
    pub fn next_id(&mut self, base: &str) -> String {
        let mut candidate = format!("{}-split", base);
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}-split-{}", base, n);
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Cuts the item so it ends at `new_end`. The transition out no longer meets
/// the clip it was made for and is dropped.
fn cut_tail(item: &mut Item, new_end: TimeUs) {
    let removed = item.end_us() - new_end;
    let range = item.timeline_range_mut();
    range.duration_us = (range.duration_us - removed).max(0);

    if let Some(clip) = item.as_clip_mut() {
        if clip.is_media() {
            clip.source_range.duration_us = (clip.source_range.duration_us - removed).max(0);
        }
        clip.transition_out = None;
        clip.clamp_to_duration();
    }
}

/// Cuts `delta` off the head of the item, keeping the same source frames
/// under the remaining timeline span.
fn cut_head(item: &mut Item, delta: TimeUs) {
    let range = item.timeline_range_mut();
    range.start_us += delta;
    range.duration_us = (range.duration_us - delta).max(0);

    if let Some(clip) = item.as_clip_mut() {
        if clip.is_media() {
            clip.source_range.start_us += delta;
            clip.source_range.duration_us = (clip.source_range.duration_us - delta).max(0);
        }
        clip.transition_in = None;
        clip.clamp_to_duration();
    }
}

/// Rewrites `existing` so nothing intersects `placed`.
///
/// The placed item itself is not part of `existing`; the caller inserts it.
/// Touching ranges are kept, and gaps left behind are acceptable.
pub fn resolve_overlaps(
    existing: Vec<Item>,
    placed: &TimeRange,
    ids: &mut SplitIdAllocator,
) -> Vec<Item> {
    if placed.duration_us <= 0 {
        return existing;
    }
    let (start, end) = (placed.start_us, placed.end_us());

    let mut resolved = Vec::with_capacity(existing.len() + 1);
    for mut item in existing {
        match classify_overlap(item.timeline_range(), placed) {
            OverlapKind::None => resolved.push(item),
            OverlapKind::Covered => {
                trace!("Overlay removes {}", item.id());
            }
            OverlapKind::Tail => {
                cut_tail(&mut item, start);
                resolved.push(item);
            }
            OverlapKind::Head => {
                let delta = end - item.start_us();
                cut_head(&mut item, delta);
                resolved.push(item);
            }
            OverlapKind::Inside => {
                let mut right = item.clone();
                let offset = end - item.start_us();
                cut_head(&mut right, offset);
                right.set_id(ids.next_id(item.id()));

                cut_tail(&mut item, start);
                trace!("Overlay splits {} into {} and {}", item.id(), item.id(), right.id());
                resolved.push(item);
                resolved.push(right);
            }
        }
    }
    resolved
}

/// Moves an item to `start_us` on `to_track_id` and resolves overlaps there
pub(crate) fn overlay_place_item(
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
        debug!("overlay_place_item: track {} or {} is locked", from_track_id, to_track_id);
        return None;
    }
    if from_track.kind != to_track.kind {
        debug!(
            "overlay_place_item: {:?} item cannot land on {:?} track",
            from_track.kind, to_track.kind
        );
        return None;
    }
    let item = &from_track.items[item_idx];
    if is_item_locked(item) {
        return None;
    }
    let start_us = start_us.min(latest_start_us(item));

    let mut next = document.clone();
    let mut placed = next.tracks[from_idx].items.remove(item_idx);
    let original_start = placed.start_us();
    placed.timeline_range_mut().start_us = start_us;
    let placed_range = *placed.timeline_range();

    // Locked clips on the target track are never cut, split or removed
    if let Some(blocker) = next.tracks[to_idx].items.iter().find(|i| {
        i.as_clip().is_some_and(|c| c.locked)
            && classify_overlap(i.timeline_range(), &placed_range) != OverlapKind::None
    }) {
        debug!(
            "overlay_place_item: locked clip {} blocks placement of {}",
            blocker.id(),
            item_id
        );
        return None;
    }

    let before = std::mem::take(&mut next.tracks[to_idx].items);
    let mut ids = SplitIdAllocator::from_document(document);
    let after = resolve_overlaps(before.clone(), &placed_range, &mut ids);

    if from_idx == to_idx && original_start == start_us && after == before {
        return None;
    }

    let mut changes = Vec::new();
    for old in &before {
        match after.iter().find(|i| i.id() == old.id()) {
            None => changes.push(StateChange::item_deleted(to_track_id, old.id())),
            Some(new) if new != old => {
                changes.push(StateChange::item_modified(to_track_id, old.id()))
            }
            Some(_) => {}
        }
    }
    for new in &after {
        if !before.iter().any(|i| i.id() == new.id()) {
            changes.push(StateChange::item_created(to_track_id, new.id()));
        }
    }
    changes.push(if from_idx == to_idx {
        StateChange::item_modified(to_track_id, item_id)
    } else {
        StateChange::ItemMoved {
            from_track_id: from_track_id.to_string(),
            to_track_id: to_track_id.to_string(),
            item_id: item_id.to_string(),
        }
    });

    let track = &mut next.tracks[to_idx];
    track.items = after;
    track.items.push(placed);
    track.sort_items();

    let mut edit = Edit::new(next);
    edit.changes = changes;
    Some(edit)
}

// =============================================================================
// Tests
// =============================================================================
