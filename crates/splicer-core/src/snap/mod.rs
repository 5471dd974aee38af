//! Snap Engine
//!
//! Turns pointer-derived times into snapped times while dragging.
//! Clip boundaries (and the origin, timeline end, playhead and markers) win
//! over frame boundaries; frame snapping only applies when nothing else is
//! within the pixel threshold.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{settings::EditorSettings, timeline::TimelineDocument, TimeUs, US_PER_SEC};

/// Pixels per second at zoom 1.0
pub const BASE_PIXELS_PER_SECOND: f64 = 100.0;

/// Zoom range accepted by `pixels_per_second`
pub const MIN_ZOOM: f64 = 0.01;
pub const MAX_ZOOM: f64 = 100.0;

/// Timeline pixels per second of time at a zoom level
pub fn pixels_per_second(zoom: f64) -> f64 {
    let zoom = if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    };
    BASE_PIXELS_PER_SECOND * zoom
}

/// Converts a pixel distance to microseconds at a zoom level
pub fn threshold_us(threshold_px: f64, zoom: f64) -> TimeUs {
    let px = if threshold_px.is_finite() {
        threshold_px.max(0.0)
    } else {
        0.0
    };
    (px / pixels_per_second(zoom) * US_PER_SEC as f64).round() as TimeUs
}

// =============================================================================
// Frame Quantization
// =============================================================================

fn frames_per_us(fps: f64) -> Option<f64> {
    (fps.is_finite() && fps > 0.0).then(|| fps / US_PER_SEC as f64)
}

/// Rounds a time to the nearest frame boundary, in whole microseconds
pub fn quantize_to_frame(time_us: TimeUs, fps: f64) -> TimeUs {
    let Some(rate) = frames_per_us(fps) else {
        return time_us;
    };
    let frame = (time_us as f64 * rate).round();
    (frame / rate).round() as TimeUs
}

/// Offset of a time past the frame boundary at or before it.
///
/// Passing the dragged item's original start as `frame_offset_us` keeps its
/// sub-frame phase while frame snapping.
pub fn frame_phase_us(time_us: TimeUs, fps: f64) -> TimeUs {
    let Some(rate) = frames_per_us(fps) else {
        return 0;
    };
    let frame = (time_us as f64 * rate).floor();
    let boundary = (frame / rate).round() as TimeUs;
    (time_us - boundary).max(0)
}

// =============================================================================
// Snap Targets
// =============================================================================

/// What a snap target marks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapTargetKind {
    Origin,
    TimelineEnd,
    Playhead,
    ItemStart,
    ItemEnd,
    Marker,
}

/// A time the dragged edges are attracted to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapTarget {
    pub time_us: TimeUs,
    pub kind: SnapTargetKind,
}

impl SnapTarget {
    pub fn new(time_us: TimeUs, kind: SnapTargetKind) -> Self {
        Self { time_us, kind }
    }
}

/// Collects snap targets in priority order: origin, timeline end, playhead,
/// every other item's start and end, then markers.
///
/// Items listed in `excluded_ids` (the ones being dragged) contribute nothing,
/// not even to the timeline end.
pub fn collect_targets(
    document: &TimelineDocument,
    excluded_ids: &[&str],
    playhead_us: TimeUs,
) -> Vec<SnapTarget> {
    let others = || {
        document
            .tracks
            .iter()
            .flat_map(|t| t.items.iter())
            .filter(|i| !excluded_ids.contains(&i.id()))
    };

    let timeline_end = others().map(|i| i.end_us()).max().unwrap_or(0);

    let mut targets = vec![
        SnapTarget::new(0, SnapTargetKind::Origin),
        SnapTarget::new(timeline_end, SnapTargetKind::TimelineEnd),
        SnapTarget::new(playhead_us, SnapTargetKind::Playhead),
    ];
    for item in others() {
        targets.push(SnapTarget::new(item.start_us(), SnapTargetKind::ItemStart));
        targets.push(SnapTarget::new(item.end_us(), SnapTargetKind::ItemEnd));
    }
    targets.extend(
        document
            .metadata
            .markers
            .iter()
            .map(|m| SnapTarget::new(m.time_us, SnapTargetKind::Marker)),
    );
    targets
}

// =============================================================================
// Snapping
// =============================================================================

/// Everything a snap needs besides the raw time
#[derive(Clone, Debug, PartialEq)]
pub struct SnapContext {
    pub zoom: f64,
    pub threshold_px: f64,
    pub fps: f64,
    pub clip_snap: bool,
    pub frame_snap: bool,
}

impl SnapContext {
    pub fn from_settings(settings: &EditorSettings, zoom: f64, fps: f64) -> Self {
        Self {
            zoom,
            threshold_px: settings.snap_tolerance_px as f64,
            fps,
            clip_snap: settings.clip_snap_enabled,
            frame_snap: settings.frame_snap_enabled,
        }
    }

    pub fn threshold_us(&self) -> TimeUs {
        threshold_us(self.threshold_px, self.zoom)
    }
}

/// Which rule produced a snapped time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SnapKind {
    /// Nothing applied; the raw time (clamped) is returned
    None,
    /// Snapped to a target; `edge_is_end` tells which dragged edge matched
    Target {
        target: SnapTarget,
        edge_is_end: bool,
    },
    Frame,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapResult {
    pub time_us: TimeUs,
    pub kind: SnapKind,
}

/// Closest target within `threshold` of either dragged edge.
/// Ties keep the first found; a target's start edge is checked before its end.
fn closest_target(
    raw_start: TimeUs,
    duration_us: Option<TimeUs>,
    threshold: TimeUs,
    targets: &[SnapTarget],
) -> Option<(SnapTarget, bool)> {
    let mut best: Option<(TimeUs, SnapTarget, bool)> = None;

    let mut consider = |distance: TimeUs, target: SnapTarget, edge_is_end: bool| {
        if distance > threshold {
            return;
        }
        if best.map_or(true, |(d, _, _)| distance < d) {
            best = Some((distance, target, edge_is_end));
        }
    };

    for target in targets {
        consider((raw_start - target.time_us).abs(), *target, false);
        if let Some(duration) = duration_us {
            consider((raw_start + duration - target.time_us).abs(), *target, true);
        }
    }

    best.map(|(_, target, edge_is_end)| (target, edge_is_end))
}

fn snap_impl(
    raw_start: TimeUs,
    duration_us: Option<TimeUs>,
    ctx: &SnapContext,
    targets: &[SnapTarget],
    frame_offset_us: TimeUs,
) -> SnapResult {
    if ctx.clip_snap {
        if let Some((target, edge_is_end)) =
            closest_target(raw_start, duration_us, ctx.threshold_us(), targets)
        {
            let time_us = if edge_is_end {
                target.time_us - duration_us.unwrap_or(0)
            } else {
                target.time_us
            };
            trace!("Snapped {}us to {:?} at {}us", raw_start, target.kind, target.time_us);
            return SnapResult {
                time_us: time_us.max(0),
                kind: SnapKind::Target {
                    target,
                    edge_is_end,
                },
            };
        }
    }

    if ctx.frame_snap {
        let time_us = quantize_to_frame(raw_start - frame_offset_us, ctx.fps) + frame_offset_us;
        return SnapResult {
            time_us: time_us.max(0),
            kind: SnapKind::Frame,
        };
    }

    SnapResult {
        time_us: raw_start.max(0),
        kind: SnapKind::None,
    }
}

/// Snaps the start of a dragged item. Both its start and end edges are
/// tested against the targets; an end-edge match returns `target - duration`.
pub fn snap_start(
    raw_start_us: TimeUs,
    dragged_duration_us: TimeUs,
    ctx: &SnapContext,
    targets: &[SnapTarget],
    frame_offset_us: TimeUs,
) -> SnapResult {
    snap_impl(
        raw_start_us,
        Some(dragged_duration_us.max(0)),
        ctx,
        targets,
        frame_offset_us,
    )
}

/// Snaps a single edge position (trimming)
pub fn snap_edge(raw_edge_us: TimeUs, ctx: &SnapContext, targets: &[SnapTarget]) -> SnapResult {
    snap_impl(raw_edge_us, None, ctx, targets, 0)
}

// =============================================================================
// Trim Snap Tracker
// =============================================================================

/// Turns the total trim delta of a gesture into per-frame increments.
///
/// Trim commands are relative, so each frame must issue only the part of the
/// delta not yet applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrimSnapTracker {
    applied_us: TimeUs,
}

impl TrimSnapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total delta applied so far in the gesture
    pub fn applied_us(&self) -> TimeUs {
        self.applied_us
    }

    /// Returns the increment to issue for a new total, or `None` if there is
    /// nothing to do
    pub fn step(&mut self, total_delta_us: TimeUs) -> Option<TimeUs> {
        let increment = total_delta_us - self.applied_us;
        if increment == 0 {
            return None;
        }
        self.applied_us = total_delta_us;
        Some(increment)
    }

    /// Records that the engine applied less than requested (clamping), so
    /// the next step is measured from what really happened
    pub fn record_applied(&mut self, total_applied_us: TimeUs) {
        self.applied_us = total_applied_us;
    }

    pub fn reset(&mut self) {
        self.applied_us = 0;
    }
}

// =============================================================================
// Tests
// =============================================================================
