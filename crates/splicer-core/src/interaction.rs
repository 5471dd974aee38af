//! Drag Gestures
//!
//! The gesture controller owns everything a drag needs between pointer-down
//! and pointer-up: the anchor position, the snap targets, the sub-frame phase
//! and the trim delta already applied. Pointer moves are coalesced; `on_frame`
//! turns at most the latest sample into one command per animation frame.
//!
//! Free-mode moves and trims are applied every frame inside a session batch.
//! Overlay moves only compute a preview while dragging and issue a single
//! `overlay_place_item` on commit, since overlap resolution rewrites other
//! items. Cancelling restores the snapshot taken when the gesture began.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    commands::{CommandResult, EditCommand},
    session::EditSession,
    settings::EditorSettings,
    snap::{
        collect_targets, frame_phase_us, snap_edge, snap_start, SnapContext, SnapTarget,
        TrimSnapTracker,
    },
    timeline::{Item, TimelineDocument},
    CoreError, CoreResult, Edge, ItemId, TimeUs, TrackId,
};

/// How a drag interacts with the clips it lands on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragMode {
    /// The caller picked a free slot; nothing else is touched
    #[default]
    Free,
    /// The dragged item wins and overlapped items are trimmed, split or deleted
    Overlay,
}

/// Where an overlay move would land if committed now
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePreview {
    pub track_id: TrackId,
    pub item_id: ItemId,
    pub start_us: TimeUs,
}

/// What one animation frame did
#[derive(Debug)]
pub enum FrameOutcome {
    /// No pending pointer sample
    Idle,
    /// A command was issued (it may still have been a no-op)
    Applied(CommandResult),
    /// Overlay move preview updated; the document is untouched
    Preview(MovePreview),
}

#[derive(Clone, Debug, PartialEq)]
struct PointerSample {
    delta_us: TimeUs,
    track_id: Option<TrackId>,
}

#[derive(Debug)]
enum GestureKind {
    Move {
        /// Track the item is on right now (free moves can change it)
        track_id: TrackId,
        origin_start_us: TimeUs,
        duration_us: TimeUs,
        frame_offset_us: TimeUs,
    },
    Trim {
        track_id: TrackId,
        edge: Edge,
        origin_edge_us: TimeUs,
        tracker: TrimSnapTracker,
    },
}

#[derive(Debug)]
struct Gesture {
    item_id: ItemId,
    mode: DragMode,
    kind: GestureKind,
    targets: Vec<SnapTarget>,
    pending: Option<PointerSample>,
    preview: Option<MovePreview>,
}

/// Drives one drag gesture at a time against an `EditSession`
#[derive(Debug)]
pub struct GestureController {
    settings: EditorSettings,
    zoom: f64,
    playhead_us: TimeUs,
    gesture: Option<Gesture>,
}

fn find_item<'a>(
    document: &'a TimelineDocument,
    track_id: &str,
    item_id: &str,
) -> CoreResult<&'a Item> {
    let track = document
        .find_track(track_id)
        .ok_or_else(|| CoreError::TrackNotFound(track_id.to_string()))?;
    track
        .get_item(item_id)
        .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
}

impl GestureController {
    pub fn new(settings: EditorSettings) -> Self {
        let zoom = settings.default_timeline_zoom;
        Self {
            settings,
            zoom,
            playhead_us: 0,
            gesture: None,
        }
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn set_playhead(&mut self, playhead_us: TimeUs) {
        self.playhead_us = playhead_us;
    }

    /// True while a gesture is active
    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Current overlay preview, if any
    pub fn preview(&self) -> Option<&MovePreview> {
        self.gesture.as_ref().and_then(|g| g.preview.as_ref())
    }

    fn snap_context(&self, document: &TimelineDocument) -> SnapContext {
        SnapContext::from_settings(&self.settings, self.zoom, document.timebase.fps)
    }

    fn start(
        &mut self,
        session: &mut EditSession,
        item_id: &str,
        mode: DragMode,
        label: &str,
        kind: GestureKind,
    ) -> CoreResult<()> {
        let targets = collect_targets(session.document(), &[item_id], self.playhead_us);
        session.begin_batch(label)?;
        info!("Begin gesture: {} {} ({:?})", label, item_id, mode);

        self.gesture = Some(Gesture {
            item_id: item_id.to_string(),
            mode,
            kind,
            targets,
            pending: None,
            preview: None,
        });
        Ok(())
    }

    /// Starts dragging an item
    pub fn begin_move(
        &mut self,
        session: &mut EditSession,
        track_id: &str,
        item_id: &str,
        mode: DragMode,
    ) -> CoreResult<()> {
        if self.gesture.is_some() {
            return Err(CoreError::GestureInProgress);
        }

        let document = Arc::clone(session.document());
        let item = find_item(&document, track_id, item_id)?;
        let kind = GestureKind::Move {
            track_id: track_id.to_string(),
            origin_start_us: item.start_us(),
            duration_us: item.timeline_range().duration_us,
            frame_offset_us: frame_phase_us(item.start_us(), document.timebase.fps),
        };

        self.start(session, item_id, mode, "Move clip", kind)
    }

    /// Starts dragging one edge of an item
    pub fn begin_trim(
        &mut self,
        session: &mut EditSession,
        track_id: &str,
        item_id: &str,
        edge: Edge,
        mode: DragMode,
    ) -> CoreResult<()> {
        if self.gesture.is_some() {
            return Err(CoreError::GestureInProgress);
        }

        let document = Arc::clone(session.document());
        let item = find_item(&document, track_id, item_id)?;
        let origin_edge_us = match edge {
            Edge::Start => item.start_us(),
            Edge::End => item.end_us(),
        };
        let kind = GestureKind::Trim {
            track_id: track_id.to_string(),
            edge,
            origin_edge_us,
            tracker: TrimSnapTracker::new(),
        };

        self.start(session, item_id, mode, "Trim clip", kind)
    }

    /// Records the latest pointer position, as a time offset from where the
    /// gesture began and the track under the pointer. Earlier samples not yet
    /// consumed by `on_frame` are discarded.
    pub fn pointer_moved(&mut self, delta_us: TimeUs, track_id: Option<&str>) -> CoreResult<()> {
        let gesture = self.gesture.as_mut().ok_or(CoreError::NoActiveGesture)?;
        gesture.pending = Some(PointerSample {
            delta_us,
            track_id: track_id.map(str::to_string),
        });
        Ok(())
    }

    /// Consumes the pending pointer sample. Call once per animation frame.
    pub fn on_frame(&mut self, session: &mut EditSession) -> CoreResult<FrameOutcome> {
        let ctx = self.snap_context(session.document());
        let gesture = self.gesture.as_mut().ok_or(CoreError::NoActiveGesture)?;
        let Some(sample) = gesture.pending.take() else {
            return Ok(FrameOutcome::Idle);
        };

        match &mut gesture.kind {
            GestureKind::Move {
                track_id,
                origin_start_us,
                duration_us,
                frame_offset_us,
            } => {
                let snapped = snap_start(
                    *origin_start_us + sample.delta_us,
                    *duration_us,
                    &ctx,
                    &gesture.targets,
                    *frame_offset_us,
                );
                let target_track = sample.track_id.unwrap_or_else(|| track_id.clone());

                if gesture.mode == DragMode::Overlay {
                    let preview = MovePreview {
                        track_id: target_track,
                        item_id: gesture.item_id.clone(),
                        start_us: snapped.time_us,
                    };
                    gesture.preview = Some(preview.clone());
                    return Ok(FrameOutcome::Preview(preview));
                }

                let command = if target_track == *track_id {
                    EditCommand::move_item(track_id, &gesture.item_id, snapped.time_us)
                } else {
                    EditCommand::move_item_to_track(
                        track_id,
                        &target_track,
                        &gesture.item_id,
                        snapped.time_us,
                    )
                };
                let result = session.execute(&command);
                if result.document.find_item(&target_track, &gesture.item_id).is_some() {
                    *track_id = target_track;
                }
                Ok(FrameOutcome::Applied(result))
            }
            GestureKind::Trim {
                track_id,
                edge,
                origin_edge_us,
                tracker,
            } => {
                let snapped = snap_edge(*origin_edge_us + sample.delta_us, &ctx, &gesture.targets);
                let Some(increment) = tracker.step(snapped.time_us - *origin_edge_us) else {
                    return Ok(FrameOutcome::Idle);
                };

                let command = match gesture.mode {
                    DragMode::Free => {
                        EditCommand::trim_item(track_id, &gesture.item_id, *edge, increment)
                    }
                    DragMode::Overlay => {
                        EditCommand::overlay_trim_item(track_id, &gesture.item_id, *edge, increment)
                    }
                };
                let result = session.execute(&command);

                // The engine may clamp; measure what really moved
                if let Some(item) = result.document.find_item(track_id, &gesture.item_id) {
                    let edge_us = match edge {
                        Edge::Start => item.start_us(),
                        Edge::End => item.end_us(),
                    };
                    tracker.record_applied(edge_us - *origin_edge_us);
                }
                Ok(FrameOutcome::Applied(result))
            }
        }
    }

    /// Ends the gesture, keeping its edits as one history entry.
    /// Returns true if the document changed.
    pub fn commit(&mut self, session: &mut EditSession) -> CoreResult<bool> {
        if self.gesture.is_none() {
            return Err(CoreError::NoActiveGesture);
        }
        if let FrameOutcome::Applied(result) = self.on_frame(session)? {
            debug!("Flushed pending sample on commit (changed: {})", result.changed);
        }

        let Some(gesture) = self.gesture.take() else {
            return Err(CoreError::NoActiveGesture);
        };

        if let (Some(preview), GestureKind::Move { track_id, .. }) =
            (&gesture.preview, &gesture.kind)
        {
            session.execute(&EditCommand::overlay_place_item(
                track_id,
                &preview.track_id,
                &preview.item_id,
                preview.start_us,
            ));
        }

        let changed = session.commit_batch()?;
        info!("Committed gesture on {} (changed: {})", gesture.item_id, changed);
        Ok(changed)
    }

    /// Aborts the gesture and restores the document from before it began
    pub fn cancel(&mut self, session: &mut EditSession) -> CoreResult<Arc<TimelineDocument>> {
        let gesture = self.gesture.take().ok_or(CoreError::NoActiveGesture)?;
        info!("Cancelled gesture on {}", gesture.item_id);
        session.cancel_batch()
    }
}

// =============================================================================
// Tests
// =============================================================================
