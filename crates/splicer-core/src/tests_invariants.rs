//! Randomized Invariant Tests
//!
//! Seeded random documents and edits, checked against the properties every
//! edit must keep. Seeds are fixed so failures reproduce.

use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::commands::{apply, max_resizable_duration_us, EditCommand, TransitionUpdate};
use crate::playback::{active_at, ActiveClipTracker, PlaybackSpan};
use crate::snap::{snap_start, SnapContext, SnapKind, SnapTarget, SnapTargetKind};
use crate::timeline::{Clip, ClipType, Gap, Item, TimelineDocument, Track, Transition};
use crate::{Edge, TimeUs};

const ITERATIONS: usize = 200;

fn random_track(rng: &mut StdRng, track_idx: usize) -> Track {
    let mut track =
        Track::new_video(&format!("Video {}", track_idx + 1)).with_id(&format!("v{}", track_idx));
    let mut cursor: TimeUs = rng.gen_range(0..1_000_000);

    for i in 0..rng.gen_range(1..7) {
        cursor += rng.gen_range(0..2_000_000);
        let duration = rng.gen_range(100_000..3_000_000);
        let id = format!("c{}_{}", track_idx, i);

        match rng.gen_range(0..10) {
            0 => track.add_item(Gap::new(&id, cursor, duration)),
            1 | 2 => track.add_item(
                Clip::generated(ClipType::Text, duration)
                    .with_id(&id)
                    .place_at(cursor),
            ),
            _ => {
                let head = rng.gen_range(0..2_000_000);
                let tail = rng.gen_range(0..2_000_000);
                track.add_item(
                    Clip::media(&format!("/{}.mp4", id), head + duration + tail)
                        .with_id(&id)
                        .with_source_range(head, duration)
                        .place_at(cursor),
                );
            }
        }
        cursor += duration;
    }
    track
}

fn random_document(rng: &mut StdRng) -> Arc<TimelineDocument> {
    let mut doc = TimelineDocument::empty("Random", 30.0);
    for track_idx in 0..rng.gen_range(1..4) {
        doc = doc.with_track(random_track(rng, track_idx));
    }
    Arc::new(doc)
}

/// Picks a random `(track id, item id)`
fn random_item(rng: &mut StdRng, doc: &TimelineDocument) -> (String, String) {
    let track = &doc.tracks[rng.gen_range(0..doc.tracks.len())];
    let item = &track.items[rng.gen_range(0..track.items.len())];
    (track.id.clone(), item.id().to_string())
}

fn random_clip(rng: &mut StdRng, doc: &TimelineDocument) -> Option<(String, String)> {
    let clips: Vec<(String, String)> = doc
        .tracks
        .iter()
        .flat_map(|t| t.clips().map(move |c| (t.id.clone(), c.id.clone())))
        .collect();
    if clips.is_empty() {
        return None;
    }
    Some(clips[rng.gen_range(0..clips.len())].clone())
}

fn random_edge(rng: &mut StdRng) -> Edge {
    if rng.gen_bool(0.5) {
        Edge::Start
    } else {
        Edge::End
    }
}

fn assert_ranges_sane(doc: &TimelineDocument) {
    for track in &doc.tracks {
        for item in &track.items {
            let range = item.timeline_range();
            assert!(range.start_us >= 0, "{} starts before 0", item.id());
            assert!(range.duration_us >= 0, "{} has negative duration", item.id());

            if let Some(clip) = item.as_media() {
                let total = clip.source_duration_us.unwrap_or(TimeUs::MAX);
                assert!(clip.source_range.start_us >= 0, "{} source before 0", clip.id);
                assert!(clip.source_range.duration_us >= 0);
                assert!(
                    clip.source_range.end_us() <= total,
                    "{} source ends past the media",
                    clip.id
                );
            }
        }
    }
}

#[test]
fn test_move_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0001);
    for _ in 0..ITERATIONS {
        let doc = random_document(&mut rng);
        let (track_id, item_id) = random_item(&mut rng, &doc);
        let start = rng.gen_range(-1_000..20_000_000);
        let command = EditCommand::move_item(&track_id, &item_id, start);

        let once = apply(&doc, &command);
        let twice = apply(&once.document, &command);

        assert_eq!(*once.document, *twice.document);
        assert!(!twice.changed);
    }
}

#[test]
fn test_overlay_place_leaves_no_overlaps() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0002);
    for _ in 0..ITERATIONS {
        let doc = random_document(&mut rng);
        assert!(doc.validate().is_ok());

        let (from_track, item_id) = random_item(&mut rng, &doc);
        let to_track = doc.tracks[rng.gen_range(0..doc.tracks.len())].id.clone();
        let start = rng.gen_range(0..15_000_000);

        let result = apply(
            &doc,
            &EditCommand::overlay_place_item(&from_track, &to_track, &item_id, start),
        );

        let track = result.document.find_track(&to_track).unwrap();
        assert!(
            track.find_overlap().is_none(),
            "overlap after placing {} at {} on {}",
            item_id,
            start,
            to_track
        );
        assert!(result.document.validate().is_ok());
        assert!(result.document.find_item(&to_track, &item_id).is_some());
    }
}

#[test]
fn test_trim_stays_in_bounds() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0003);
    for _ in 0..ITERATIONS {
        let mut doc = random_document(&mut rng);
        for _ in 0..5 {
            let (track_id, item_id) = random_item(&mut rng, &doc);
            let edge = random_edge(&mut rng);
            let delta = rng.gen_range(-6_000_000..6_000_000);

            let command = if rng.gen_bool(0.5) {
                EditCommand::trim_item(&track_id, &item_id, edge, delta)
            } else {
                EditCommand::overlay_trim_item(&track_id, &item_id, edge, delta)
            };
            doc = apply(&doc, &command).document;
            assert_ranges_sane(&doc);
        }
    }
}

#[test]
fn test_transition_never_exceeds_capacity() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0004);
    for _ in 0..ITERATIONS {
        let mut doc = random_document(&mut rng);
        for _ in 0..3 {
            let Some((track_id, item_id)) = random_clip(&mut rng, &doc) else {
                break;
            };
            let edge = random_edge(&mut rng);
            let current = doc
                .find_item(&track_id, &item_id)
                .and_then(Item::as_clip)
                .and_then(|c| c.transition(edge).cloned());
            let bound =
                max_resizable_duration_us(&doc, &track_id, &item_id, edge, current.as_ref())
                    .unwrap();

            let update = TransitionUpdate::Set(Transition::blend(
                "crossDissolve",
                rng.gen_range(0..8_000_000),
            ));
            let (transition_in, transition_out) = match edge {
                Edge::Start => (update, TransitionUpdate::Keep),
                Edge::End => (TransitionUpdate::Keep, update),
            };
            let result = apply(
                &doc,
                &EditCommand::update_clip_transition(
                    &track_id,
                    &item_id,
                    transition_in,
                    transition_out,
                ),
            );

            let applied = result
                .document
                .find_item(&track_id, &item_id)
                .and_then(Item::as_clip)
                .map_or(0, |c| c.transition_duration_us(edge));
            assert!(
                applied <= bound,
                "{} {:?} transition {} exceeds bound {}",
                item_id,
                edge,
                applied,
                bound
            );
            assert_ranges_sane(&result.document);
            doc = result.document;
        }
    }
}

#[test]
fn test_active_set_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0005);
    for _ in 0..ITERATIONS / 4 {
        let doc = random_document(&mut rng);
        let spans = PlaybackSpan::from_document(&doc);
        let end = doc.duration_us() + 1_000_000;

        let mut tracker = ActiveClipTracker::new();
        let mut last = 0;
        for _ in 0..40 {
            // Mostly forward playback with occasional seeks
            let time = if rng.gen_bool(0.7) {
                (last + rng.gen_range(0..400_000)).min(end)
            } else {
                rng.gen_range(0..end)
            };

            let update = tracker.update(&spans, time, last, |_| {});
            assert_eq!(update.active, active_at(&spans, time), "mismatch at {}", time);
            last = time;
        }
    }
}

#[test]
fn test_clip_snap_beats_frame_snap() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0006);
    let ctx = SnapContext {
        zoom: 1.0,
        threshold_px: 10.0,
        fps: 30.0,
        clip_snap: true,
        frame_snap: true,
    };
    for _ in 0..ITERATIONS {
        let target = rng.gen_range(1_000_000..10_000_000);
        let raw = target + rng.gen_range(-90_000..90_000);
        let targets = [SnapTarget::new(target, SnapTargetKind::ItemEnd)];

        let result = snap_start(raw, 30_000_000, &ctx, &targets, 0);
        assert_eq!(result.time_us, target);
        assert!(matches!(result.kind, SnapKind::Target { .. }));
    }
}

#[test]
fn test_no_op_commands_share_the_document() {
    let mut rng = StdRng::seed_from_u64(0x5EED_0007);
    for _ in 0..ITERATIONS {
        let doc = random_document(&mut rng);
        let (track_id, item_id) = random_item(&mut rng, &doc);
        let start = doc.find_item(&track_id, &item_id).unwrap().start_us();

        let result = apply(
            &doc,
            &EditCommand::move_item_to_track(&track_id, &track_id, &item_id, start),
        );
        assert!(!result.changed);
        assert!(Arc::ptr_eq(&doc, &result.document));
    }
}
