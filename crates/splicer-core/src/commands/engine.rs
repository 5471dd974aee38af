//! Command Engine
//!
//! Applies one `EditCommand` to a document. Handlers never mutate their
//! input: they clone, edit the copy and return it, or return `None` when the
//! document would not change. A `None` becomes a result that shares the input
//! `Arc`, so callers can detect no-ops with `Arc::ptr_eq`.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    commands::{clip, marker, overlap, result::CommandResult, transition, EditCommand},
    timeline::{Item, TimelineDocument},
};

/// Finds the `(track index, item index)` of an item
pub(crate) fn locate_item(
    document: &TimelineDocument,
    track_id: &str,
    item_id: &str,
) -> Option<(usize, usize)> {
    let track_idx = document.track_index(track_id)?;
    let item_idx = document.tracks[track_idx].item_position(item_id)?;
    Some((track_idx, item_idx))
}

/// Locked clips refuse geometry edits. Gaps are never locked.
pub(crate) fn is_item_locked(item: &Item) -> bool {
    let locked = item.as_clip().is_some_and(|c| c.locked);
    if locked {
        debug!("Item {} is locked", item.id());
    }
    locked
}

/// Applies a command to a document.
///
/// Never fails: unknown ids and edits that clamp to nothing return the input
/// document with `changed == false`.
pub fn apply(document: &Arc<TimelineDocument>, command: &EditCommand) -> CommandResult {
    let doc = document.as_ref();

    let edit = match command {
        EditCommand::MoveItem {
            track_id,
            item_id,
            start_us,
        } => clip::move_item(doc, track_id, track_id, item_id, *start_us),
        EditCommand::MoveItemToTrack {
            from_track_id,
            to_track_id,
            item_id,
            start_us,
        } => clip::move_item(doc, from_track_id, to_track_id, item_id, *start_us),
        EditCommand::TrimItem {
            track_id,
            item_id,
            edge,
            delta_us,
        }
        | EditCommand::OverlayTrimItem {
            track_id,
            item_id,
            edge,
            delta_us,
        } => clip::trim_item(doc, track_id, item_id, *edge, *delta_us),
        EditCommand::OverlayPlaceItem {
            from_track_id,
            to_track_id,
            item_id,
            start_us,
        } => overlap::overlay_place_item(doc, from_track_id, to_track_id, item_id, *start_us),
        EditCommand::UpdateClipProperties {
            track_id,
            item_id,
            properties,
        } => clip::update_clip_properties(doc, track_id, item_id, properties),
        EditCommand::UpdateClipTransition {
            track_id,
            item_id,
            transition_in,
            transition_out,
        } => transition::update_clip_transition(
            doc,
            track_id,
            item_id,
            transition_in,
            transition_out,
        ),
        EditCommand::AddMarker { id, time_us, text } => {
            marker::add_marker(doc, id, *time_us, text)
        }
        EditCommand::UpdateMarker { id, time_us, text } => {
            marker::update_marker(doc, id, *time_us, text.as_deref())
        }
        EditCommand::RemoveMarker { id } => marker::remove_marker(doc, id),
    };

    match edit {
        Some(edit) => {
            trace!(
                "Applied {} ({} state changes)",
                command.type_name(),
                edit.changes.len()
            );
            CommandResult::from_edit(edit)
        }
        None => {
            debug!("{} left the document unchanged", command.type_name());
            CommandResult::unchanged(document)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::{ClipProperties, StateChange, TransitionUpdate},
        timeline::{Clip, Track, Transition},
        Edge,
    };

    fn create_test_document() -> Arc<TimelineDocument> {
        let v1 = Track::new_video("Video 1")
            .with_id("v1")
            .with_item(
                Clip::media("/left.mp4", 10_000_000)
                    .with_id("left")
                    .with_source_range(0, 5_000_000),
            )
            .with_item(
                Clip::media("/right.mp4", 10_000_000)
                    .with_id("right")
                    .with_source_range(2_000_000, 5_000_000)
                    .place_at(5_000_000),
            );
        let v2 = Track::new_video("Video 2").with_id("v2");
        Arc::new(
            TimelineDocument::empty("Main", 30.0)
                .with_track(v1)
                .with_track(v2),
        )
    }

    #[test]
    fn test_same_track_move_to_same_start_is_noop() {
        let doc = create_test_document();
        let result = apply(
            &doc,
            &EditCommand::move_item_to_track("v1", "v1", "right", 5_000_000),
        );

        assert!(!result.changed);
        assert!(Arc::ptr_eq(&doc, &result.document));
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_unknown_ids_return_same_document() {
        let doc = create_test_document();
        let commands = vec![
            EditCommand::move_item("nope", "left", 0),
            EditCommand::trim_item("v1", "nope", Edge::End, 10),
            EditCommand::overlay_place_item("v1", "nope", "left", 0),
            EditCommand::update_clip_properties(
                "v1",
                "nope",
                ClipProperties {
                    opacity: Some(0.5),
                    ..Default::default()
                },
            ),
            EditCommand::update_clip_transition(
                "v1",
                "nope",
                TransitionUpdate::Clear,
                TransitionUpdate::Keep,
            ),
            EditCommand::RemoveMarker {
                id: "nope".to_string(),
            },
        ];

        for command in &commands {
            let result = apply(&doc, command);
            assert!(!result.changed, "{} changed the document", command.type_name());
            assert!(Arc::ptr_eq(&doc, &result.document));
        }
    }

    #[test]
    fn test_move_is_idempotent() {
        let doc = create_test_document();
        let command = EditCommand::move_item("v1", "right", 12_000_000);

        let first = apply(&doc, &command);
        assert!(first.changed);
        let second = apply(&first.document, &command);

        assert!(!second.changed);
        assert_eq!(*first.document, *second.document);
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let doc = create_test_document();
        let before = (*doc).clone();

        let result = apply(&doc, &EditCommand::trim_item("v1", "left", Edge::End, -1_000_000));

        assert!(result.changed);
        assert_eq!(*doc, before);
        assert_eq!(
            result.changes,
            vec![StateChange::item_modified("v1", "left")]
        );
    }

    #[test]
    fn test_overlay_trim_matches_trim() {
        let doc = create_test_document();
        let trim = apply(&doc, &EditCommand::trim_item("v1", "right", Edge::Start, 500_000));
        let overlay = apply(
            &doc,
            &EditCommand::overlay_trim_item("v1", "right", Edge::Start, 500_000),
        );

        assert_eq!(*trim.document, *overlay.document);
    }

    #[test]
    fn test_transition_dispatch() {
        let doc = create_test_document();
        let result = apply(
            &doc,
            &EditCommand::update_clip_transition(
                "v1",
                "left",
                TransitionUpdate::Keep,
                TransitionUpdate::Set(Transition::blend("crossDissolve", 1_000_000)),
            ),
        );

        assert!(result.changed);
        let left = result
            .document
            .find_item("v1", "left")
            .and_then(Item::as_clip)
            .unwrap();
        assert_eq!(left.transition_duration_us(Edge::End), 1_000_000);
    }

    #[test]
    fn test_locked_track_rejects_edits() {
        let mut doc = (*create_test_document()).clone();
        doc.tracks[0].locked = true;
        let doc = Arc::new(doc);

        let result = apply(&doc, &EditCommand::move_item("v1", "left", 1_000));
        assert!(!result.changed);
        let result = apply(&doc, &EditCommand::move_item_to_track("v1", "v2", "left", 0));
        assert!(!result.changed);
    }
}
