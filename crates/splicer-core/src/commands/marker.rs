//! Marker Command Handlers
//!
//! Markers live in `metadata.markers`, keyed by id.

use tracing::debug;

use crate::{
    commands::result::{Edit, StateChange},
    timeline::{Marker, TimelineDocument},
    TimeUs,
};

fn marker_position(document: &TimelineDocument, marker_id: &str) -> Option<usize> {
    document
        .metadata
        .markers
        .iter()
        .position(|m| m.id == marker_id)
}

pub(crate) fn add_marker(
    document: &TimelineDocument,
    marker_id: &str,
    time_us: TimeUs,
    text: &str,
) -> Option<Edit> {
    if marker_position(document, marker_id).is_some() {
        debug!("add_marker: marker {} already exists", marker_id);
        return None;
    }

    let mut next = document.clone();
    next.metadata
        .markers
        .push(Marker::new(marker_id, time_us.max(0), text));

    Some(Edit::new(next).with_change(StateChange::MarkerAdded {
        marker_id: marker_id.to_string(),
    }))
}

pub(crate) fn update_marker(
    document: &TimelineDocument,
    marker_id: &str,
    time_us: Option<TimeUs>,
    text: Option<&str>,
) -> Option<Edit> {
    let idx = marker_position(document, marker_id)?;
    let current = &document.metadata.markers[idx];

    let mut updated = current.clone();
    if let Some(time_us) = time_us {
        updated.time_us = time_us.max(0);
    }
    if let Some(text) = text {
        updated.text = text.to_string();
    }
    if &updated == current {
        return None;
    }

    let mut next = document.clone();
    next.metadata.markers[idx] = updated;

    Some(Edit::new(next).with_change(StateChange::MarkerUpdated {
        marker_id: marker_id.to_string(),
    }))
}

pub(crate) fn remove_marker(document: &TimelineDocument, marker_id: &str) -> Option<Edit> {
    let idx = marker_position(document, marker_id)?;

    let mut next = document.clone();
    next.metadata.markers.remove(idx);

    Some(Edit::new(next).with_change(StateChange::MarkerRemoved {
        marker_id: marker_id.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_document() -> TimelineDocument {
        let mut doc = TimelineDocument::empty("Main", 30.0);
        doc.metadata.markers.push(Marker::new("m1", 1_000_000, "Intro"));
        doc
    }

    #[test]
    fn test_add_marker() {
        let doc = create_test_document();
        let edit = add_marker(&doc, "m2", -20, "Drop").unwrap();

        let marker = edit.document.metadata.find_marker("m2").unwrap();
        assert_eq!(marker.time_us, 0);
        assert_eq!(marker.text, "Drop");
        assert!(add_marker(&doc, "m1", 0, "Again").is_none());
    }

    #[test]
    fn test_update_marker() {
        let doc = create_test_document();
        let edit = update_marker(&doc, "m1", None, Some("Verse")).unwrap();

        let marker = edit.document.metadata.find_marker("m1").unwrap();
        assert_eq!(marker.text, "Verse");
        assert_eq!(marker.time_us, 1_000_000);

        assert!(update_marker(&doc, "m1", Some(1_000_000), Some("Intro")).is_none());
        assert!(update_marker(&doc, "missing", Some(5), None).is_none());
    }

    #[test]
    fn test_remove_marker() {
        let doc = create_test_document();
        let edit = remove_marker(&doc, "m1").unwrap();

        assert!(edit.document.metadata.markers.is_empty());
        assert!(remove_marker(&edit.document, "m1").is_none());
    }
}
