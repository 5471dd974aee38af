//! Command Result Definition
//!
//! What `apply` hands back: the next document, whether anything changed, and
//! a list of state changes for collaborators that cache per-item work.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::timeline::TimelineDocument;

/// State change types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StateChange {
    ItemCreated { track_id: String, item_id: String },
    ItemModified { track_id: String, item_id: String },
    ItemDeleted { track_id: String, item_id: String },
    ItemMoved {
        from_track_id: String,
        to_track_id: String,
        item_id: String,
    },
    MarkerAdded { marker_id: String },
    MarkerUpdated { marker_id: String },
    MarkerRemoved { marker_id: String },
}

impl StateChange {
    pub fn item_modified(track_id: &str, item_id: &str) -> Self {
        Self::ItemModified {
            track_id: track_id.to_string(),
            item_id: item_id.to_string(),
        }
    }

    pub fn item_created(track_id: &str, item_id: &str) -> Self {
        Self::ItemCreated {
            track_id: track_id.to_string(),
            item_id: item_id.to_string(),
        }
    }

    pub fn item_deleted(track_id: &str, item_id: &str) -> Self {
        Self::ItemDeleted {
            track_id: track_id.to_string(),
            item_id: item_id.to_string(),
        }
    }
}

/// A new document produced by a handler, before it is wrapped in an `Arc`
#[derive(Debug)]
pub(crate) struct Edit {
    pub document: TimelineDocument,
    pub changes: Vec<StateChange>,
}

impl Edit {
    pub fn new(document: TimelineDocument) -> Self {
        Self {
            document,
            changes: vec![],
        }
    }

    /// Adds a state change
    pub fn with_change(mut self, change: StateChange) -> Self {
        self.changes.push(change);
        self
    }
}

/// Command execution result
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The next document. Pointer-equal to the input when nothing changed.
    pub document: Arc<TimelineDocument>,
    pub changed: bool,
    pub changes: Vec<StateChange>,
}

impl CommandResult {
    /// Result for a command that left the document alone
    pub fn unchanged(document: &Arc<TimelineDocument>) -> Self {
        Self {
            document: Arc::clone(document),
            changed: false,
            changes: vec![],
        }
    }

    pub(crate) fn from_edit(edit: Edit) -> Self {
        Self {
            document: Arc::new(edit.document),
            changed: true,
            changes: edit.changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_change_serialization() {
        let change = StateChange::item_created("v1", "clip_01HZ");
        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains("itemCreated"));
        assert!(json.contains("trackId"));
    }

    #[test]
    fn test_unchanged_result_shares_document() {
        let doc = Arc::new(TimelineDocument::empty("Main", 30.0));
        let result = CommandResult::unchanged(&doc);

        assert!(!result.changed);
        assert!(Arc::ptr_eq(&doc, &result.document));
    }

    #[test]
    fn test_edit_builder() {
        let edit = Edit::new(TimelineDocument::empty("Main", 30.0))
            .with_change(StateChange::item_modified("v1", "a"))
            .with_change(StateChange::item_deleted("v1", "b"));
        let result = CommandResult::from_edit(edit);

        assert!(result.changed);
        assert_eq!(result.changes.len(), 2);
    }
}
