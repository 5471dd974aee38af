//! Edit Session
//!
//! Owns the current document and its undo/redo history. Because documents
//! are immutable `Arc` values, history entries are snapshots rather than
//! inverse commands: undo just swaps the previous `Arc` back in.
//!
//! A batch groups several commands (one drag gesture) into a single history
//! entry and can be cancelled to restore the document from before it began.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    commands::{apply, CommandResult, EditCommand},
    settings::EditorSettings,
    timeline::TimelineDocument,
    CoreError, CoreResult,
};

/// Default number of undo entries kept
pub const DEFAULT_MAX_HISTORY: usize = 100;

// =============================================================================
// History Entry
// =============================================================================

/// Entry in the undo/redo history
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    /// Human-readable label ("Move clip")
    pub label: String,
    /// Document to restore when this entry is undone (or redone)
    pub document: Arc<TimelineDocument>,
}

#[derive(Debug)]
struct Batch {
    label: String,
    snapshot: Arc<TimelineDocument>,
    was_dirty: bool,
    changed: bool,
}

// =============================================================================
// Edit Session
// =============================================================================

/// Applies commands to a document and manages undo/redo history
#[derive(Debug)]
pub struct EditSession {
    document: Arc<TimelineDocument>,
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_history_size: usize,
    is_dirty: bool,
    batch: Option<Batch>,
}

impl EditSession {
    /// Opens a session on a document
    pub fn new(document: TimelineDocument) -> Self {
        Self::from_arc(Arc::new(document))
    }

    pub fn from_arc(document: Arc<TimelineDocument>) -> Self {
        Self {
            document,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: DEFAULT_MAX_HISTORY,
            is_dirty: false,
            batch: None,
        }
    }

    /// Sets the maximum history size
    pub fn with_max_history(mut self, size: usize) -> Self {
        self.max_history_size = size.max(1);
        self
    }

    /// Applies the history depth from editor settings
    pub fn with_settings(self, settings: &EditorSettings) -> Self {
        self.with_max_history(settings.max_history_size)
    }

    /// The current document
    pub fn document(&self) -> &Arc<TimelineDocument> {
        &self.document
    }

    /// True when there are changes the persistence collaborator has not saved
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Called by the persistence collaborator after it saved the document
    pub fn mark_saved(&mut self) {
        self.is_dirty = false;
    }

    /// Replaces the document wholesale (load or timeline switch).
    /// History and any open batch are discarded.
    pub fn replace_document(&mut self, document: Arc<TimelineDocument>) {
        info!("Switching session to document {}", document.id);
        self.document = document;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch = None;
        self.is_dirty = false;
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        self.redo_stack.clear();
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.max_history_size {
            self.undo_stack.pop_front();
        }
    }

    /// Applies a command. No-ops leave history and the dirty flag alone.
    pub fn execute(&mut self, command: &EditCommand) -> CommandResult {
        let result = apply(&self.document, command);
        if !result.changed {
            return result;
        }

        let previous = std::mem::replace(&mut self.document, Arc::clone(&result.document));
        match self.batch.as_mut() {
            Some(batch) => batch.changed = true,
            None => self.push_undo(HistoryEntry {
                label: command.label().to_string(),
                document: previous,
            }),
        }

        self.is_dirty = true;
        debug!("Executed {}", command.type_name());
        result
    }

    /// Restores the document from before the last history entry
    pub fn undo(&mut self) -> CoreResult<Arc<TimelineDocument>> {
        if self.batch.is_some() {
            return Err(CoreError::GestureInProgress);
        }
        let entry = self.undo_stack.pop_back().ok_or(CoreError::NothingToUndo)?;
        info!("Undo: {}", entry.label);

        let current = std::mem::replace(&mut self.document, entry.document);
        self.redo_stack.push_back(HistoryEntry {
            label: entry.label,
            document: current,
        });
        self.is_dirty = true;

        Ok(Arc::clone(&self.document))
    }

    /// Re-applies the last undone history entry
    pub fn redo(&mut self) -> CoreResult<Arc<TimelineDocument>> {
        if self.batch.is_some() {
            return Err(CoreError::GestureInProgress);
        }
        let entry = self.redo_stack.pop_back().ok_or(CoreError::NothingToRedo)?;
        info!("Redo: {}", entry.label);

        let current = std::mem::replace(&mut self.document, entry.document);
        self.undo_stack.push_back(HistoryEntry {
            label: entry.label,
            document: current,
        });
        self.is_dirty = true;

        Ok(Arc::clone(&self.document))
    }

    /// Returns true if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Returns the number of entries in the undo stack
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns the number of entries in the redo stack
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the entry `undo` would restore
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.label.as_str())
    }

    // -------------------------------------------------------------------------
    // Batches
    // -------------------------------------------------------------------------

    /// True while a batch is open
    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Snapshot taken when the open batch began
    pub fn batch_snapshot(&self) -> Option<&Arc<TimelineDocument>> {
        self.batch.as_ref().map(|b| &b.snapshot)
    }

    /// Starts grouping commands into one history entry
    pub fn begin_batch(&mut self, label: &str) -> CoreResult<()> {
        if self.batch.is_some() {
            return Err(CoreError::GestureInProgress);
        }
        debug!("Begin batch: {}", label);
        self.batch = Some(Batch {
            label: label.to_string(),
            snapshot: Arc::clone(&self.document),
            was_dirty: self.is_dirty,
            changed: false,
        });
        Ok(())
    }

    /// Closes the batch. Returns true if it recorded a history entry.
    pub fn commit_batch(&mut self) -> CoreResult<bool> {
        let batch = self.batch.take().ok_or(CoreError::NoActiveGesture)?;
        if !batch.changed || Arc::ptr_eq(&batch.snapshot, &self.document) {
            debug!("Batch {} made no changes", batch.label);
            self.is_dirty = batch.was_dirty;
            return Ok(false);
        }

        info!("Committed batch: {}", batch.label);
        self.push_undo(HistoryEntry {
            label: batch.label,
            document: batch.snapshot,
        });
        Ok(true)
    }

    /// Discards the batch and restores the document from before it began
    pub fn cancel_batch(&mut self) -> CoreResult<Arc<TimelineDocument>> {
        let batch = self.batch.take().ok_or(CoreError::NoActiveGesture)?;
        info!("Cancelled batch: {}", batch.label);

        self.document = batch.snapshot;
        self.is_dirty = batch.was_dirty;
        Ok(Arc::clone(&self.document))
    }
}

// =============================================================================
// Tests
// =============================================================================
