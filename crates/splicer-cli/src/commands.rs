//! CLI Command Implementations

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use splicer_core::{
    commands::{transition_capacity, EditCommand, StateChange, TransitionCapacity},
    playback::{active_at, ActiveClipTracker, PlaybackSpan},
    session::EditSession,
    settings::EditorSettings,
    snap::{collect_targets, snap_start, SnapContext, SnapResult},
    timeline::{Item, TimelineDocument},
    Edge, TimeUs,
};

/// Loads editor settings, falling back to defaults when no file is given
pub fn load_settings(path: Option<&Path>) -> Result<EditorSettings> {
    let Some(path) = path else {
        return Ok(EditorSettings::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings {}", path.display()))?;
    EditorSettings::from_json_str(&json)
        .with_context(|| format!("Invalid settings in {}", path.display()))
}

pub fn load_document(path: &Path) -> Result<TimelineDocument> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    let document: TimelineDocument = serde_json::from_str(&json)
        .with_context(|| format!("Invalid document JSON in {}", path.display()))?;
    info!(
        "Loaded document {} ({} tracks)",
        document.name,
        document.tracks.len()
    );
    Ok(document)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// apply
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplySummary {
    pub executed: usize,
    pub changed: usize,
    pub changes: Vec<StateChange>,
    pub undo_depth: usize,
}

/// Runs every command through an edit session
pub fn run_commands(
    document: TimelineDocument,
    commands: &[EditCommand],
    settings: &EditorSettings,
) -> (TimelineDocument, ApplySummary) {
    let mut session = EditSession::new(document).with_settings(settings);
    let mut summary = ApplySummary {
        executed: 0,
        changed: 0,
        changes: vec![],
        undo_depth: 0,
    };

    for command in commands {
        let result = session.execute(command);
        summary.executed += 1;
        if result.changed {
            summary.changed += 1;
            summary.changes.extend(result.changes);
        } else {
            warn!("{} left the document unchanged", command.type_name());
        }
    }
    summary.undo_depth = session.undo_count();

    ((**session.document()).clone(), summary)
}

pub fn apply(
    document_path: &Path,
    commands_path: &Path,
    output: Option<&Path>,
    settings: &EditorSettings,
) -> Result<()> {
    let document = load_document(document_path)?;
    let json = fs::read_to_string(commands_path)
        .with_context(|| format!("Failed to read commands {}", commands_path.display()))?;
    let commands: Vec<EditCommand> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid command list in {}", commands_path.display()))?;

    let (document, summary) = run_commands(document, &commands, settings);
    info!(
        "Applied {} of {} commands",
        summary.changed, summary.executed
    );

    let rendered = serde_json::to_string_pretty(&document)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_json(&summary)
        }
        None => {
            println!("{}", rendered);
            eprintln!("{}", serde_json::to_string(&summary)?);
            Ok(())
        }
    }
}

// =============================================================================
// active
// =============================================================================

/// Active spans at `at`, sweeping from `from` when given
pub fn active_spans(
    document: &TimelineDocument,
    at: TimeUs,
    from: Option<TimeUs>,
) -> Vec<PlaybackSpan> {
    let spans = PlaybackSpan::from_document(document);
    match from {
        Some(from) => {
            let mut tracker = ActiveClipTracker::new();
            tracker.update(&spans, from, from, |_| {});
            let update = tracker.update(&spans, at, from, |span| {
                info!("Deactivated {} on {}", span.item_id, span.track_id);
            });
            update.active.into_iter().cloned().collect()
        }
        None => active_at(&spans, at).into_iter().cloned().collect(),
    }
}

pub fn active(document_path: &Path, at: TimeUs, from: Option<TimeUs>) -> Result<()> {
    let document = load_document(document_path)?;
    print_json(&active_spans(&document, at, from))
}

// =============================================================================
// capacity
// =============================================================================

pub fn edge_capacity(
    document: &TimelineDocument,
    track_id: &str,
    item_id: &str,
    edge: Edge,
) -> Result<TransitionCapacity> {
    let Some(clip) = document.find_item(track_id, item_id).and_then(Item::as_clip) else {
        bail!("No clip {} on track {}", item_id, track_id);
    };
    let current = clip.transition(edge);
    transition_capacity(document, track_id, item_id, edge, current)
        .with_context(|| format!("No capacity for {} {:?}", item_id, edge))
}

pub fn capacity(document_path: &Path, track_id: &str, item_id: &str, edge: Edge) -> Result<()> {
    let document = load_document(document_path)?;
    let capacity = edge_capacity(&document, track_id, item_id, edge)?;
    print_json(&serde_json::json!({
        "maxWithinClip": capacity.max_within_clip,
        "limitByHandle": capacity.limit_by_handle,
        "bound": capacity.bound(),
    }))
}

// =============================================================================
// snap
// =============================================================================

pub fn snap_item(
    document: &TimelineDocument,
    raw_us: TimeUs,
    duration_us: TimeUs,
    zoom: f64,
    playhead_us: TimeUs,
    exclude: &[String],
    settings: &EditorSettings,
) -> SnapResult {
    let excluded: Vec<&str> = exclude.iter().map(String::as_str).collect();
    let targets = collect_targets(document, &excluded, playhead_us);
    let ctx = SnapContext::from_settings(settings, zoom, document.timebase.fps);
    snap_start(raw_us, duration_us, &ctx, &targets, 0)
}

pub fn snap(
    document_path: &Path,
    raw_us: TimeUs,
    duration_us: TimeUs,
    zoom: f64,
    playhead_us: TimeUs,
    exclude: &[String],
    settings: &EditorSettings,
) -> Result<()> {
    let document = load_document(document_path)?;
    let result = snap_item(&document, raw_us, duration_us, zoom, playhead_us, exclude, settings);
    print_json(&result)
}

// =============================================================================
// validate
// =============================================================================

pub fn validate(document_path: &Path) -> Result<()> {
    let document = load_document(document_path)?;
    document
        .validate()
        .with_context(|| format!("{} is not a valid timeline", document_path.display()))?;
    println!("{} is valid", document_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use splicer_core::{
        snap::SnapKind,
        timeline::{Clip, Track},
    };
    use tempfile::TempDir;

    fn sample_document() -> TimelineDocument {
        let v1 = Track::new_video("Video 1")
            .with_id("v1")
            .with_item(Clip::media("/a.mp4", 10_000_000).with_id("a"));
        let v2 = Track::new_video("Video 2").with_id("v2").with_item(
            Clip::media("/b.mp4", 3_000_000)
                .with_id("b")
                .place_at(5_000_000),
        );
        TimelineDocument::empty("Sample", 30.0)
            .with_track(v1)
            .with_track(v2)
    }

    fn write_json<T: Serialize>(dir: &TempDir, name: &str, value: &T) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_settings_defaults_and_file() {
        assert_eq!(load_settings(None).unwrap(), EditorSettings::default());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"snapTolerancePx": 500}"#).unwrap();
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.snap_tolerance_px, 200);
    }

    #[test]
    fn test_missing_document_has_context() {
        let err = load_document(Path::new("/nonexistent/doc.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read document"));
    }

    #[test]
    fn test_apply_writes_output() {
        let dir = TempDir::new().unwrap();
        let document = write_json(&dir, "doc.json", &sample_document());
        let commands = write_json(
            &dir,
            "commands.json",
            &vec![
                EditCommand::move_item("v2", "b", 12_000_000),
                EditCommand::move_item("v1", "missing", 0),
            ],
        );
        let output = dir.path().join("out.json");

        apply(&document, &commands, Some(&output), &EditorSettings::default()).unwrap();

        let result = load_document(&output).unwrap();
        assert_eq!(result.find_item("v2", "b").unwrap().start_us(), 12_000_000);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_run_commands_counts_noops() {
        let (document, summary) = run_commands(
            sample_document(),
            &[
                EditCommand::move_item("v1", "a", 1_000),
                EditCommand::move_item("v1", "a", 1_000),
            ],
            &EditorSettings::default(),
        );

        assert_eq!(summary.executed, 2);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.undo_depth, 1);
        assert_eq!(document.find_item("v1", "a").unwrap().start_us(), 1_000);
    }

    #[test]
    fn test_active_spans_direct_and_swept() {
        let document = sample_document();
        let ids = |spans: Vec<PlaybackSpan>| -> Vec<String> {
            spans.into_iter().map(|s| s.item_id).collect()
        };

        assert_eq!(ids(active_spans(&document, 6_000_000, None)), vec!["a", "b"]);
        assert_eq!(ids(active_spans(&document, 9_000_000, Some(0))), vec!["a"]);
        assert_eq!(ids(active_spans(&document, 6_000_000, Some(9_000_000))), vec!["a", "b"]);
    }

    #[test]
    fn test_edge_capacity_unknown_clip() {
        let document = sample_document();
        assert!(edge_capacity(&document, "v1", "nope", Edge::End).is_err());

        let capacity = edge_capacity(&document, "v2", "b", Edge::End).unwrap();
        assert_eq!(capacity.max_within_clip, 3_000_000);
    }

    #[test]
    fn test_snap_item_to_clip_edge() {
        let document = sample_document();
        let exclude = vec!["b".to_string()];
        let result = snap_item(
            &document,
            10_040_000,
            1_000_000,
            1.0,
            0,
            &exclude,
            &EditorSettings::default(),
        );

        assert_eq!(result.time_us, 10_000_000);
        assert!(matches!(result.kind, SnapKind::Target { .. }));
    }

    #[test]
    fn test_validate_reports_overlap() {
        let dir = TempDir::new().unwrap();
        let mut document = sample_document();
        document.tracks[0]
            .add_item(Clip::media("/c.mp4", 1_000_000).with_id("c").place_at(500_000));
        let path = write_json(&dir, "bad.json", &document);

        assert!(validate(&path).is_err());
    }
}
