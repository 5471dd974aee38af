//! Timeline Model Definitions
//!
//! Defines TimelineDocument, Track, Item (Clip / Gap) and Marker.
//! The document is a value: the command engine never mutates one in place,
//! it clones, edits the copy and hands back a new `Arc`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    CoreError, CoreResult, DocumentId, Edge, EffectId, ItemId, MarkerId, TimeRange, TimeUs,
    TrackId, US_PER_SEC,
};

/// Lowest frame rate accepted by `validate`
pub const MIN_FPS: f64 = 1.0;

/// Highest frame rate accepted by `validate`
pub const MAX_FPS: f64 = 240.0;

// =============================================================================
// Timebase
// =============================================================================

/// Frame rate of the document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timebase {
    pub fps: f64,
}

impl Timebase {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }

    /// Duration of one frame in (fractional) microseconds
    pub fn frame_duration_us(&self) -> f64 {
        if self.fps <= 0.0 {
            warn!("Timebase with non-positive fps {}, assuming 30", self.fps);
            return US_PER_SEC as f64 / 30.0;
        }
        US_PER_SEC as f64 / self.fps
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self { fps: 30.0 }
    }
}

// =============================================================================
// Marker
// =============================================================================

/// Timeline marker, stored in document metadata rather than on a track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: MarkerId,
    pub time_us: TimeUs,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Marker {
    pub fn new(id: &str, time_us: TimeUs, text: &str) -> Self {
        Self {
            id: id.to_string(),
            time_us,
            text: text.to_string(),
            color: None,
        }
    }
}

/// Free-form document metadata. Markers are the only structured entry;
/// everything else is carried through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn find_marker(&self, marker_id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == marker_id)
    }
}

// =============================================================================
// Transition
// =============================================================================

/// How a transition is realised at the cut
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionMode {
    /// Both clips' visible ranges overlap for the transition duration
    #[default]
    Blend,
    /// Effect applied at the cut without overlapping the clips
    Cut,
}

/// Transition attached to one edge of a clip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Transition kind (e.g. "crossDissolve", "dipToBlack")
    pub transition_type: String,
    pub duration_us: TimeUs,
    #[serde(default)]
    pub mode: TransitionMode,
}

impl Transition {
    pub fn blend(transition_type: &str, duration_us: TimeUs) -> Self {
        Self {
            transition_type: transition_type.to_string(),
            duration_us,
            mode: TransitionMode::Blend,
        }
    }

    pub fn cut(transition_type: &str, duration_us: TimeUs) -> Self {
        Self {
            transition_type: transition_type.to_string(),
            duration_us,
            mode: TransitionMode::Cut,
        }
    }

    pub fn is_blend(&self) -> bool {
        self.mode == TransitionMode::Blend
    }
}

// =============================================================================
// Effect
// =============================================================================

/// Effect instance applied to a clip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub id: EffectId,
    pub effect_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Effect {
    pub fn new(effect_type: &str) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            effect_type: effect_type.to_string(),
            enabled: true,
            params: serde_json::Map::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_unity() -> f64 {
    1.0
}

fn default_opacity() -> f32 {
    1.0
}

// =============================================================================
// Clip
// =============================================================================

/// Content kind of a clip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClipType {
    #[default]
    Media,
    Background,
    Text,
    /// Nested timeline
    Timeline,
}

/// Clip (timed item referencing media or generated content)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ItemId,
    #[serde(default)]
    pub clip_type: ClipType,
    #[serde(default)]
    pub name: String,
    /// Source media path (media clips only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Total available source material (media clips only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_duration_us: Option<TimeUs>,
    /// Position on the track
    pub timeline_range: TimeRange,
    /// Portion of the source currently exposed
    #[serde(default)]
    pub source_range: TimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_in: Option<Transition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_out: Option<Transition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_fade_in_us: Option<TimeUs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_fade_out_us: Option<TimeUs>,
    /// Linear gain (1.0 = unity)
    #[serde(default = "default_unity")]
    pub audio_gain: f64,
    /// Stereo balance (-1.0 left, 0.0 center, 1.0 right)
    #[serde(default)]
    pub audio_balance: f64,
    /// Opacity (0.0 - 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl Clip {
    /// Creates a media clip exposing the whole source, placed at 0
    pub fn media(source_path: &str, source_duration_us: TimeUs) -> Self {
        let mut clip = Self::generated(ClipType::Media, source_duration_us);
        clip.source_path = Some(source_path.to_string());
        clip.source_duration_us = Some(source_duration_us);
        clip
    }

    /// Creates a generated (non-media) clip of the given length, placed at 0
    pub fn generated(clip_type: ClipType, duration_us: TimeUs) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            clip_type,
            name: String::new(),
            source_path: None,
            source_duration_us: None,
            timeline_range: TimeRange::new(0, duration_us),
            source_range: TimeRange::new(0, duration_us),
            transition_in: None,
            transition_out: None,
            audio_fade_in_us: None,
            audio_fade_out_us: None,
            audio_gain: 1.0,
            audio_balance: 0.0,
            opacity: 1.0,
            effects: vec![],
            locked: false,
            disabled: false,
        }
    }

    /// Overrides the generated id
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Places the clip at a specific timeline position
    pub fn place_at(mut self, start_us: TimeUs) -> Self {
        self.timeline_range.start_us = start_us;
        self
    }

    /// Exposes `[start_us, start_us + duration_us)` of the source and matches
    /// the timeline duration to it
    pub fn with_source_range(mut self, start_us: TimeUs, duration_us: TimeUs) -> Self {
        self.source_range = TimeRange::new(start_us, duration_us);
        self.timeline_range.duration_us = self.source_range.duration_us;
        self
    }

    pub fn is_media(&self) -> bool {
        self.clip_type == ClipType::Media
    }

    pub fn start_us(&self) -> TimeUs {
        self.timeline_range.start_us
    }

    pub fn end_us(&self) -> TimeUs {
        self.timeline_range.end_us()
    }

    pub fn duration_us(&self) -> TimeUs {
        self.timeline_range.duration_us
    }

    /// Unused source material before the exposed range.
    /// `None` means unlimited (generated content).
    pub fn head_handle_us(&self) -> Option<TimeUs> {
        if !self.is_media() {
            return None;
        }
        Some(self.source_range.start_us.max(0))
    }

    /// Unused source material after the exposed range.
    /// `None` means unlimited (generated content or unknown source length).
    pub fn tail_handle_us(&self) -> Option<TimeUs> {
        if !self.is_media() {
            return None;
        }
        self.source_duration_us
            .map(|total| (total - self.source_range.end_us()).max(0))
    }

    /// Returns the transition on an edge
    pub fn transition(&self, edge: Edge) -> Option<&Transition> {
        match edge {
            Edge::Start => self.transition_in.as_ref(),
            Edge::End => self.transition_out.as_ref(),
        }
    }

    /// Replaces the transition on an edge
    pub fn set_transition(&mut self, edge: Edge, transition: Option<Transition>) {
        match edge {
            Edge::Start => self.transition_in = transition,
            Edge::End => self.transition_out = transition,
        }
    }

    /// Duration currently reserved by the transition on an edge
    pub fn transition_duration_us(&self, edge: Edge) -> TimeUs {
        self.transition(edge).map_or(0, |t| t.duration_us)
    }

    /// Shrinks transitions and audio fades that no longer fit the clip.
    /// Returns true if anything changed.
    pub fn clamp_to_duration(&mut self) -> bool {
        let duration = self.duration_us().max(0);
        let mut changed = false;

        for transition in [&mut self.transition_in, &mut self.transition_out]
            .into_iter()
            .flatten()
        {
            if transition.duration_us > duration {
                transition.duration_us = duration;
                changed = true;
            }
        }

        for fade in [&mut self.audio_fade_in_us, &mut self.audio_fade_out_us]
            .into_iter()
            .flatten()
        {
            if *fade > duration {
                *fade = duration;
                changed = true;
            }
        }

        changed
    }
}

// =============================================================================
// Gap
// =============================================================================

/// Gap (occupies time with no content)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub id: ItemId,
    pub timeline_range: TimeRange,
}

impl Gap {
    pub fn new(id: &str, start_us: TimeUs, duration_us: TimeUs) -> Self {
        Self {
            id: id.to_string(),
            timeline_range: TimeRange::new(start_us, duration_us),
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// Anything that occupies time on a track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Item {
    Clip(Clip),
    Gap(Gap),
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Self::Clip(clip) => &clip.id,
            Self::Gap(gap) => &gap.id,
        }
    }

    pub fn set_id(&mut self, id: ItemId) {
        match self {
            Self::Clip(clip) => clip.id = id,
            Self::Gap(gap) => gap.id = id,
        }
    }

    pub fn timeline_range(&self) -> &TimeRange {
        match self {
            Self::Clip(clip) => &clip.timeline_range,
            Self::Gap(gap) => &gap.timeline_range,
        }
    }

    pub fn timeline_range_mut(&mut self) -> &mut TimeRange {
        match self {
            Self::Clip(clip) => &mut clip.timeline_range,
            Self::Gap(gap) => &mut gap.timeline_range,
        }
    }

    pub fn start_us(&self) -> TimeUs {
        self.timeline_range().start_us
    }

    pub fn end_us(&self) -> TimeUs {
        self.timeline_range().end_us()
    }

    pub fn as_clip(&self) -> Option<&Clip> {
        match self {
            Self::Clip(clip) => Some(clip),
            Self::Gap(_) => None,
        }
    }

    pub fn as_clip_mut(&mut self) -> Option<&mut Clip> {
        match self {
            Self::Clip(clip) => Some(clip),
            Self::Gap(_) => None,
        }
    }

    /// Returns the clip if this is a media clip
    pub fn as_media(&self) -> Option<&Clip> {
        self.as_clip().filter(|c| c.is_media())
    }
}

impl From<Clip> for Item {
    fn from(clip: Clip) -> Self {
        Self::Clip(clip)
    }
}

impl From<Gap> for Item {
    fn from(gap: Gap) -> Self {
        Self::Gap(gap)
    }
}

// =============================================================================
// Track
// =============================================================================

/// Track kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub kind: TrackKind,
    #[serde(default)]
    pub name: String,
    /// Items carry absolute start times; order is kept sorted for determinism only
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default = "default_unity")]
    pub audio_gain: f64,
    #[serde(default)]
    pub audio_balance: f64,
    #[serde(default)]
    pub audio_muted: bool,
    #[serde(default)]
    pub audio_solo: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

impl Track {
    /// Creates a new track with the given name and kind
    pub fn new(name: &str, kind: TrackKind) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            kind,
            name: name.to_string(),
            items: vec![],
            audio_gain: 1.0,
            audio_balance: 0.0,
            audio_muted: false,
            audio_solo: false,
            visible: true,
            locked: false,
        }
    }

    /// Creates a new video track
    pub fn new_video(name: &str) -> Self {
        Self::new(name, TrackKind::Video)
    }

    /// Creates a new audio track
    pub fn new_audio(name: &str) -> Self {
        Self::new(name, TrackKind::Audio)
    }

    /// Overrides the generated id
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Adds an item, keeping the list sorted
    pub fn add_item(&mut self, item: impl Into<Item>) {
        self.items.push(item.into());
        self.sort_items();
    }

    /// Builder variant of `add_item`
    pub fn with_item(mut self, item: impl Into<Item>) -> Self {
        self.add_item(item);
        self
    }

    pub fn get_item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == item_id)
    }

    pub fn get_item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id() == item_id)
    }

    pub fn item_position(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id() == item_id)
    }

    /// Clips on this track, in item order
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.items.iter().filter_map(Item::as_clip)
    }

    /// Sorts items by start time, breaking ties by id
    pub fn sort_items(&mut self) {
        self.items.sort_by(|a, b| {
            a.start_us()
                .cmp(&b.start_us())
                .then_with(|| a.id().cmp(b.id()))
        });
    }

    /// Returns the first pair of overlapping items, if any.
    ///
    /// Two clips overlapping under a blend transition on their facing edges
    /// are not reported.
    pub fn find_overlap(&self) -> Option<(&Item, &Item)> {
        let mut sorted: Vec<&Item> = self.items.iter().collect();
        sorted.sort_by_key(|i| (i.start_us(), i.end_us()));

        let mut furthest: Option<&Item> = None;
        for item in sorted {
            if let Some(prev) = furthest {
                if item.start_us() < prev.end_us()
                    && item.end_us() > item.start_us()
                    && !is_blend_overlap(prev, item)
                {
                    return Some((prev, item));
                }
                if item.end_us() > prev.end_us() {
                    furthest = Some(item);
                }
            } else if item.end_us() > item.start_us() {
                furthest = Some(item);
            }
        }
        None
    }
}

/// True if `later` overlaps only the tail of `earlier` and a blend
/// transition sits on either facing edge
fn is_blend_overlap(earlier: &Item, later: &Item) -> bool {
    let (Some(earlier), Some(later)) = (earlier.as_clip(), later.as_clip()) else {
        return false;
    };
    if later.start_us() <= earlier.start_us() || later.end_us() <= earlier.end_us() {
        return false;
    }

    let is_blend = |t: Option<&Transition>| t.is_some_and(Transition::is_blend);
    is_blend(earlier.transition_out.as_ref()) || is_blend(later.transition_in.as_ref())
}

// =============================================================================
// Timeline Document
// =============================================================================

/// Timeline document (the value the command engine transforms)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDocument {
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub timebase: Timebase,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl TimelineDocument {
    /// Creates an empty document (also the fallback when nothing is loaded)
    pub fn empty(name: &str, fps: f64) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: name.to_string(),
            timebase: Timebase::new(fps),
            tracks: vec![],
            metadata: DocumentMetadata::default(),
        }
    }

    /// Builder: appends a track
    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn find_track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn find_track_mut(&mut self, track_id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    pub fn track_index(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track_id)
    }

    /// Looks up an item on a specific track
    pub fn find_item(&self, track_id: &str, item_id: &str) -> Option<&Item> {
        self.find_track(track_id)?.get_item(item_id)
    }

    /// Returns true if any track holds an item with this id
    pub fn contains_item_id(&self, item_id: &str) -> bool {
        self.tracks
            .iter()
            .any(|t| t.items.iter().any(|i| i.id() == item_id))
    }

    /// End of the last item on any track
    pub fn duration_us(&self) -> TimeUs {
        self.tracks
            .iter()
            .flat_map(|t| t.items.iter())
            .map(Item::end_us)
            .max()
            .unwrap_or(0)
            .max(0)
    }

    /// Checks the document invariants. Used on documents received from
    /// collaborators and by the CLI.
    ///
    /// Clips pulled together by a blend transition may overlap. `move_item`
    /// and trims do not resolve overlaps, so only `overlay_place_item` and
    /// `update_clip_transition` are guaranteed to keep a valid document valid.
    pub fn validate(&self) -> CoreResult<()> {
        if !(MIN_FPS..=MAX_FPS).contains(&self.timebase.fps) {
            return Err(CoreError::ValidationError(format!(
                "fps {} outside [{}, {}]",
                self.timebase.fps, MIN_FPS, MAX_FPS
            )));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for track in &self.tracks {
            for item in &track.items {
                if !seen.insert(item.id()) {
                    return Err(CoreError::ValidationError(format!(
                        "duplicate item id {}",
                        item.id()
                    )));
                }

                let range = item.timeline_range();
                if range.start_us < 0 || range.duration_us < 0 {
                    return Err(CoreError::InvalidTimeRange(
                        range.start_us,
                        range.duration_us,
                    ));
                }

                if let Some(clip) = item.as_media() {
                    let source = clip.source_range;
                    if source.start_us < 0 || source.duration_us < 0 {
                        return Err(CoreError::InvalidTimeRange(
                            source.start_us,
                            source.duration_us,
                        ));
                    }
                    if let Some(total) = clip.source_duration_us {
                        if source.end_us() > total {
                            return Err(CoreError::ValidationError(format!(
                                "clip {} source range ends at {}us beyond source length {}us",
                                clip.id,
                                source.end_us(),
                                total
                            )));
                        }
                    }
                }
            }

            if let Some((a, b)) = track.find_overlap() {
                return Err(CoreError::ItemOverlap {
                    track_id: track.id.clone(),
                    item_id: a.id().to_string(),
                    other_id: b.id().to_string(),
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_document() -> TimelineDocument {
        let track = Track::new_video("Video 1")
            .with_id("v1")
            .with_item(Clip::media("/a.mp4", 10_000_000).with_id("a"))
            .with_item(
                Clip::media("/b.mp4", 8_000_000)
                    .with_id("b")
                    .with_source_range(1_000_000, 4_000_000)
                    .place_at(10_000_000),
            );
        TimelineDocument::empty("Main", 30.0).with_track(track)
    }

    #[test]
    fn test_document_duration() {
        let doc = create_test_document();
        assert_eq!(doc.duration_us(), 14_000_000);
        assert_eq!(TimelineDocument::empty("Empty", 30.0).duration_us(), 0);
    }

    #[test]
    fn test_document_lookup() {
        let doc = create_test_document();
        assert!(doc.find_track("v1").is_some());
        assert!(doc.find_item("v1", "b").is_some());
        assert!(doc.find_item("v1", "missing").is_none());
        assert!(doc.contains_item_id("a"));
        assert!(!doc.contains_item_id("z"));
    }

    #[test]
    fn test_clip_handles() {
        let doc = create_test_document();
        let b = doc.find_item("v1", "b").and_then(Item::as_clip).unwrap();

        assert_eq!(b.head_handle_us(), Some(1_000_000));
        assert_eq!(b.tail_handle_us(), Some(3_000_000));

        let text = Clip::generated(ClipType::Text, 2_000_000);
        assert_eq!(text.head_handle_us(), None);
        assert_eq!(text.tail_handle_us(), None);
    }

    #[test]
    fn test_clip_clamp_to_duration() {
        let mut clip = Clip::media("/a.mp4", 10_000_000);
        clip.timeline_range.duration_us = 1_000_000;
        clip.transition_out = Some(Transition::blend("crossDissolve", 2_000_000));
        clip.audio_fade_in_us = Some(500_000);

        assert!(clip.clamp_to_duration());
        assert_eq!(clip.transition_duration_us(Edge::End), 1_000_000);
        assert_eq!(clip.audio_fade_in_us, Some(500_000));
        assert!(!clip.clamp_to_duration());
    }

    #[test]
    fn test_track_items_stay_sorted() {
        let track = Track::new_audio("Audio 1")
            .with_item(Gap::new("g", 5_000, 1_000))
            .with_item(Gap::new("f", 0, 1_000));

        let ids: Vec<&str> = track.items.iter().map(Item::id).collect();
        assert_eq!(ids, vec!["f", "g"]);
    }

    #[test]
    fn test_validate_accepts_valid_document() {
        assert!(create_test_document().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut doc = create_test_document();
        doc.tracks[0].items[1].timeline_range_mut().start_us = 9_000_000;

        assert!(matches!(
            doc.validate(),
            Err(CoreError::ItemOverlap { .. })
        ));
    }

    #[test]
    fn test_validate_allows_blend_overlap_only() {
        let mut doc = create_test_document();
        // b pulled back 1s under a's end
        doc.tracks[0].items[1].timeline_range_mut().start_us = 9_000_000;
        assert!(matches!(doc.validate(), Err(CoreError::ItemOverlap { .. })));

        if let Some(Item::Clip(a)) = doc.tracks[0].items.get_mut(0) {
            a.transition_out = Some(Transition::cut("dipToBlack", 1_000_000));
        }
        assert!(doc.validate().is_err());

        // Only the in-transition remains after clearing the out side
        if let Some(Item::Clip(b)) = doc.tracks[0].items.get_mut(1) {
            b.transition_in = Some(Transition::blend("crossDissolve", 1_000_000));
        }
        assert!(doc.validate().is_ok());

        // A clip swallowed whole is never a transition overlap
        doc.tracks[0].items[1].timeline_range_mut().start_us = 2_000_000;
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_source_out_of_bounds() {
        let mut doc = create_test_document();
        if let Some(clip) = doc.tracks[0].items[1].as_clip_mut() {
            clip.source_range = TimeRange::new(6_000_000, 4_000_000);
        }

        assert!(matches!(doc.validate(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_fps() {
        let doc = TimelineDocument::empty("Main", 0.5);
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_document_serialization() {
        let mut doc = create_test_document();
        doc.metadata.markers.push(Marker::new("m1", 1_000, "Intro"));
        doc.metadata
            .extra
            .insert("author".to_string(), serde_json::json!("someone"));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["tracks"][0]["items"][0]["kind"], "clip");
        assert_eq!(json["metadata"]["author"], "someone");
        assert_eq!(json["metadata"]["markers"][0]["timeUs"], 1_000);

        let parsed: TimelineDocument = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_clip_deserializes_with_defaults() {
        let json = serde_json::json!({
            "kind": "clip",
            "id": "c",
            "timelineRange": { "startUs": 0, "durationUs": 100 }
        });
        let item: Item = serde_json::from_value(json).unwrap();
        let clip = item.as_clip().unwrap();

        assert_eq!(clip.clip_type, ClipType::Media);
        assert_eq!(clip.opacity, 1.0);
        assert_eq!(clip.audio_gain, 1.0);
        assert!(clip.effects.is_empty());
    }
}
