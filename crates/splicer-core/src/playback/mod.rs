//! Playback Support
//!
//! Works out which clips are active while the playhead moves. The tracker
//! holds no reference to the document: callers pass a start-sorted slice on
//! every call and `reset` it after structural edits.

mod tracker;

pub use tracker::*;

use serde::{Deserialize, Serialize};

use crate::{
    timeline::{Clip, Item, TimelineDocument},
    ItemId, TimeUs, TrackId,
};

/// Anything with a half-open `[start, end)` extent on the timeline
pub trait TimedSpan {
    fn start_us(&self) -> TimeUs;
    fn end_us(&self) -> TimeUs;

    /// Half-open containment
    fn is_active_at(&self, time_us: TimeUs) -> bool {
        self.start_us() <= time_us && time_us < self.end_us()
    }
}

impl TimedSpan for Clip {
    fn start_us(&self) -> TimeUs {
        self.timeline_range.start_us
    }

    fn end_us(&self) -> TimeUs {
        self.timeline_range.end_us()
    }
}

impl TimedSpan for Item {
    fn start_us(&self) -> TimeUs {
        self.timeline_range().start_us
    }

    fn end_us(&self) -> TimeUs {
        self.timeline_range().end_us()
    }
}

/// A clip flattened out of its track for playback scheduling
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSpan {
    pub track_id: TrackId,
    pub item_id: ItemId,
    pub start_us: TimeUs,
    pub end_us: TimeUs,
}

impl TimedSpan for PlaybackSpan {
    fn start_us(&self) -> TimeUs {
        self.start_us
    }

    fn end_us(&self) -> TimeUs {
        self.end_us
    }
}

impl PlaybackSpan {
    /// Spans of every enabled clip in the document, sorted by start.
    /// Ties keep track order, then item id.
    pub fn from_document(document: &TimelineDocument) -> Vec<Self> {
        let mut spans: Vec<(usize, Self)> = document
            .tracks
            .iter()
            .enumerate()
            .flat_map(|(track_idx, track)| {
                track
                    .clips()
                    .filter(|c| !c.disabled)
                    .map(move |c| {
                        (
                            track_idx,
                            Self {
                                track_id: track.id.clone(),
                                item_id: c.id.clone(),
                                start_us: c.timeline_range.start_us,
                                end_us: c.timeline_range.end_us(),
                            },
                        )
                    })
            })
            .collect();

        spans.sort_by(|(ta, a), (tb, b)| {
            a.start_us
                .cmp(&b.start_us)
                .then_with(|| ta.cmp(tb))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        spans.into_iter().map(|(_, span)| span).collect()
    }
}

/// Brute-force active set: every span containing `time_us`, in slice order
pub fn active_at<C: TimedSpan>(clips: &[C], time_us: TimeUs) -> Vec<&C> {
    clips.iter().filter(|c| c.is_active_at(time_us)).collect()
}
