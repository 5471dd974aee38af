//! Transition Capacity
//!
//! How long a transition on one edge of a clip may be. A blend transition
//! overlaps the clip with its neighbour, so the neighbour must have enough
//! unused source material (handle) to cover the overlap.

use serde::{Deserialize, Serialize};

use crate::{
    timeline::{Clip, TimelineDocument, Track, Transition, TransitionMode},
    Edge, TimeUs,
};

/// Upper bounds for a transition duration on one clip edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCapacity {
    /// Clip duration minus what the opposite edge's transition reserves
    pub max_within_clip: TimeUs,
    /// Neighbour handle plus the already spent duration.
    /// `None` when no neighbour meets the edge, the neighbour has unlimited
    /// material, or the transition is not a blend.
    pub limit_by_handle: Option<TimeUs>,
}

impl TransitionCapacity {
    /// The effective maximum duration
    pub fn bound(&self) -> TimeUs {
        match self.limit_by_handle {
            Some(limit) => self.max_within_clip.min(limit),
            None => self.max_within_clip,
        }
    }
}

/// Finds the clip that meets `edge` of `clip` on `track`.
///
/// For `End` this is the earliest clip starting inside `(clip.start, clip.end]`;
/// for `Start` the latest-ending clip that ends inside `[clip.start, clip.end)`
/// and starts before the clip. Gaps are never neighbours.
pub fn find_neighbor<'a>(track: &'a Track, clip: &Clip, edge: Edge) -> Option<&'a Clip> {
    let others = track.clips().filter(|c| c.id != clip.id);
    match edge {
        Edge::End => others
            .filter(|c| c.start_us() > clip.start_us() && c.start_us() <= clip.end_us())
            .min_by(|a, b| {
                a.start_us()
                    .cmp(&b.start_us())
                    .then_with(|| a.id.cmp(&b.id))
            }),
        Edge::Start => others
            .filter(|c| {
                c.end_us() >= clip.start_us()
                    && c.end_us() < clip.end_us()
                    && c.start_us() < clip.start_us()
            })
            .max_by(|a, b| a.end_us().cmp(&b.end_us()).then_with(|| b.id.cmp(&a.id))),
    }
}

/// Capacity of `edge` of `clip`, given the duration already spent by the
/// edge's current transition and the mode of the transition being sized
pub(crate) fn compute_capacity(
    track: &Track,
    clip: &Clip,
    edge: Edge,
    spent_us: TimeUs,
    mode: TransitionMode,
) -> TransitionCapacity {
    let max_within_clip =
        (clip.duration_us() - clip.transition_duration_us(edge.opposite())).max(0);

    let limit_by_handle = if mode == TransitionMode::Blend {
        find_neighbor(track, clip, edge).and_then(|neighbor| {
            // An out-transition pulls the next clip's head back; an
            // in-transition extends the previous clip's tail.
            let handle = match edge {
                Edge::End => neighbor.head_handle_us(),
                Edge::Start => neighbor.tail_handle_us(),
            };
            handle.map(|h| h + spent_us.max(0))
        })
    } else {
        None
    };

    TransitionCapacity {
        max_within_clip,
        limit_by_handle,
    }
}

/// Capacity of a clip edge, or `None` for unknown ids and gaps.
///
/// `current_transition` is the transition being resized: its duration is
/// already spent and can always be kept, and its mode decides whether the
/// neighbour's handle applies (absent means a new blend transition).
pub fn transition_capacity(
    document: &TimelineDocument,
    track_id: &str,
    item_id: &str,
    edge: Edge,
    current_transition: Option<&Transition>,
) -> Option<TransitionCapacity> {
    let track = document.find_track(track_id)?;
    let clip = track.get_item(item_id)?.as_clip()?;

    let spent = current_transition.map_or(0, |t| t.duration_us);
    let mode = current_transition.map_or(TransitionMode::Blend, |t| t.mode);

    Some(compute_capacity(track, clip, edge, spent, mode))
}

/// Maximum legal duration for a transition on a clip edge
pub fn max_resizable_duration_us(
    document: &TimelineDocument,
    track_id: &str,
    item_id: &str,
    edge: Edge,
    current_transition: Option<&Transition>,
) -> Option<TimeUs> {
    transition_capacity(document, track_id, item_id, edge, current_transition)
        .map(|capacity| capacity.bound())
}
