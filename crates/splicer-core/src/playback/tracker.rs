//! Active Clip Tracker
//!
//! Sweep over a start-sorted clip slice. Forward playback advances a cursor
//! and only looks at clips it has not seen yet; seeking backward rebuilds the
//! active set with a binary search.

use tracing::trace;

use super::TimedSpan;
use crate::TimeUs;

/// Result of one `update`
#[derive(Debug)]
pub struct ActiveUpdate<'a, C> {
    /// Active clips in slice order
    pub active: Vec<&'a C>,
    /// True if the active set differs from the previous call
    pub changed: bool,
}

/// Tracks which clips are active at the playhead
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveClipTracker {
    /// Index of the first clip not yet reached by the forward sweep
    cursor: usize,
    /// Indices of active clips, ascending
    active: Vec<usize>,
}

impl ActiveClipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all state. Call after the clip list changes structurally.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.active.clear();
    }

    /// Number of currently active clips
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Moves the playhead from `last_time_us` to `time_us`.
    ///
    /// `clips` must be sorted by start. `on_deactivate` is called once for
    /// every clip that leaves the active set.
    pub fn update<'a, C, F>(
        &mut self,
        clips: &'a [C],
        time_us: TimeUs,
        last_time_us: TimeUs,
        mut on_deactivate: F,
    ) -> ActiveUpdate<'a, C>
    where
        C: TimedSpan,
        F: FnMut(&C),
    {
        let previous = self.active.clone();
        let in_bounds = self.cursor <= clips.len() && self.active.iter().all(|&i| i < clips.len());

        if time_us >= last_time_us && in_bounds {
            self.sweep_forward(clips, time_us);
        } else {
            self.rebuild(clips, time_us);
        }

        for &idx in &previous {
            if !self.active.contains(&idx) {
                if let Some(clip) = clips.get(idx) {
                    on_deactivate(clip);
                }
            }
        }

        let changed = previous != self.active;
        if changed {
            trace!(
                "Active clips at {}us: {} (was {})",
                time_us,
                self.active.len(),
                previous.len()
            );
        }

        ActiveUpdate {
            active: self.active.iter().filter_map(|&i| clips.get(i)).collect(),
            changed,
        }
    }

    fn sweep_forward<C: TimedSpan>(&mut self, clips: &[C], time_us: TimeUs) {
        while let Some(clip) = clips.get(self.cursor) {
            if clip.start_us() > time_us {
                break;
            }
            // Clips that ended before the playhead got here never become active
            if time_us < clip.end_us() {
                self.active.push(self.cursor);
            }
            self.cursor += 1;
        }

        self.active.retain(|&i| time_us < clips[i].end_us());
    }

    fn rebuild<C: TimedSpan>(&mut self, clips: &[C], time_us: TimeUs) {
        let boundary = clips.partition_point(|c| c.start_us() <= time_us);
        self.active = (0..boundary)
            .filter(|&i| clips[i].is_active_at(time_us))
            .collect();
        self.cursor = boundary;
    }
}
