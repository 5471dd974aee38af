//! Splicer Core Type Definitions
//!
//! Defines fundamental types used throughout the engine.
//! All times are integer microseconds so interval arithmetic stays exact.

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// ID Types
// =============================================================================

/// Document unique identifier
pub type DocumentId = String;

/// Track unique identifier
pub type TrackId = String;

/// Item (clip or gap) unique identifier
pub type ItemId = String;

/// Marker unique identifier
pub type MarkerId = String;

/// Effect unique identifier
pub type EffectId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in microseconds
pub type TimeUs = i64;

/// Microseconds per second
pub const US_PER_SEC: TimeUs = 1_000_000;

/// Converts seconds to microseconds, rounding to the nearest microsecond.
pub fn secs_to_us(secs: f64) -> TimeUs {
    (secs * US_PER_SEC as f64).round() as TimeUs
}

/// Converts microseconds to seconds.
pub fn us_to_secs(us: TimeUs) -> f64 {
    us as f64 / US_PER_SEC as f64
}

// =============================================================================
// Edge
// =============================================================================

/// One edge of a timed item.
///
/// `Start` is the head (where `transitionIn` lives), `End` is the tail
/// (where `transitionOut` lives).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Edge {
    Start,
    End,
}

impl Edge {
    /// Returns the opposite edge
    pub fn opposite(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Start,
        }
    }
}

// =============================================================================
// Time Range
// =============================================================================

/// Half-open time range `[start_us, start_us + duration_us)`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_us: TimeUs,
    pub duration_us: TimeUs,
}

impl TimeRange {
    pub fn new(start_us: TimeUs, duration_us: TimeUs) -> Self {
        if duration_us < 0 {
            warn!(
                "TimeRange created with negative duration ({}us), clamping to 0",
                duration_us
            );
            return Self {
                start_us,
                duration_us: 0,
            };
        }
        Self {
            start_us,
            duration_us,
        }
    }

    /// Creates a range from its two boundaries
    pub fn from_bounds(start_us: TimeUs, end_us: TimeUs) -> Self {
        Self::new(start_us, end_us - start_us)
    }

    /// Returns the exclusive end
    pub fn end_us(&self) -> TimeUs {
        self.start_us + self.duration_us
    }

    /// Checks if a time point is inside the half-open range
    pub fn contains(&self, time_us: TimeUs) -> bool {
        time_us >= self.start_us && time_us < self.end_us()
    }

    /// Checks if two ranges intersect. Touching ranges do not.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_us < other.end_us() && other.start_us < self.end_us()
    }

    /// Checks if `other` lies entirely within this range
    pub fn encloses(&self, other: &TimeRange) -> bool {
        self.start_us <= other.start_us && other.end_us() <= self.end_us()
    }

    /// Returns the same range moved to a new start
    pub fn with_start(self, start_us: TimeUs) -> Self {
        Self { start_us, ..self }
    }
}
