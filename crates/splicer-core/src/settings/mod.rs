//! Editor Settings
//!
//! Snapping and history options consumed by the interaction layer.
//! Parsing is tolerant: missing fields take defaults and out-of-range
//! values are corrected instead of rejected, so an old or hand-edited
//! settings file never blocks editing. The core never reads files itself;
//! callers hand in the JSON text.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::CoreResult;

/// Editor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    /// Snap distance in screen pixels
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance_px: u32,

    /// Snap to clip boundaries, markers and the playhead
    #[serde(default = "default_true")]
    pub clip_snap_enabled: bool,

    /// Snap to frame boundaries when no clip boundary is in reach
    #[serde(default = "default_true")]
    pub frame_snap_enabled: bool,

    /// Default timeline zoom level (1.0 = 100 pixels per second)
    #[serde(default = "default_zoom")]
    pub default_timeline_zoom: f64,

    /// Undo entries kept by an edit session
    #[serde(default = "default_max_history")]
    pub max_history_size: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            snap_tolerance_px: default_snap_tolerance(),
            clip_snap_enabled: true,
            frame_snap_enabled: true,
            default_timeline_zoom: default_zoom(),
            max_history_size: default_max_history(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_zoom() -> f64 {
    1.0
}

fn default_snap_tolerance() -> u32 {
    10
}

fn default_max_history() -> usize {
    100
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

impl EditorSettings {
    /// Parses settings JSON and normalizes the result
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.normalized())
    }

    /// Returns a copy with every value inside its valid range
    pub fn normalized(mut self) -> Self {
        let zoom = clamp_f64(self.default_timeline_zoom, 0.1, 10.0);
        if zoom != self.default_timeline_zoom {
            warn!(
                "defaultTimelineZoom {} out of range, using {}",
                self.default_timeline_zoom, zoom
            );
            self.default_timeline_zoom = zoom;
        }

        let tolerance = self.snap_tolerance_px.clamp(0, 200);
        if tolerance != self.snap_tolerance_px {
            warn!(
                "snapTolerancePx {} out of range, using {}",
                self.snap_tolerance_px, tolerance
            );
            self.snap_tolerance_px = tolerance;
        }

        let history = self.max_history_size.clamp(1, 10_000);
        if history != self.max_history_size {
            warn!(
                "maxHistorySize {} out of range, using {}",
                self.max_history_size, history
            );
            self.max_history_size = history;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EditorSettings::default();
        assert_eq!(settings.snap_tolerance_px, 10);
        assert!(settings.clip_snap_enabled);
        assert!(settings.frame_snap_enabled);
        assert_eq!(settings.default_timeline_zoom, 1.0);
        assert_eq!(settings.max_history_size, 100);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = EditorSettings::from_json_str(r#"{ "frameSnapEnabled": false }"#).unwrap();
        assert!(!settings.frame_snap_enabled);
        assert!(settings.clip_snap_enabled);
        assert_eq!(settings.snap_tolerance_px, 10);
    }

    #[test]
    fn test_normalization_clamps_values() {
        let settings = EditorSettings::from_json_str(
            r#"{ "snapTolerancePx": 5000, "defaultTimelineZoom": -3.0, "maxHistorySize": 0 }"#,
        )
        .unwrap();

        assert_eq!(settings.snap_tolerance_px, 200);
        assert_eq!(settings.default_timeline_zoom, 0.1);
        assert_eq!(settings.max_history_size, 1);
    }

    #[test]
    fn test_normalization_handles_nan_zoom() {
        let settings = EditorSettings {
            default_timeline_zoom: f64::NAN,
            ..Default::default()
        }
        .normalized();

        assert!(settings.default_timeline_zoom.is_finite());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(EditorSettings::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let settings = EditorSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("snapTolerancePx"));

        let parsed = EditorSettings::from_json_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }
}
