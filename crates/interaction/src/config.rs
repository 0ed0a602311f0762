use runtime::throttle::ThrottleIntervals;
use serde::{Deserialize, Serialize};

/// Tunables for click/drag disambiguation and input throttling.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel (px) while pressed beyond which the gesture is a drag.
    pub drag_threshold_px: f64,
    /// A press released within this window (and under the threshold) is a click.
    pub click_time_window_ms: u64,
    /// Minimum interval between interaction state publications.
    pub commit_interval_ms: u64,
    /// Minimum interval between hover hit tests.
    pub hover_interval_ms: u64,
    /// Minimum interval between drag samples (~60Hz).
    pub drag_sample_interval_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 5.0,
            click_time_window_ms: 300,
            commit_interval_ms: 100,
            hover_interval_ms: 50,
            drag_sample_interval_ms: 16,
        }
    }
}

impl InteractionConfig {
    pub fn throttle_intervals(&self) -> ThrottleIntervals {
        ThrottleIntervals {
            commit_ms: self.commit_interval_ms,
            hover_ms: self.hover_interval_ms,
            drag_sample_ms: self.drag_sample_interval_ms,
        }
    }
}
