use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use interaction::InteractionConfig;
use layers::{PollSpec, VisualizationMode};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub mode: VisualizationMode,
    pub duration_ms: u64,
    pub tick_ms: u64,
    pub seed: u64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub camera_distance: f64,
    /// Simulated fetch latency for every feed.
    pub latency_ms: u64,
    pub interaction: InteractionConfig,
    /// Per-overlay poll cadence; overlays not listed load once.
    pub polling: BTreeMap<String, PollSpec>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let mut polling = BTreeMap::new();
        polling.insert(
            layers::mode::THREATS.to_string(),
            PollSpec::every_ms(2_000).with_jitter_ms(250),
        );
        polling.insert(layers::mode::ALERTS.to_string(), PollSpec::every_ms(3_000));
        polling.insert(layers::mode::INTEL_REPORTS.to_string(), PollSpec::every_ms(5_000));
        Self {
            mode: VisualizationMode::CyberCommand,
            duration_ms: 10_000,
            tick_ms: 16,
            seed: 7,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            camera_distance: 300.0,
            latency_ms: 120,
            interaction: InteractionConfig::default(),
            polling,
        }
    }
}

impl ProbeConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Overrides from `GLOBE_PROBE_*` variables; unparsable values are ignored.
    pub fn apply_env(&mut self) {
        if let Some(mode) = env::var("GLOBE_PROBE_MODE").ok().and_then(|v| parse_mode(&v)) {
            self.mode = mode;
        }
        self.duration_ms = env_var_u64("GLOBE_PROBE_DURATION_MS", self.duration_ms);
        self.seed = env_var_u64("GLOBE_PROBE_SEED", self.seed);
        self.latency_ms = env_var_u64("GLOBE_PROBE_LATENCY_MS", self.latency_ms);
    }
}

pub fn parse_mode(value: &str) -> Option<VisualizationMode> {
    let wanted = value.trim().to_ascii_lowercase().replace('-', "_");
    VisualizationMode::ALL.into_iter().find(|m| m.as_str() == wanted)
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
