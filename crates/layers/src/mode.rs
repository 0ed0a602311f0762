use serde::{Deserialize, Serialize};

pub const BOUNDARIES: &str = "boundaries";
pub const INTEL_REPORTS: &str = "intel_reports";
pub const THREATS: &str = "threats";
pub const ALERTS: &str = "alerts";

/// Top-level visualization mode; each one shows a fixed set of overlays.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationMode {
    GeoPolitical,
    CyberCommand,
    EcoNatural,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 3] = [
        VisualizationMode::GeoPolitical,
        VisualizationMode::CyberCommand,
        VisualizationMode::EcoNatural,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VisualizationMode::GeoPolitical => "geo_political",
            VisualizationMode::CyberCommand => "cyber_command",
            VisualizationMode::EcoNatural => "eco_natural",
        }
    }

    /// Overlays the mode requires, in add order.
    pub fn overlays(self) -> &'static [&'static str] {
        match self {
            VisualizationMode::GeoPolitical => &[BOUNDARIES, INTEL_REPORTS],
            VisualizationMode::CyberCommand => &[THREATS, INTEL_REPORTS],
            VisualizationMode::EcoNatural => &[ALERTS, BOUNDARIES],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VisualizationMode;

    #[test]
    fn every_mode_has_overlays_without_duplicates() {
        for mode in VisualizationMode::ALL {
            let names = mode.overlays();
            assert!(!names.is_empty(), "{}", mode.as_str());
            let mut sorted = names.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), names.len());
        }
    }

    #[test]
    fn deserializes_from_snake_case() {
        let mode: VisualizationMode = serde_json::from_str("\"cyber_command\"").unwrap();
        assert_eq!(mode, VisualizationMode::CyberCommand);
    }
}
