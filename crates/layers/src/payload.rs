use foundation::math::GeoPoint;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Wire form of a geographic position.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn to_geo(self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// A point of interest rendered as a pickable marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMarker {
    pub id: String,
    #[serde(flatten)]
    pub position: LatLng,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
}

/// A border or region outline, `[lat, lng]` vertices in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub id: String,
    pub points: Vec<LatLng>,
    #[serde(default = "default_closed")]
    pub closed: bool,
    #[serde(default)]
    pub color: Option<[f32; 3]>,
    #[serde(default)]
    pub updated_at_ms: Option<u64>,
}

fn default_closed() -> bool {
    true
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn color(self) -> [f32; 3] {
        match self {
            Severity::Low => [0.35, 0.8, 0.35],
            Severity::Medium => [0.95, 0.8, 0.2],
            Severity::High => [1.0, 0.5, 0.1],
            Severity::Critical => [1.0, 0.15, 0.15],
        }
    }
}

/// An attack or threat observed travelling from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatIndicator {
    pub id: String,
    pub source: LatLng,
    pub target: LatLng,
    pub severity: Severity,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub detected_at_ms: Option<u64>,
}

/// One fetch result for an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum OverlayPayload {
    Markers(Vec<GeoMarker>),
    Boundaries(Vec<Boundary>),
    Threats(Vec<ThreatIndicator>),
}

impl OverlayPayload {
    pub fn from_json(text: &str) -> Result<Self, FetchError> {
        serde_json::from_str(text).map_err(|e| FetchError::Parse(e.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OverlayPayload::Markers(_) => "markers",
            OverlayPayload::Boundaries(_) => "boundaries",
            OverlayPayload::Threats(_) => "threats",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OverlayPayload::Markers(v) => v.len(),
            OverlayPayload::Boundaries(v) => v.len(),
            OverlayPayload::Threats(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
