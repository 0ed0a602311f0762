/// Failure of a single refresh. The poller keeps running and retries on its
/// next tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("fetch failed: {0}")]
    Failed(String),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("fetch cancelled")]
    Cancelled,
}

/// A payload that cannot become geometry. The previous build stays live.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("record {id}: invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { id: String, lat: f64, lng: f64 },
    #[error("record {id}: {reason}")]
    Degenerate { id: String, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no source registered for overlay {0:?}")]
    UnknownOverlay(String),
}
