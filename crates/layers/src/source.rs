use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use streaming::PollOptions;
use tokio_util::sync::CancellationToken;

use crate::builders::build_payload;
use crate::checksum::payload_checksum;
use crate::error::{BuildError, FetchError};
use crate::instance::BuiltOverlay;
use crate::payload::OverlayPayload;

pub type FetchFuture =
    Pin<Box<dyn Future<Output = Result<OverlayPayload, FetchError>> + Send + 'static>>;

/// Refresh cadence of a periodic overlay, in milliseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSpec {
    pub interval_ms: u64,
    pub min_interval_ms: u64,
    pub jitter_ms: u64,
}

impl Default for PollSpec {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            min_interval_ms: 5_000,
            jitter_ms: 0,
        }
    }
}

impl PollSpec {
    pub fn every_ms(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            min_interval_ms: 0,
            jitter_ms: 0,
        }
    }

    pub fn with_jitter_ms(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    pub fn with_min_interval_ms(mut self, min_interval_ms: u64) -> Self {
        self.min_interval_ms = min_interval_ms;
        self
    }

    pub fn options(&self) -> PollOptions {
        PollOptions::every(Duration::from_millis(self.interval_ms))
            .min_interval(Duration::from_millis(self.min_interval_ms))
            .jitter(Duration::from_millis(self.jitter_ms))
    }
}

/// Everything the registry needs to know about one overlay.
///
/// New overlay kinds are added by registering another source; the registry
/// never dispatches on overlay names.
pub trait OverlaySource: Send + Sync {
    /// Starts one fetch. The future is polled on the runtime and should stop
    /// early once `cancel` fires.
    fn fetch(&self, cancel: CancellationToken) -> FetchFuture;

    fn checksum(&self, payload: &OverlayPayload) -> String {
        payload_checksum(payload)
    }

    fn build(&self, overlay: &str, payload: &OverlayPayload) -> Result<BuiltOverlay, BuildError> {
        build_payload(overlay, payload)
    }

    /// `None` loads once per add.
    fn poll(&self) -> Option<PollSpec> {
        None
    }
}

type FetchFn = dyn Fn(CancellationToken) -> FetchFuture + Send + Sync;

/// Closure-backed source using the built-in checksum and builders.
#[derive(Clone)]
pub struct OverlayDescriptor {
    fetch: Arc<FetchFn>,
    poll: Option<PollSpec>,
}

impl OverlayDescriptor {
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<OverlayPayload, FetchError>> + Send + 'static,
    {
        Self {
            fetch: Arc::new(move |cancel: CancellationToken| {
                Box::pin(fetch(cancel)) as FetchFuture
            }),
            poll: None,
        }
    }

    /// A source that always yields `payload`.
    pub fn fixed(payload: OverlayPayload) -> Self {
        Self::new(move |_cancel| std::future::ready(Ok::<_, FetchError>(payload.clone())))
    }

    pub fn polling(mut self, spec: PollSpec) -> Self {
        self.poll = Some(spec);
        self
    }
}

impl fmt::Debug for OverlayDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayDescriptor")
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl OverlaySource for OverlayDescriptor {
    fn fetch(&self, cancel: CancellationToken) -> FetchFuture {
        (self.fetch)(cancel)
    }

    fn poll(&self) -> Option<PollSpec> {
        self.poll
    }
}
