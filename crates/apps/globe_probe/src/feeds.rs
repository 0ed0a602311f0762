//! Synthetic overlay feeds standing in for the network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use layers::mode::{ALERTS, BOUNDARIES, INTEL_REPORTS, THREATS};
use layers::{
    Boundary, FetchError, GeoMarker, LatLng, OverlayDescriptor, OverlayPayload, OverlayRegistry,
    Severity, ThreatIndicator,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::config::ProbeConfig;

const CITIES: [(&str, f64, f64); 8] = [
    ("london", 51.5, -0.13),
    ("new-york", 40.71, -74.0),
    ("tokyo", 35.68, 139.69),
    ("sao-paulo", -23.55, -46.63),
    ("lagos", 6.52, 3.38),
    ("sydney", -33.87, 151.21),
    ("moscow", 55.76, 37.62),
    ("mumbai", 19.08, 72.88),
];

type Generator = dyn Fn(&mut StdRng, u64) -> OverlayPayload + Send + Sync;

/// Registers one synthetic source per overlay name any mode can ask for.
pub fn register_all(registry: &mut OverlayRegistry, config: &ProbeConfig) {
    let feeds: [(&str, Arc<Generator>); 4] = [
        (BOUNDARIES, Arc::new(boundaries)),
        (INTEL_REPORTS, Arc::new(intel_reports)),
        (THREATS, Arc::new(threats)),
        (ALERTS, Arc::new(alerts)),
    ];
    for (i, (name, generate)) in feeds.into_iter().enumerate() {
        let rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
        let descriptor = synthetic(rng, config.latency_ms, generate);
        let descriptor = match config.polling.get(name) {
            Some(spec) => descriptor.polling(*spec),
            None => descriptor,
        };
        registry.register_source(name, descriptor);
    }
}

fn synthetic(rng: StdRng, latency_ms: u64, generate: Arc<Generator>) -> OverlayDescriptor {
    let state = Arc::new(Mutex::new((rng, 0u64)));
    OverlayDescriptor::new(move |cancel: CancellationToken| {
        let state = Arc::clone(&state);
        let generate = Arc::clone(&generate);
        async move {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(latency_ms)) => {}
            }
            let mut guard = state
                .lock()
                .map_err(|_| FetchError::Failed("feed state poisoned".to_string()))?;
            let (rng, calls) = &mut *guard;
            *calls += 1;
            // Roughly one refresh in ten fails, like a flaky upstream.
            if *calls > 1 && rng.gen_bool(0.1) {
                return Err(FetchError::Failed("upstream returned 503".to_string()));
            }
            Ok(generate(rng, *calls))
        }
    })
}

fn boundaries(_rng: &mut StdRng, _call: u64) -> OverlayPayload {
    let ring = |id: &str, pts: &[(f64, f64)]| Boundary {
        id: id.to_string(),
        points: pts.iter().map(|(lat, lng)| LatLng::new(*lat, *lng)).collect(),
        closed: true,
        color: None,
        updated_at_ms: None,
    };
    OverlayPayload::Boundaries(vec![
        ring("iberia", &[(43.8, -9.3), (43.4, 3.3), (36.0, -5.6), (37.0, -9.0)]),
        ring(
            "australia",
            &[
                (-11.0, 142.5),
                (-28.6, 153.6),
                (-38.5, 146.0),
                (-35.0, 117.9),
                (-22.0, 113.7),
            ],
        ),
    ])
}

fn intel_reports(_rng: &mut StdRng, _call: u64) -> OverlayPayload {
    OverlayPayload::Markers(
        CITIES
            .iter()
            .map(|(id, lat, lng)| GeoMarker {
                id: (*id).to_string(),
                position: LatLng::new(*lat, *lng),
                label: format!("report from {id}"),
                category: "intel".to_string(),
                timestamp_ms: None,
            })
            .collect(),
    )
}

/// A few attacks between random cities; the set changes most refreshes.
fn threats(rng: &mut StdRng, call: u64) -> OverlayPayload {
    let count = rng.gen_range(2..=4);
    let records = (0..count)
        .map(|i| {
            let (src, slat, slng) = CITIES[rng.gen_range(0..CITIES.len())];
            let (dst, dlat, dlng) = CITIES[rng.gen_range(0..CITIES.len())];
            let severity = match rng.gen_range(0..4) {
                0 => Severity::Low,
                1 => Severity::Medium,
                2 => Severity::High,
                _ => Severity::Critical,
            };
            ThreatIndicator {
                id: format!("{src}-{dst}-{i}"),
                source: LatLng::new(slat, slng),
                target: LatLng::new(dlat, dlng),
                severity,
                kind: "intrusion".to_string(),
                detected_at_ms: Some(call * 1_000),
            }
        })
        .collect();
    OverlayPayload::Threats(records)
}

/// Stable alert set whose timestamps move every call: exercises the
/// unchanged-checksum path.
fn alerts(_rng: &mut StdRng, call: u64) -> OverlayPayload {
    OverlayPayload::Markers(vec![
        GeoMarker {
            id: "quake-honshu".to_string(),
            position: LatLng::new(36.2, 140.1),
            label: "M6.1".to_string(),
            category: "alert".to_string(),
            timestamp_ms: Some(call * 1_000),
        },
        GeoMarker {
            id: "flood-bangladesh".to_string(),
            position: LatLng::new(23.7, 90.4),
            label: "river flooding".to_string(),
            category: "environment".to_string(),
            timestamp_ms: Some(call * 1_000),
        },
    ])
}
