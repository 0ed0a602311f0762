use foundation::math::precision::canonical_f64;

use crate::payload::{Boundary, GeoMarker, LatLng, OverlayPayload, ThreatIndicator};

/// Hex characters kept from the blake3 digest.
pub const CHECKSUM_LEN: usize = 16;

/// Fingerprint of everything in `payload` that changes geometry or material.
///
/// Labels and timestamps are left out, so a refresh that only bumps them
/// hashes equal and the registry skips the rebuild. `-0.0`/`0.0` and NaN
/// payloads hash canonically.
pub fn payload_checksum(payload: &OverlayPayload) -> String {
    let mut h = Fingerprint::new();
    h.str(payload.kind());
    h.u64(payload.len() as u64);
    match payload {
        OverlayPayload::Markers(markers) => markers.iter().for_each(|m| h.marker(m)),
        OverlayPayload::Boundaries(boundaries) => boundaries.iter().for_each(|b| h.boundary(b)),
        OverlayPayload::Threats(threats) => threats.iter().for_each(|t| h.threat(t)),
    }
    h.finish()
}

struct Fingerprint(blake3::Hasher);

impl Fingerprint {
    fn new() -> Self {
        Self(blake3::Hasher::new())
    }

    fn u64(&mut self, v: u64) {
        self.0.update(&v.to_le_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.0.update(&canonical_f64(v).to_bits().to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.f64(f64::from(v));
    }

    // Length-prefixed so adjacent strings cannot alias.
    fn str(&mut self, s: &str) {
        self.u64(s.len() as u64);
        self.0.update(s.as_bytes());
    }

    fn lat_lng(&mut self, p: LatLng) {
        self.f64(p.lat);
        self.f64(p.lng);
    }

    fn marker(&mut self, m: &GeoMarker) {
        self.str(&m.id);
        self.lat_lng(m.position);
        self.str(&m.category);
    }

    fn boundary(&mut self, b: &Boundary) {
        self.str(&b.id);
        self.u64(u64::from(b.closed));
        match b.color {
            Some(c) => {
                self.u64(1);
                c.iter().for_each(|v| self.f32(*v));
            }
            None => self.u64(0),
        }
        self.u64(b.points.len() as u64);
        b.points.iter().for_each(|p| self.lat_lng(*p));
    }

    fn threat(&mut self, t: &ThreatIndicator) {
        self.str(&t.id);
        self.lat_lng(t.source);
        self.lat_lng(t.target);
        self.str(t.severity.as_str());
    }

    fn finish(self) -> String {
        let hex = self.0.finalize().to_hex();
        hex.as_str()[..CHECKSUM_LEN].to_string()
    }
}
