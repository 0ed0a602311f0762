//! Globe surface placement.
//!
//! The scene globe is a sphere centered at the origin with `+Y` pointing at the
//! north pole. Placement is spherical (not WGS84): overlays are positioned on a
//! unit-scaled sphere whose radius is chosen by the host scene.

use super::Vec3;

/// Default scene radius of the globe mesh, in scene units.
pub const GLOBE_RADIUS: f64 = 100.0;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lng_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lng_deg: f64) -> Self {
        Self { lat_deg, lng_deg }
    }

    /// `true` for finite latitude in `[-90, 90]` and finite longitude in `[-180, 180]`.
    pub fn is_valid(self) -> bool {
        self.lat_deg.is_finite()
            && self.lng_deg.is_finite()
            && (-90.0..=90.0).contains(&self.lat_deg)
            && (-180.0..=180.0).contains(&self.lng_deg)
    }
}

/// Forward placement: lat/lng (degrees) to a point at `radius` from the globe center.
pub fn lat_lng_to_surface(geo: GeoPoint, radius: f64) -> Vec3 {
    let phi = (90.0 - geo.lat_deg).to_radians();
    let theta = geo.lng_deg.to_radians();

    let sin_phi = phi.sin();
    Vec3::new(
        -radius * sin_phi * theta.cos(),
        radius * phi.cos(),
        radius * sin_phi * theta.sin(),
    )
}

/// Inverse placement: a point on (or near) the sphere back to lat/lng.
///
/// Returns `None` when the result is not a valid coordinate (zero radius,
/// non-finite input). Callers treat that as a miss.
pub fn surface_to_lat_lng(point: Vec3) -> Option<GeoPoint> {
    let r = point.length();
    if !(r.is_finite() && r > 0.0) {
        return None;
    }

    // Tolerate rounding just outside [-1, 1]; anything further is garbage.
    let cos_phi = point.y / r;
    if cos_phi.abs() > 1.0 + 1e-9 {
        return None;
    }
    let cos_phi = cos_phi.clamp(-1.0, 1.0);

    let lat = 90.0 - cos_phi.acos().to_degrees();
    let lng = (270.0 + point.x.atan2(point.z).to_degrees()).rem_euclid(360.0) - 180.0;

    let geo = GeoPoint::new(lat, lng);
    geo.is_valid().then_some(geo)
}
