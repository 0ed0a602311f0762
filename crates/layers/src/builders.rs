//! Pure payload -> scene object builders.
//!
//! Builders never touch the backend. The registry attaches what they return
//! and owns its disposal.

use foundation::ids::ObjectId;
use foundation::math::{GLOBE_RADIUS, GeoPoint, Vec3, lat_lng_to_surface};
use scene::object::{Geometry, Material, Mesh, SceneObject};

use crate::error::BuildError;
use crate::instance::{BuiltOverlay, InstanceRecord, ModelInstance};
use crate::payload::{Boundary, GeoMarker, LatLng, OverlayPayload, ThreatIndicator};

pub const MARKER_RADIUS: f64 = 1.2;
/// Radius factors keeping overlays off the globe mesh.
pub const BOUNDARY_LIFT: f64 = 1.002;
pub const MARKER_LIFT: f64 = 1.01;
/// Arc apex height as a fraction of the radius, for antipodal endpoints.
pub const ARC_MAX_HEIGHT: f64 = 0.25;
pub const ARC_SEGMENTS: usize = 32;
/// Longest great-circle step between boundary vertices.
pub const BOUNDARY_STEP_DEG: f64 = 2.0;

const DEFAULT_BOUNDARY_COLOR: [f32; 3] = [0.9, 0.9, 0.6];

pub fn build_payload(overlay: &str, payload: &OverlayPayload) -> Result<BuiltOverlay, BuildError> {
    match payload {
        OverlayPayload::Markers(markers) => build_markers(overlay, markers),
        OverlayPayload::Boundaries(boundaries) => build_boundaries(overlay, boundaries),
        OverlayPayload::Threats(threats) => build_threats(overlay, threats),
    }
}

pub fn build_markers(overlay: &str, markers: &[GeoMarker]) -> Result<BuiltOverlay, BuildError> {
    let mut out = BuiltOverlay {
        object: SceneObject::new(overlay),
        instances: Vec::with_capacity(markers.len()),
    };
    for marker in markers {
        let geo = checked_geo(&marker.id, marker.position)?;
        let position = lat_lng_to_surface(geo, GLOBE_RADIUS * MARKER_LIFT);
        push_instance(
            &mut out,
            overlay,
            &marker.id,
            position,
            Material::opaque(category_color(&marker.category)),
            InstanceRecord::Marker(marker.clone()),
        );
    }
    Ok(out)
}

pub fn build_boundaries(
    overlay: &str,
    boundaries: &[Boundary],
) -> Result<BuiltOverlay, BuildError> {
    let mut object = SceneObject::new(overlay);
    for boundary in boundaries {
        if boundary.points.len() < 2 {
            return Err(BuildError::Degenerate {
                id: boundary.id.clone(),
                reason: "boundary needs at least two points",
            });
        }
        let geos = boundary
            .points
            .iter()
            .map(|p| checked_geo(&boundary.id, *p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut points = Vec::new();
        let mut legs: Vec<(GeoPoint, GeoPoint)> = geos.windows(2).map(|w| (w[0], w[1])).collect();
        if boundary.closed && geos.len() > 2 {
            legs.push((geos[geos.len() - 1], geos[0]));
        }
        for (i, (a, b)) in legs.into_iter().enumerate() {
            let leg = subdivide(&boundary.id, a, b, BOUNDARY_STEP_DEG)?;
            // Legs share endpoints.
            let skip = usize::from(i > 0);
            points.extend(leg.into_iter().skip(skip).map(|u| u * (GLOBE_RADIUS * BOUNDARY_LIFT)));
        }
        if boundary.closed && geos.len() > 2 {
            points.pop();
        }

        let color = boundary.color.unwrap_or(DEFAULT_BOUNDARY_COLOR);
        object.push(Mesh::new(
            Geometry::Polyline {
                points,
                closed: boundary.closed && geos.len() > 2,
            },
            Material::translucent(color, 0.85),
            Vec3::ZERO,
        ));
    }
    Ok(BuiltOverlay {
        object,
        instances: Vec::new(),
    })
}

/// Each threat becomes a lifted arc plus a pickable marker at its target.
pub fn build_threats(
    overlay: &str,
    threats: &[ThreatIndicator],
) -> Result<BuiltOverlay, BuildError> {
    let mut out = BuiltOverlay {
        object: SceneObject::new(overlay),
        instances: Vec::with_capacity(threats.len()),
    };
    for threat in threats {
        let source = checked_geo(&threat.id, threat.source)?;
        let target = checked_geo(&threat.id, threat.target)?;
        let color = threat.severity.color();

        let arc = lifted_arc(&threat.id, source, target)?;
        out.object.push(Mesh::new(
            Geometry::Polyline {
                points: arc,
                closed: false,
            },
            Material::translucent(color, 0.7),
            Vec3::ZERO,
        ));

        let position = lat_lng_to_surface(target, GLOBE_RADIUS * MARKER_LIFT);
        push_instance(
            &mut out,
            overlay,
            &threat.id,
            position,
            Material::opaque(color),
            InstanceRecord::Threat(threat.clone()),
        );
    }
    Ok(out)
}

fn push_instance(
    out: &mut BuiltOverlay,
    overlay: &str,
    record_id: &str,
    position: Vec3,
    material: Material,
    record: InstanceRecord,
) {
    let id = ObjectId::scoped(overlay, record_id);
    out.instances.push(ModelInstance {
        id: id.clone(),
        mesh_index: out.object.mesh_count(),
        record,
        base_position: position,
        pick_radius: MARKER_RADIUS,
        computed_screen_position: None,
    });
    out.object.push(
        Mesh::new(Geometry::Sphere { radius: MARKER_RADIUS }, material, position).pickable(id),
    );
}

fn checked_geo(id: &str, p: LatLng) -> Result<GeoPoint, BuildError> {
    let geo = p.to_geo();
    if geo.is_valid() {
        Ok(geo)
    } else {
        Err(BuildError::InvalidCoordinate {
            id: id.to_string(),
            lat: p.lat,
            lng: p.lng,
        })
    }
}

fn category_color(category: &str) -> [f32; 3] {
    match category {
        "alert" | "incident" => [1.0, 0.3, 0.25],
        "intel" => [0.3, 0.85, 1.0],
        "environment" => [0.35, 0.85, 0.4],
        _ => [0.95, 0.95, 0.95],
    }
}

/// Unit vectors along the great circle from `a` to `b`, endpoints included,
/// no step longer than `max_step_deg`.
fn subdivide(
    id: &str,
    a: GeoPoint,
    b: GeoPoint,
    max_step_deg: f64,
) -> Result<Vec<Vec3>, BuildError> {
    let ua = lat_lng_to_surface(a, 1.0);
    let ub = lat_lng_to_surface(b, 1.0);
    let omega = ua.dot(ub).clamp(-1.0, 1.0).acos();
    // Tolerance keeps an exact multiple of the step from gaining a leg.
    let steps = ((omega.to_degrees() / max_step_deg - 1e-9).ceil() as usize).max(1);
    (0..=steps)
        .map(|i| slerp(id, ua, ub, omega, i as f64 / steps as f64))
        .collect()
}

fn lifted_arc(id: &str, a: GeoPoint, b: GeoPoint) -> Result<Vec<Vec3>, BuildError> {
    let ua = lat_lng_to_surface(a, 1.0);
    let ub = lat_lng_to_surface(b, 1.0);
    let omega = ua.dot(ub).clamp(-1.0, 1.0).acos();
    let height = ARC_MAX_HEIGHT * omega / std::f64::consts::PI;
    (0..=ARC_SEGMENTS)
        .map(|i| {
            let t = i as f64 / ARC_SEGMENTS as f64;
            let lift = MARKER_LIFT + height * (std::f64::consts::PI * t).sin();
            slerp(id, ua, ub, omega, t).map(|u| u * (GLOBE_RADIUS * lift))
        })
        .collect()
}

fn slerp(id: &str, a: Vec3, b: Vec3, omega: f64, t: f64) -> Result<Vec3, BuildError> {
    if omega < 1e-9 {
        return Ok(a);
    }
    let s = omega.sin();
    if s < 1e-9 {
        return Err(BuildError::Degenerate {
            id: id.to_string(),
            reason: "antipodal endpoints have no unique great circle",
        });
    }
    Ok(a * (((1.0 - t) * omega).sin() / s) + b * ((t * omega).sin() / s))
}
