use foundation::ids::ObjectId;
use foundation::math::{Vec2, Vec3};
use scene::object::SceneObject;

use crate::payload::{GeoMarker, ThreatIndicator};

/// The record a pickable instance was built from, handed back to the host on
/// hover/click.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceRecord {
    Marker(GeoMarker),
    Threat(ThreatIndicator),
}

/// One pickable model inside an overlay's scene object.
///
/// Lives exactly as long as the build that produced it; a rebuild or removal of
/// the overlay drops every instance along with the object.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    pub id: ObjectId,
    /// Index into the owning `SceneObject::meshes`.
    pub mesh_index: usize,
    pub record: InstanceRecord,
    pub base_position: Vec3,
    pub pick_radius: f64,
    /// Viewport pixels, refreshed by `OverlayRegistry::update_screen_positions`.
    /// `None` until computed or while behind the camera.
    pub computed_screen_position: Option<Vec2>,
}

/// Output of a builder: the object to attach plus its pickable instances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltOverlay {
    pub object: SceneObject,
    pub instances: Vec<ModelInstance>,
}
