use foundation::math::{GeoPoint, lat_lng_to_surface};
use scene::backend::SceneBackend;
use scene::object::{Geometry, Material, Mesh, ObjectHandle, SceneObject, Subtree};
use tracing::debug;

const INDICATOR_NAME: &str = "surface-hover";

/// Ring marker following the globe hover position.
///
/// Lives in the `Interaction` subtree; at most one instance is attached.
#[derive(Debug)]
pub struct SurfaceIndicator {
    globe_radius: f64,
    ring_radius: f64,
    handle: Option<ObjectHandle>,
    position: Option<GeoPoint>,
}

impl SurfaceIndicator {
    pub fn new(globe_radius: f64) -> Self {
        Self {
            globe_radius,
            ring_radius: globe_radius * 0.015,
            handle: None,
            position: None,
        }
    }

    pub fn position(&self) -> Option<GeoPoint> {
        self.position
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Moves the indicator to `geo`, or removes it on `None`.
    pub fn update(&mut self, backend: &mut dyn SceneBackend, geo: Option<GeoPoint>) {
        if self.position == geo {
            return;
        }
        self.detach(backend);
        self.position = geo;
        if let Some(geo) = geo {
            let object = self.build(geo);
            self.handle = Some(backend.add(Subtree::Interaction, &object));
        }
    }

    pub fn clear(&mut self, backend: &mut dyn SceneBackend) {
        self.detach(backend);
        self.position = None;
    }

    fn detach(&mut self, backend: &mut dyn SceneBackend) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(err) = backend.remove(handle) {
            debug!(%err, "surface indicator already gone");
        }
    }

    fn build(&self, geo: GeoPoint) -> SceneObject {
        let mut object = SceneObject::new(INDICATOR_NAME);
        object.push(Mesh::new(
            Geometry::Ring {
                inner_radius: self.ring_radius * 0.6,
                outer_radius: self.ring_radius,
            },
            Material::translucent([0.3, 0.9, 1.0], 0.8),
            lat_lng_to_surface(geo, self.globe_radius * 1.002),
        ));
        object
    }
}
