use foundation::ids::ObjectId;
use foundation::math::Vec3;

/// RGBA color, linear, `0.0..=1.0`.
pub type Rgba = [f32; 4];

/// Disjoint named subtrees of the scene root.
///
/// The overlay registry only touches `Overlays`; the interaction layer only
/// touches `Interaction`. Neither can collide with the other's additions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subtree {
    Overlays,
    Interaction,
}

impl Subtree {
    pub fn name(self) -> &'static str {
        match self {
            Subtree::Overlays => "overlays",
            Subtree::Interaction => "interaction",
        }
    }
}

/// Backend-issued handle for an object attached to the scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere { radius: f64 },
    /// Flat annulus facing away from the globe center.
    Ring { inner_radius: f64, outer_radius: f64 },
    /// Line through world-space points.
    Polyline { points: Vec<Vec3>, closed: bool },
}

impl Geometry {
    /// Radius of a sphere around the mesh origin that contains the geometry.
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Geometry::Sphere { radius } => *radius,
            Geometry::Ring { outer_radius, .. } => *outer_radius,
            Geometry::Polyline { points, .. } => points
                .iter()
                .map(|p| p.length())
                .fold(0.0, f64::max),
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Sphere { .. } | Geometry::Ring { .. } => 1,
            Geometry::Polyline { points, .. } => points.len(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: Rgba,
    pub transparent: bool,
}

impl Material {
    pub fn opaque(color: [f32; 3]) -> Self {
        Self {
            color: [color[0], color[1], color[2], 1.0],
            transparent: false,
        }
    }

    pub fn translucent(color: [f32; 3], opacity: f32) -> Self {
        Self {
            color: [color[0], color[1], color[2], opacity.clamp(0.0, 1.0)],
            transparent: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Set for meshes the pointer can hover/click.
    pub pick_id: Option<ObjectId>,
    pub geometry: Geometry,
    pub material: Material,
    pub position: Vec3,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material, position: Vec3) -> Self {
        Self {
            pick_id: None,
            geometry,
            material,
            position,
        }
    }

    pub fn pickable(mut self, id: ObjectId) -> Self {
        self.pick_id = Some(id);
        self
    }
}

/// CPU-side description of a renderable group.
///
/// Builders produce these; the backend turns them into GPU resources on
/// `SceneBackend::add` and releases them on `SceneBackend::remove`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }

    pub fn push(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.vertex_count()).sum()
    }

    pub fn pickable_meshes(&self) -> impl Iterator<Item = (&ObjectId, &Mesh)> + '_ {
        self.meshes
            .iter()
            .filter_map(|m| m.pick_id.as_ref().map(|id| (id, m)))
    }
}
