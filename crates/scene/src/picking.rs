use foundation::ids::ObjectId;
use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{GeoPoint, Vec2, Vec3, surface_to_lat_lng};

use crate::camera::{Camera, Viewport};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PickShape {
    Sphere { center: Vec3, radius: f64 },
    Aabb { min: Vec3, max: Vec3 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickTarget {
    pub id: ObjectId,
    pub shape: PickShape,
}

impl PickTarget {
    pub fn sphere(id: ObjectId, center: Vec3, radius: f64) -> Self {
        Self {
            id,
            shape: PickShape::Sphere { center, radius },
        }
    }
}

/// One priority level of the hit-test pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickGroup {
    pub name: String,
    pub targets: Vec<PickTarget>,
}

impl PickGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targets: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// First hit along the ray.
    ///
    /// Ordering contract: the nearest entry distance wins; equal distances keep
    /// traversal order (earlier target wins). No other z-sorting is applied.
    pub fn raycast(&self, ray: Ray) -> Option<(f64, &PickTarget)> {
        let mut best: Option<(f64, &PickTarget)> = None;
        for target in &self.targets {
            let Some(t) = ray_shape_hit_t(ray, target.shape) else {
                continue;
            };
            best = match best {
                Some((bt, _)) if !stable_total_cmp_f64(t, bt).is_lt() => best,
                _ => Some((t, target)),
            };
        }
        best
    }
}

/// Background globe surface, tested after every model group.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlobeSurface {
    pub center: Vec3,
    pub radius: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitResult {
    pub object: Option<ObjectId>,
    pub surface: Option<GeoPoint>,
    pub point: Option<Vec3>,
}

impl HitResult {
    pub fn miss() -> Self {
        Self::default()
    }

    pub fn is_miss(&self) -> bool {
        self.object.is_none() && self.surface.is_none()
    }
}

/// What the interaction layer needs from the scene: "what is under this pixel".
pub trait HitTester {
    fn hit_test(&self, pointer_px: Vec2) -> HitResult;
}

/// Priority-ordered hit testing: model groups first (in push order), then the
/// globe surface.
#[derive(Debug, Clone)]
pub struct HitTestPipeline {
    camera: Camera,
    viewport: Viewport,
    groups: Vec<PickGroup>,
    globe: Option<GlobeSurface>,
}

impl HitTestPipeline {
    pub fn new(camera: Camera, viewport: Viewport) -> Self {
        Self {
            camera,
            viewport,
            groups: Vec::new(),
            globe: None,
        }
    }

    pub fn with_globe(mut self, globe: GlobeSurface) -> Self {
        self.globe = Some(globe);
        self
    }

    pub fn push_group(&mut self, group: PickGroup) {
        self.groups.push(group);
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn clear_groups(&mut self) {
        self.groups.clear();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn hit_test_ray(&self, ray: Ray) -> HitResult {
        for group in &self.groups {
            if let Some((t, target)) = group.raycast(ray) {
                return HitResult {
                    object: Some(target.id.clone()),
                    surface: None,
                    point: Some(ray.at(t)),
                };
            }
        }

        let Some(globe) = self.globe else {
            return HitResult::miss();
        };
        let Some(t) = ray_sphere_hit_t(ray, globe.center, globe.radius) else {
            return HitResult::miss();
        };
        let point = ray.at(t);
        match surface_to_lat_lng(point - globe.center) {
            Some(geo) => HitResult {
                object: None,
                surface: Some(geo),
                point: Some(point),
            },
            None => HitResult::miss(),
        }
    }
}

impl HitTester for HitTestPipeline {
    fn hit_test(&self, pointer_px: Vec2) -> HitResult {
        let ndc = self.viewport.to_ndc(pointer_px);
        match self.camera.ray_from_ndc(ndc) {
            Some(ray) => self.hit_test_ray(ray),
            None => HitResult::miss(),
        }
    }
}

fn ray_shape_hit_t(ray: Ray, shape: PickShape) -> Option<f64> {
    match shape {
        PickShape::Sphere { center, radius } => ray_sphere_hit_t(ray, center, radius),
        PickShape::Aabb { min, max } => ray_aabb_hit_t(ray, min, max),
    }
}

/// Entry distance along a unit-direction ray, or the exit distance when the
/// origin is inside the sphere.
fn ray_sphere_hit_t(ray: Ray, center: Vec3, radius: f64) -> Option<f64> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 || !disc.is_finite() {
        return None;
    }
    let sq = disc.sqrt();
    let t0 = -b - sq;
    let t1 = -b + sq;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

fn ray_aabb_hit_t(ray: Ray, min: Vec3, max: Vec3) -> Option<f64> {
    let origin = [ray.origin.x, ray.origin.y, ray.origin.z];
    let dir = [ray.dir.x, ray.dir.y, ray.dir.z];
    let lo = [min.x, min.y, min.z];
    let hi = [max.x, max.y, max.z];

    let mut t_min = 0.0f64;
    let mut t_max = f64::INFINITY;

    // Slabs intersection; returns entry distance.
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];

        if d.abs() < 1e-12 {
            if o < lo[axis] || o > hi[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (lo[axis] - o) * inv;
        let mut t2 = (hi[axis] - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_max < t_min {
            return None;
        }
    }

    Some(t_min)
}
