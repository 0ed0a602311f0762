use foundation::math::{GeoPoint, Vec2, Vec3, lat_lng_to_surface};

use crate::picking::Ray;

/// Canvas size in CSS pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Pixel position (origin top-left, +y down) to normalized device coordinates.
    pub fn to_ndc(&self, px: Vec2) -> Vec2 {
        Vec2::new(
            (px.x / self.width) * 2.0 - 1.0,
            1.0 - (px.y / self.height) * 2.0,
        )
    }

    pub fn from_ndc(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

/// Right-handed perspective camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub aspect: f64,
}

struct Basis {
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, fov_y_rad: f64, aspect: f64) -> Self {
        Self {
            eye,
            target,
            up: Vec3::new(0.0, 1.0, 0.0),
            fov_y_rad,
            aspect,
        }
    }

    /// Camera looking at the globe center from above `geo`, `distance` from the center.
    pub fn orbiting(geo: GeoPoint, distance: f64, fov_y_rad: f64, aspect: f64) -> Self {
        Self::new(
            lat_lng_to_surface(geo, distance),
            Vec3::ZERO,
            fov_y_rad,
            aspect,
        )
    }

    fn basis(&self) -> Option<Basis> {
        let forward = (self.target - self.eye).normalized()?;
        let right = forward.cross(self.up).normalized().or_else(|| {
            // Looking straight along `up`: fall back to a fixed horizontal axis.
            forward.cross(Vec3::new(0.0, 0.0, -1.0)).normalized()
        })?;
        let up = right.cross(forward);
        Some(Basis { forward, right, up })
    }

    /// World-space ray through a point given in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        let b = self.basis()?;
        let tan_half = (0.5 * self.fov_y_rad).tan();
        let dir =
            b.forward + b.right * (ndc.x * tan_half * self.aspect) + b.up * (ndc.y * tan_half);
        Some(Ray::new(self.eye, dir.normalized()?))
    }

    /// Projects a world point to NDC. `None` if the point is behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let b = self.basis()?;
        let tan_half = (0.5 * self.fov_y_rad).tan();
        let d = world - self.eye;
        let depth = d.dot(b.forward);
        if depth <= 1e-9 {
            return None;
        }
        Some(Vec2::new(
            d.dot(b.right) / (depth * tan_half * self.aspect),
            d.dot(b.up) / (depth * tan_half),
        ))
    }

    /// Projects a world point to viewport pixels.
    pub fn project_to_screen(&self, world: Vec3, viewport: Viewport) -> Option<Vec2> {
        self.project(world).map(|ndc| viewport.from_ndc(ndc))
    }
}
