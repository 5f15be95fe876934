use glam::{Mat4, Vec3, Vec4};

/// World up axis. Models rest on the XY plane.
pub const UP: Vec3 = Vec3::Z;

/// Perspective parameters, recomputed on viewport resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view (radians)
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub width: u32,
    pub height: u32,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        let mut p = Self {
            fov_y: 45.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            width: 1,
            height: 1,
        };
        p.resize(width, height);
        p
    }

    /// Zero-sized viewports are clamped to one pixel.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.aspect = self.width as f32 / self.height as f32;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// Position of the camera relative to its target in spherical coordinates.
///
/// `azimuth` is measured in the XY plane from +X, `inclination` from +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub azimuth: f32,
    pub inclination: f32,
}

impl Spherical {
    pub fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                azimuth: 0.0,
                inclination: 0.0,
            };
        }
        Self {
            radius,
            azimuth: v.y.atan2(v.x),
            inclination: (v.z / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let (sin_i, cos_i) = self.inclination.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        Vec3::new(
            self.radius * sin_i * cos_a,
            self.radius * sin_i * sin_a,
            self.radius * cos_i,
        )
    }
}

/// Camera pose and projection for the live viewer.
///
/// Invariant: `position != target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub projection: Projection,
}

impl CameraState {
    pub fn new(position: Vec3, target: Vec3, projection: Projection) -> Self {
        Self {
            position,
            target,
            projection,
        }
    }

    pub fn offset(&self) -> Vec3 {
        self.position - self.target
    }

    pub fn radius(&self) -> f32 {
        self.offset().length()
    }

    pub fn spherical(&self) -> Spherical {
        Spherical::from_offset(self.offset())
    }

    pub fn set_spherical(&mut self, s: Spherical) {
        self.position = self.target + s.to_offset();
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, UP)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Keep the depth range proportional to the orbit radius.
    pub fn fit_depth_range(&mut self, scene_radius: f32) {
        let r = self.radius();
        let reach = r + scene_radius.max(r * 0.1);
        self.projection.near = (r * 0.01).max(1e-4);
        self.projection.far = (reach * 4.0).max(self.projection.near * 10.0);
    }

    /// Project a world point to pixel coordinates plus NDC depth.
    pub fn project(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection() * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let w = self.projection.width as f32;
        let h = self.projection.height as f32;
        Some(Vec3::new(
            (ndc.x + 1.0) * 0.5 * w,
            (1.0 - ndc.y) * 0.5 * h,
            ndc.z,
        ))
    }
}
