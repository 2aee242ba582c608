use glam::{Mat4, Vec3};

/// Camera as seen by the renderer.
pub trait CameraSource {
    /// Called once per frame before the matrices are read.
    fn update_world_matrix(&mut self) {}

    fn view_matrix(&self) -> Mat4;

    fn projection_matrix(&self) -> Mat4;

    fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Right-handed perspective camera, depth range 0..1.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    view: Mat4,
}

impl PerspectiveCamera {
    pub fn new(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        let mut cam = Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
            view: Mat4::IDENTITY,
        };
        cam.update_world_matrix();
        cam
    }

    /// Keeps the aspect ratio in sync with a surface size.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }
}

impl CameraSource for PerspectiveCamera {
    fn update_world_matrix(&mut self) {
        self.view = Mat4::look_at_rh(self.eye, self.target, self.up);
    }

    fn view_matrix(&self) -> Mat4 {
        self.view
    }

    fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect.max(f32::EPSILON), self.near, self.far)
    }
}
