use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Per-frame camera state handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Camera-to-world transform.
    pub transform: Mat4,
    /// `(x, y, width, height)` in pixels.
    pub viewport: Vec4,
    pub near_far: Vec2,
    /// Vertical field of view in radians.
    pub fovy: f32,
}

impl Camera {
    pub fn new(transform: Mat4, viewport: Vec4, near_far: Vec2, fovy: f32) -> Self {
        Self {
            transform,
            viewport,
            near_far,
            fovy,
        }
    }

    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3, width: u32, height: u32) -> Self {
        Self {
            transform: Mat4::look_at_rh(eye, target, up).inverse(),
            viewport: Vec4::new(0.0, 0.0, width as f32, height as f32),
            near_far: Vec2::new(0.1, 1000.0),
            fovy: 45f32.to_radians(),
        }
    }

    /// World-space viewing direction: the camera's local -Z.
    pub fn forward(&self) -> Vec3 {
        Mat3::from_mat4(self.transform) * Vec3::NEG_Z
    }

    pub fn eye(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.transform.inverse()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.viewport.z / self.viewport.w
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy,
            self.aspect_ratio(),
            self.near_far.x,
            self.near_far.y,
        )
    }

    /// `(focal, near, far, 0)` where focal is the viewport height over
    /// `tan(fovy / 2)`.
    pub fn proj_params(&self) -> Vec4 {
        Vec4::new(
            self.viewport.w / (self.fovy / 2.0).tan(),
            self.near_far.x,
            self.near_far.y,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1.0e-5
    }

    #[test]
    fn identity_camera_looks_down_negative_z() {
        let camera = Camera::new(
            Mat4::IDENTITY,
            Vec4::new(0.0, 0.0, 640.0, 480.0),
            Vec2::new(0.1, 100.0),
            1.0,
        );
        assert!(approx(camera.forward(), Vec3::NEG_Z));
        assert!(approx(camera.eye(), Vec3::ZERO));
        assert_eq!(camera.view_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn looking_at_points_forward_to_target() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let camera = Camera::looking_at(eye, Vec3::new(0.0, 0.0, -5.0), Vec3::Y, 100, 50);
        assert!(approx(camera.eye(), eye));
        assert!(approx(camera.forward(), Vec3::NEG_Z));
        assert_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn translated_camera_view_matrix_inverts_transform() {
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let camera = Camera::new(
            transform,
            Vec4::new(0.0, 0.0, 1.0, 1.0),
            Vec2::new(0.1, 10.0),
            1.0,
        );
        let origin = camera.view_matrix() * Vec4::new(1.0, 2.0, 3.0, 1.0);
        assert!(approx(origin.truncate(), Vec3::ZERO));
    }

    #[test]
    fn proj_params_uses_viewport_height() {
        let camera = Camera::new(
            Mat4::IDENTITY,
            Vec4::new(0.0, 0.0, 800.0, 600.0),
            Vec2::new(0.5, 50.0),
            std::f32::consts::FRAC_PI_2,
        );
        let params = camera.proj_params();
        assert!((params.x - 600.0).abs() < 1.0e-3);
        assert_eq!(params.y, 0.5);
        assert_eq!(params.z, 50.0);
    }
}
