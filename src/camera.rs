use glam::{Mat4, Vec3};

use crate::config;

/// Perspective camera in a right-handed, Y-up space.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    /// Creates a camera with the given frustum, looking at the origin.
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg,
            aspect,
            near,
            far,
        }
    }

    /// Camera for the demo scene, placed per the fixed configuration.
    pub fn demo(aspect: f32) -> Self {
        let mut camera = Self::new(
            config::camera::FOV_Y_DEG,
            aspect,
            config::camera::NEAR,
            config::camera::FAR,
        );
        camera.position = config::camera::INITIAL_POSITION;
        camera.target = config::camera::TARGET;
        camera
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// View matrix looking from the camera position at its target.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection matrix with a zero-to-one depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn demo_camera_matches_fixed_settings() {
        let camera = PerspectiveCamera::demo(16.0 / 9.0);
        assert_eq!(camera.fov_y_deg, 75.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.position, Vec3::new(2.0, 2.0, 5.0));
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn set_aspect_scales_projection_x() {
        let mut camera = PerspectiveCamera::demo(1.0);
        let narrow = camera.projection_matrix().x_axis.x;
        camera.set_aspect(2.0);
        let wide = camera.projection_matrix().x_axis.x;
        assert_relative_eq!(wide * 2.0, narrow, epsilon = 1e-5);
    }

    #[test]
    fn view_matrix_centers_target() {
        let camera = PerspectiveCamera::demo(1.0);
        let target_in_view = camera.view_matrix().transform_point3(camera.target);
        let distance = camera.position.distance(camera.target);
        assert_relative_eq!(target_in_view.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(target_in_view.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(target_in_view.z, -distance, epsilon = 1e-4);
    }

    #[test]
    fn view_projection_is_finite() {
        let camera = PerspectiveCamera::demo(16.0 / 9.0);
        let matrix = camera.view_projection();
        assert!(matrix.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
