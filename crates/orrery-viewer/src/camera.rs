use std::f32::consts::TAU;

use glam::{Mat4, Vec3};
use orrery_engine::render::CameraView;

/// Camera circling a target at fixed radius and height, driven by scene time.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    pub height: f32,
    /// Seconds per full orbit.
    pub period_secs: f32,
    position: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut camera = Self {
            target: Vec3::new(0.0, 0.0, 1.0),
            radius: 8.0,
            height: 3.0,
            period_secs: 40.0,
            position: Vec3::ZERO,
        };
        camera.update(0.0);
        camera
    }
}

impl OrbitCamera {
    /// Places the camera for `elapsed_secs` of scene time.
    pub fn update(&mut self, elapsed_secs: f32) {
        let angle = (elapsed_secs / self.period_secs).fract() * TAU;
        self.position = self.target
            + Vec3::new(self.radius * angle.cos(), self.radius * angle.sin(), self.height);
    }
}

impl CameraView for OrbitCamera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Z)
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_positive_x() {
        let camera = OrbitCamera::default();
        assert!(camera.position().abs_diff_eq(Vec3::new(8.0, 0.0, 4.0), 1e-5));
    }

    #[test]
    fn quarter_period_is_on_positive_y() {
        let mut camera = OrbitCamera::default();
        camera.update(10.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 8.0, 4.0), 1e-4));
        camera.update(50.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 8.0, 4.0), 1e-4));
    }

    #[test]
    fn looks_at_target() {
        let mut camera = OrbitCamera::default();
        camera.update(7.0);
        let eye = camera.view_matrix().transform_point3(camera.target);
        assert!(eye.x.abs() < 1e-4 && eye.y.abs() < 1e-4);
        assert!(eye.z < 0.0);
        // Z-up: a point above the target appears above it on screen.
        let above = camera.view_matrix().transform_point3(camera.target + Vec3::Z);
        assert!(above.y > 0.0);
    }
}
