use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Quat, Vec3};

/// Viewpoint supplied by the host each frame.
///
/// The world is Z-up; a view matrix built with `Mat4::look_at_rh(.., Vec3::Z)`
/// is the expected convention.
pub trait CameraView {
    fn view_matrix(&self) -> Mat4;
    fn position(&self) -> Vec3;
}

/// Vertical field of view of every camera the renderer builds.
pub const FOV_Y: f32 = FRAC_PI_2;

/// Near plane; the far plane is at infinity.
pub const Z_NEAR: f32 = 0.001;

/// Seconds for the sun to complete one revolution.
pub const DAY_LENGTH_SECS: f32 = 120.0;

/// Sideways tilt of the sun's path, so it never passes straight overhead.
const SUN_TILT: f32 = 0.35;

/// Cube faces in layer order: +X, −X, +Y, −Y, +Z, −Z.
pub const CUBE_FACES: usize = 6;

/// Euler angles (degrees, X/Y/Z) orienting the camera for each cube face.
pub const FACE_ROTATIONS_DEG: [[f32; 3]; CUBE_FACES] = [
    [0.0, 90.0, 180.0],
    [0.0, -90.0, 180.0],
    [-90.0, 0.0, 180.0],
    [90.0, 0.0, 180.0],
    [0.0, 180.0, 0.0],
    [0.0, 0.0, 0.0],
];

/// Axis flips applied after the face rotation.
pub const FACE_FLIPS: [[f32; 3]; CUBE_FACES] = [
    [1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Rotation from Euler angles in degrees, applied X first, then Y, then Z.
pub fn euler_deg(angles: Vec3) -> Quat {
    let r = angles * (std::f32::consts::PI / 180.0);
    Quat::from_rotation_z(r.z) * Quat::from_rotation_y(r.y) * Quat::from_rotation_x(r.x)
}

/// Infinite-far perspective with the renderer's fixed field of view.
#[inline]
pub fn perspective(aspect: f32) -> Mat4 {
    Mat4::perspective_infinite_rh(FOV_Y, aspect, Z_NEAR)
}

/// View-projection of the primary camera for a drawable of the given aspect.
pub fn primary_view_proj(camera: &dyn CameraView, aspect: f32) -> Mat4 {
    perspective(aspect) * camera.view_matrix()
}

/// View (without projection) looking out of cube face `face` from `origin`.
pub fn face_view(face: usize, origin: Vec3) -> Mat4 {
    let rotation = euler_deg(Vec3::from_array(FACE_ROTATIONS_DEG[face]));
    Mat4::from_quat(rotation)
        * Mat4::from_scale(Vec3::from_array(FACE_FLIPS[face]))
        * Mat4::from_translation(-origin)
}

/// View-projection for baking cube face `face` around `origin` (square, 90°).
pub fn face_view_proj(face: usize, origin: Vec3) -> Mat4 {
    perspective(1.0) * face_view(face, origin)
}

/// Direction towards the sun after `elapsed_secs` of scene time.
///
/// The sun rises on +X at t = 0, culminates a quarter day later and sets on −X.
pub fn sun_direction(elapsed_secs: f32) -> Vec3 {
    let angle = (elapsed_secs / DAY_LENGTH_SECS).fract() * TAU;
    Vec3::new(angle.cos(), SUN_TILT, angle.sin()).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn euler_order_is_x_then_y_then_z() {
        // +X rotated 90° about Y becomes −Z, then 90° about Z leaves it at −Z.
        let q = euler_deg(Vec3::new(0.0, 90.0, 90.0));
        assert!(approx(q * Vec3::X, Vec3::NEG_Z));
        // +Y is untouched by Y, then rotated 90° about Z to −X.
        assert!(approx(q * Vec3::Y, Vec3::NEG_X));
    }

    #[test]
    fn face_five_is_flipped_x_with_negated_translation() {
        let t = Vec3::new(3.0, -2.0, 5.0);
        let expected = perspective(1.0)
            * Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))
            * Mat4::from_translation(-t);
        assert!(face_view_proj(5, t).abs_diff_eq(expected, 1e-6));

        // A point two units down the camera's −Z with +1 on X lands left of centre.
        let clip = face_view_proj(5, t) * (t + Vec3::new(1.0, 0.0, -2.0)).extend(1.0);
        assert!((clip.x / clip.w + 0.5).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
    }

    #[test]
    fn faces_look_down_axes_in_layer_order() {
        let forward: Vec<Vec3> = (0..CUBE_FACES)
            .map(|face| {
                // World direction that maps onto the camera's −Z.
                let view = face_view(face, Vec3::ZERO);
                view.inverse().transform_vector3(Vec3::NEG_Z)
            })
            .collect();
        for f in &forward {
            assert!((f.length() - 1.0).abs() < 1e-5);
            assert!((f.abs().max_element() - 1.0).abs() < 1e-5);
        }
        let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (f, axis) in forward.iter().zip(axes) {
            assert!(approx(*f, axis), "{f} != {axis}");
        }
    }

    #[test]
    fn face_camera_ignores_primary_aspect() {
        let p = face_view_proj(0, Vec3::ZERO);
        assert!(p.abs_diff_eq(perspective(1.0) * face_view(0, Vec3::ZERO), 1e-6));
    }

    #[test]
    fn sun_follows_elapsed_time() {
        assert!(sun_direction(0.0).z.abs() < 1e-6);
        assert!(sun_direction(DAY_LENGTH_SECS * 0.25).z > 0.9);
        assert!(sun_direction(DAY_LENGTH_SECS * 0.75).z < -0.9);
        assert!(approx(sun_direction(10.0), sun_direction(10.0 + DAY_LENGTH_SECS)));
        assert!((sun_direction(42.0).length() - 1.0).abs() < 1e-5);
    }

    struct Fixed;

    impl CameraView for Fixed {
        fn view_matrix(&self) -> Mat4 {
            Mat4::look_at_rh(Vec3::new(0.0, -5.0, 0.0), Vec3::ZERO, Vec3::Z)
        }

        fn position(&self) -> Vec3 {
            Vec3::new(0.0, -5.0, 0.0)
        }
    }

    #[test]
    fn primary_projects_target_to_centre() {
        let vp = primary_view_proj(&Fixed, 16.0 / 9.0);
        let clip = vp * Vec3::ZERO.extend(1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
        let depth = clip.z / clip.w;
        assert!((0.0..1.0).contains(&depth));
    }
}
