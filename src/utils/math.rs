//! Additional math helpers layered on top of `glam`.

use glam::{Affine3A, Mat3, Mat4, Quat, Vec3};

/// Adds `v * scale` to `q` treating `v` as an angular velocity:
/// `q += 0.5 * (0, v * scale) * q`. The result is not normalized.
pub fn quat_add_scaled_vector(q: Quat, v: Vec3, scale: f32) -> Quat {
    let w = v * scale;
    let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * q;
    Quat::from_xyzw(
        q.x + spin.x * 0.5,
        q.y + spin.y * 0.5,
        q.z + spin.z * 0.5,
        q.w + spin.w * 0.5,
    )
}

/// Matrix `S` such that `S * x == v.cross(x)`.
pub fn skew_symmetric(v: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, v.z, -v.y),
        Vec3::new(-v.z, 0.0, v.x),
        Vec3::new(v.y, -v.x, 0.0),
    )
}

/// Changes basis of a body-space inertia tensor into world space: `R * I * Rᵀ`.
pub fn transform_inertia_tensor(tensor: Mat3, rotation: Mat3) -> Mat3 {
    rotation * tensor * rotation.transpose()
}

/// Column-major 4×4 matrix for a 4×3 transform, ready to upload as a model matrix.
pub fn column_major_transform(transform: &Affine3A) -> [f32; 16] {
    Mat4::from(*transform).to_cols_array()
}

/// Builds the 4×3 world transform of a body.
pub fn rigid_transform(position: Vec3, orientation: Quat) -> Affine3A {
    Affine3A::from_rotation_translation(orientation, position)
}

/// Helper methods for inertia calculations.
pub trait InertiaTensorExt {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Mat3;
    fn for_solid_sphere(radius: f32, mass: f32) -> Mat3;
}

impl InertiaTensorExt for Mat3 {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Mat3 {
        let sq = (half_extents * 2.0) * (half_extents * 2.0);
        let factor = mass / 12.0;
        Mat3::from_diagonal(Vec3::new(
            factor * (sq.y + sq.z),
            factor * (sq.x + sq.z),
            factor * (sq.x + sq.y),
        ))
    }

    fn for_solid_sphere(radius: f32, mass: f32) -> Mat3 {
        Mat3::from_diagonal(Vec3::splat(0.4 * mass * radius * radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn skew_matches_cross_product() {
        let a = Vec3::new(1.0, -2.0, 0.5);
        let b = Vec3::new(0.3, 4.0, -1.0);
        assert_abs_diff_eq!(skew_symmetric(a) * b, a.cross(b), epsilon = 1e-5);
    }

    #[test]
    fn scaled_vector_spins_about_axis() {
        let mut q = Quat::IDENTITY;
        for _ in 0..1000 {
            q = quat_add_scaled_vector(q, Vec3::Y, std::f32::consts::FRAC_PI_2 / 1000.0).normalize();
        }
        let rotated = q * Vec3::X;
        assert_abs_diff_eq!(rotated, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-2);
    }

    #[test]
    fn inertia_transform_is_identity_for_spheres() {
        let tensor = Mat3::for_solid_sphere(1.0, 2.5);
        let rot = Mat3::from_quat(Quat::from_rotation_z(0.7));
        let world = transform_inertia_tensor(tensor, rot);
        assert_abs_diff_eq!(world, tensor, epsilon = 1e-5);
    }

    #[test]
    fn column_major_export_keeps_translation_last() {
        let t = rigid_transform(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        let m = column_major_transform(&t);
        assert_eq!(&m[12..16], &[1.0, 2.0, 3.0, 1.0]);
        assert_eq!(m[0], 1.0);
    }
}
