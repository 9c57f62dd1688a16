//! Boolean overlap tests used as early-outs before contact generation.

use glam::Vec3;

use super::primitives::{CollisionBox, CollisionPlane, CollisionSphere};

/// Cheap yes/no intersection queries.
pub struct IntersectionTests;

impl IntersectionTests {
    pub fn sphere_and_half_space(sphere: &CollisionSphere, plane: &CollisionPlane) -> bool {
        let ball_distance = plane.direction.dot(sphere.centre()) - sphere.radius;
        ball_distance <= plane.offset
    }

    pub fn sphere_and_sphere(one: &CollisionSphere, two: &CollisionSphere) -> bool {
        let midline = one.centre() - two.centre();
        let reach = one.radius + two.radius;
        midline.length_squared() < reach * reach
    }

    pub fn box_and_half_space(cuboid: &CollisionBox, plane: &CollisionPlane) -> bool {
        let projected_radius = cuboid.project_onto(plane.direction);
        let box_distance = plane.direction.dot(cuboid.centre()) - projected_radius;
        box_distance <= plane.offset
    }

    /// Separating-axis test over the 15 candidate axes.
    pub fn box_and_box(one: &CollisionBox, two: &CollisionBox) -> bool {
        let to_centre = two.centre() - one.centre();
        candidate_axes(one, two)
            .into_iter()
            .all(|axis| overlap_on_axis(one, two, axis, to_centre))
    }
}

/// Face normals of both boxes followed by the nine edge cross products.
pub(crate) fn candidate_axes(one: &CollisionBox, two: &CollisionBox) -> [Vec3; 15] {
    let a = [one.axis(0), one.axis(1), one.axis(2)];
    let b = [two.axis(0), two.axis(1), two.axis(2)];
    [
        a[0],
        a[1],
        a[2],
        b[0],
        b[1],
        b[2],
        a[0].cross(b[0]),
        a[0].cross(b[1]),
        a[0].cross(b[2]),
        a[1].cross(b[0]),
        a[1].cross(b[1]),
        a[1].cross(b[2]),
        a[2].cross(b[0]),
        a[2].cross(b[1]),
        a[2].cross(b[2]),
    ]
}

/// Overlap of the two projections on `axis`; negative when separated.
pub(crate) fn penetration_on_axis(one: &CollisionBox, two: &CollisionBox, axis: Vec3, to_centre: Vec3) -> f32 {
    one.project_onto(axis) + two.project_onto(axis) - to_centre.dot(axis).abs()
}

/// Degenerate (parallel-edge) axes carry no information and count as overlapping.
fn overlap_on_axis(one: &CollisionBox, two: &CollisionBox, axis: Vec3, to_centre: Vec3) -> bool {
    if axis.length_squared() < super::narrowphase::AXIS_EPSILON {
        return true;
    }
    penetration_on_axis(one, two, axis.normalize(), to_centre) >= 0.0
}
