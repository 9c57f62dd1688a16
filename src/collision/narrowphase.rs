//! Contact generation between pairs of collision primitives.

use glam::Vec3;

use super::{
    collision_data::CollisionData,
    intersection::{candidate_axes, penetration_on_axis, IntersectionTests},
    primitives::{CollisionBox, CollisionPlane, CollisionPrimitive, CollisionSphere},
};

/// Squared length below which a SAT axis is treated as degenerate.
pub(crate) const AXIS_EPSILON: f32 = 1e-4;

/// Determinant below which two edges are treated as parallel.
const PARALLEL_EPSILON: f32 = 1e-4;

/// Most contacts a box reports against a plane.
const MAX_BOX_PLANE_CONTACTS: usize = 4;

/// Full contact generation. Every write goes through the buffer's
/// capacity check; each test returns how many contacts it wrote.
pub struct CollisionDetector;

impl CollisionDetector {
    /// Dispatches on the primitive pair. Planes never collide with planes.
    pub fn collide(one: &CollisionPrimitive, two: &CollisionPrimitive, data: &mut CollisionData) -> usize {
        use CollisionPrimitive as P;

        match (one, two) {
            (P::Sphere(a), P::Sphere(b)) => Self::sphere_and_sphere(a, b, data),
            (P::Sphere(s), P::Plane(p)) | (P::Plane(p), P::Sphere(s)) => {
                Self::sphere_and_half_space(s, p, data)
            }
            (P::Box(b), P::Plane(p)) | (P::Plane(p), P::Box(b)) => Self::box_and_half_space(b, p, data),
            (P::Box(b), P::Sphere(s)) | (P::Sphere(s), P::Box(b)) => Self::box_and_sphere(b, s, data),
            (P::Box(a), P::Box(b)) => Self::box_and_box(a, b, data),
            (P::Plane(_), P::Plane(_)) => 0,
        }
    }

    /// Sphere against the solid side of a plane.
    pub fn sphere_and_half_space(sphere: &CollisionSphere, plane: &CollisionPlane, data: &mut CollisionData) -> usize {
        let position = sphere.centre();
        let ball_distance = plane.direction.dot(position) - sphere.radius - plane.offset;
        if ball_distance >= 0.0 {
            return 0;
        }

        let point = position - plane.direction * (ball_distance + sphere.radius);
        data.add_contact(sphere.body, None, point, plane.direction, -ball_distance) as usize
    }

    /// Sphere against a two-sided plane; the normal faces the sphere.
    pub fn sphere_and_true_plane(sphere: &CollisionSphere, plane: &CollisionPlane, data: &mut CollisionData) -> usize {
        let position = sphere.centre();
        let centre_distance = plane.signed_distance(position);
        if centre_distance * centre_distance > sphere.radius * sphere.radius {
            return 0;
        }

        let (normal, depth) = if centre_distance < 0.0 {
            (-plane.direction, centre_distance)
        } else {
            (plane.direction, -centre_distance)
        };
        let point = position - plane.direction * centre_distance;
        data.add_contact(sphere.body, None, point, normal, depth + sphere.radius) as usize
    }

    /// The normal points from `two` towards `one`. Coincident centres fall
    /// back to +X.
    pub fn sphere_and_sphere(one: &CollisionSphere, two: &CollisionSphere, data: &mut CollisionData) -> usize {
        let midline = one.centre() - two.centre();
        let reach = one.radius + two.radius;
        let distance_sq = midline.length_squared();
        if distance_sq >= reach * reach {
            return 0;
        }

        let distance = distance_sq.sqrt();
        let normal = if distance > f32::EPSILON {
            midline / distance
        } else {
            Vec3::X
        };
        // Halfway between the two surfaces along the normal.
        let point = (one.centre() - normal * one.radius + two.centre() + normal * two.radius) * 0.5;
        data.add_contact(one.body, two.body, point, normal, reach - distance) as usize
    }

    /// Reports the deepest box corners below the plane.
    pub fn box_and_half_space(cuboid: &CollisionBox, plane: &CollisionPlane, data: &mut CollisionData) -> usize {
        if !IntersectionTests::box_and_half_space(cuboid, plane) {
            return 0;
        }

        let mut candidates: Vec<(Vec3, f32)> = cuboid
            .vertices()
            .into_iter()
            .filter_map(|vertex| {
                let distance = plane.direction.dot(vertex);
                (distance <= plane.offset).then_some((vertex, plane.offset - distance))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut used = 0;
        for (vertex, penetration) in candidates.into_iter().take(MAX_BOX_PLANE_CONTACTS) {
            // Midway between the corner and its projection onto the plane.
            let point = vertex + plane.direction * (penetration * 0.5);
            if !data.add_contact(cuboid.body, None, point, plane.direction, penetration) {
                break;
            }
            used += 1;
        }
        used
    }

    /// Contact ordering is (sphere, box); the normal points from the box
    /// surface towards the sphere centre. A centre inside the box uses the
    /// nearest face.
    pub fn box_and_sphere(cuboid: &CollisionBox, sphere: &CollisionSphere, data: &mut CollisionData) -> usize {
        let centre = sphere.centre();
        let rel_centre = cuboid.transform().inverse().transform_point3(centre);
        let half = cuboid.half_size;

        if (rel_centre.abs() - Vec3::splat(sphere.radius)).cmpgt(half).any() {
            return 0;
        }

        let closest = rel_centre.clamp(-half, half);
        let distance_sq = (closest - rel_centre).length_squared();
        if distance_sq > sphere.radius * sphere.radius {
            return 0;
        }

        if distance_sq > 1e-12 {
            let closest_world = cuboid.transform().transform_point3(closest);
            let normal = (centre - closest_world).normalize();
            let penetration = sphere.radius - distance_sq.sqrt();
            return data.add_contact(sphere.body, cuboid.body, closest_world, normal, penetration) as usize;
        }

        // Centre inside (or on) the box: push out through the nearest face.
        let depth = half - rel_centre.abs();
        let axis = if depth.x <= depth.y && depth.x <= depth.z {
            0
        } else if depth.y <= depth.z {
            1
        } else {
            2
        };
        let sign = if rel_centre[axis] >= 0.0 { 1.0 } else { -1.0 };
        let mut face_point = rel_centre;
        face_point[axis] = half[axis] * sign;

        let normal = cuboid.axis(axis) * sign;
        let point = cuboid.transform().transform_point3(face_point);
        data.add_contact(sphere.body, cuboid.body, point, normal, sphere.radius + depth[axis]) as usize
    }

    /// Separating-axis test producing a single contact on the axis of
    /// least penetration: vertex-face for face axes, edge-edge otherwise.
    pub fn box_and_box(one: &CollisionBox, two: &CollisionBox, data: &mut CollisionData) -> usize {
        let to_centre = two.centre() - one.centre();
        let axes = candidate_axes(one, two);

        let mut best_penetration = f32::MAX;
        let mut best_case = None;
        let mut best_single_axis = None;

        for (index, axis) in axes.into_iter().enumerate() {
            if index == 6 {
                best_single_axis = best_case;
            }
            if axis.length_squared() < AXIS_EPSILON {
                continue;
            }
            let penetration = penetration_on_axis(one, two, axis.normalize(), to_centre);
            if penetration < 0.0 {
                return 0;
            }
            if penetration < best_penetration {
                best_penetration = penetration;
                best_case = Some(index);
            }
        }

        let Some(best) = best_case else {
            return 0;
        };

        match best {
            0..=2 => Self::fill_point_face(one, two, to_centre, best, best_penetration, data),
            3..=5 => Self::fill_point_face(two, one, -to_centre, best - 3, best_penetration, data),
            _ => {
                let edge_case = best - 6;
                let one_axis_index = edge_case / 3;
                let two_axis_index = edge_case % 3;
                let one_axis = one.axis(one_axis_index);
                let two_axis = two.axis(two_axis_index);

                let mut axis = one_axis.cross(two_axis).normalize();
                if axis.dot(to_centre) > 0.0 {
                    axis = -axis;
                }

                // Midpoints of the two edges closest to each other.
                let mut pt_on_one = one.half_size;
                let mut pt_on_two = two.half_size;
                for i in 0..3 {
                    if i == one_axis_index {
                        pt_on_one[i] = 0.0;
                    } else if one.axis(i).dot(axis) > 0.0 {
                        pt_on_one[i] = -pt_on_one[i];
                    }

                    if i == two_axis_index {
                        pt_on_two[i] = 0.0;
                    } else if two.axis(i).dot(axis) < 0.0 {
                        pt_on_two[i] = -pt_on_two[i];
                    }
                }
                let pt_on_one = one.transform().transform_point3(pt_on_one);
                let pt_on_two = two.transform().transform_point3(pt_on_two);

                let vertex = edge_contact_point(
                    pt_on_one,
                    one_axis,
                    one.half_size[one_axis_index],
                    pt_on_two,
                    two_axis,
                    two.half_size[two_axis_index],
                    best_single_axis.is_some_and(|case| case > 2),
                );

                data.add_contact(one.body, two.body, vertex, axis, best_penetration) as usize
            }
        }
    }

    /// Vertex of `two` against the face of `one` selected by `axis_index`.
    fn fill_point_face(
        one: &CollisionBox,
        two: &CollisionBox,
        to_centre: Vec3,
        axis_index: usize,
        penetration: f32,
        data: &mut CollisionData,
    ) -> usize {
        let mut normal = one.axis(axis_index);
        if normal.dot(to_centre) > 0.0 {
            normal = -normal;
        }

        let mut vertex = two.half_size;
        for i in 0..3 {
            if two.axis(i).dot(normal) < 0.0 {
                vertex[i] = -vertex[i];
            }
        }

        let point = two.transform().transform_point3(vertex);
        data.add_contact(one.body, two.body, point, normal, penetration) as usize
    }
}

/// Closest point between two edges given by midpoint, direction and
/// half-length. Falls back to the midpoint of one edge (`use_one`) when the
/// edges are parallel or the closest points lie outside either edge.
fn edge_contact_point(
    p_one: Vec3,
    d_one: Vec3,
    one_size: f32,
    p_two: Vec3,
    d_two: Vec3,
    two_size: f32,
    use_one: bool,
) -> Vec3 {
    let fallback = if use_one { p_one } else { p_two };

    let sm_one = d_one.length_squared();
    let sm_two = d_two.length_squared();
    let dp_one_two = d_two.dot(d_one);

    let to_st = p_one - p_two;
    let dp_sta_one = d_one.dot(to_st);
    let dp_sta_two = d_two.dot(to_st);

    let denom = sm_one * sm_two - dp_one_two * dp_one_two;
    if denom.abs() < PARALLEL_EPSILON {
        return fallback;
    }

    let mua = (dp_one_two * dp_sta_two - sm_two * dp_sta_one) / denom;
    let mub = (sm_one * dp_sta_two - dp_one_two * dp_sta_one) / denom;

    if mua.abs() > one_size || mub.abs() > two_size {
        return fallback;
    }

    let c_one = p_one + d_one * mua;
    let c_two = p_two + d_two * mub;
    (c_one + c_two) * 0.5
}
