//! Collision geometry attached to bodies (or standing alone as scenery).

use glam::{Affine3A, Vec3};

use crate::{
    core::RigidBody,
    utils::allocator::{Arena, ArenaItem, BodyId, ColliderId},
};

/// Sphere attached to a body through a local offset.
#[derive(Debug, Clone)]
pub struct CollisionSphere {
    pub body: Option<BodyId>,
    pub offset: Affine3A,
    pub radius: f32,
    transform: Affine3A,
}

impl CollisionSphere {
    pub fn new(body: Option<BodyId>, radius: f32) -> Self {
        Self {
            body,
            offset: Affine3A::IDENTITY,
            radius,
            transform: Affine3A::IDENTITY,
        }
    }

    /// Sphere without a body, fixed at `centre`.
    pub fn fixed(centre: Vec3, radius: f32) -> Self {
        let offset = Affine3A::from_translation(centre);
        Self {
            body: None,
            offset,
            radius,
            transform: offset,
        }
    }

    pub fn with_offset(mut self, offset: Affine3A) -> Self {
        self.offset = offset;
        self.transform = offset;
        self
    }

    pub fn transform(&self) -> &Affine3A {
        &self.transform
    }

    pub fn centre(&self) -> Vec3 {
        self.transform.translation.into()
    }

    pub fn calculate_internals(&mut self, bodies: &Arena<RigidBody>) {
        self.transform = world_transform(self.body, &self.offset, bodies);
    }
}

/// Oriented box attached to a body through a local offset.
#[derive(Debug, Clone)]
pub struct CollisionBox {
    pub body: Option<BodyId>,
    pub offset: Affine3A,
    pub half_size: Vec3,
    transform: Affine3A,
}

/// Sign pattern of the eight box corners.
pub(crate) const BOX_VERTEX_SIGNS: [Vec3; 8] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(-1.0, -1.0, -1.0),
];

impl CollisionBox {
    pub fn new(body: Option<BodyId>, half_size: Vec3) -> Self {
        Self {
            body,
            offset: Affine3A::IDENTITY,
            half_size,
            transform: Affine3A::IDENTITY,
        }
    }

    /// Box without a body, posed by `transform`.
    pub fn fixed(transform: Affine3A, half_size: Vec3) -> Self {
        Self {
            body: None,
            offset: transform,
            half_size,
            transform,
        }
    }

    pub fn with_offset(mut self, offset: Affine3A) -> Self {
        self.offset = offset;
        self.transform = offset;
        self
    }

    pub fn transform(&self) -> &Affine3A {
        &self.transform
    }

    /// Columns 0-2 are the world-space box axes, 3 is the centre.
    pub fn axis(&self, index: usize) -> Vec3 {
        axis_of(&self.transform, index)
    }

    pub fn centre(&self) -> Vec3 {
        self.transform.translation.into()
    }

    /// Half-length of the box projected onto `axis`.
    pub fn project_onto(&self, axis: Vec3) -> f32 {
        self.half_size.x * axis.dot(self.axis(0)).abs()
            + self.half_size.y * axis.dot(self.axis(1)).abs()
            + self.half_size.z * axis.dot(self.axis(2)).abs()
    }

    /// World-space corners.
    pub fn vertices(&self) -> [Vec3; 8] {
        BOX_VERTEX_SIGNS.map(|sign| self.transform.transform_point3(sign * self.half_size))
    }

    pub fn calculate_internals(&mut self, bodies: &Arena<RigidBody>) {
        self.transform = world_transform(self.body, &self.offset, bodies);
    }
}

/// Plane `direction · p = offset`. Never attached to a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPlane {
    pub direction: Vec3,
    pub offset: f32,
}

impl CollisionPlane {
    /// `direction` is normalized on construction.
    pub fn new(direction: Vec3, offset: f32) -> Self {
        Self {
            direction: direction.normalize_or(Vec3::Y),
            offset,
        }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.direction.dot(point) - self.offset
    }
}

/// Closed set of collision shapes.
#[derive(Debug, Clone)]
pub enum CollisionPrimitive {
    Sphere(CollisionSphere),
    Box(CollisionBox),
    Plane(CollisionPlane),
}

impl ArenaItem for CollisionPrimitive {
    type Id = ColliderId;
}

impl CollisionPrimitive {
    pub fn body(&self) -> Option<BodyId> {
        match self {
            Self::Sphere(sphere) => sphere.body,
            Self::Box(cuboid) => cuboid.body,
            Self::Plane(_) => None,
        }
    }

    /// True for planes and for shapes without a body.
    pub fn is_static(&self) -> bool {
        self.body().is_none()
    }

    pub fn calculate_internals(&mut self, bodies: &Arena<RigidBody>) {
        match self {
            Self::Sphere(sphere) => sphere.calculate_internals(bodies),
            Self::Box(cuboid) => cuboid.calculate_internals(bodies),
            Self::Plane(_) => {}
        }
    }

    /// World-space bounding sphere `(centre, radius)`; planes are unbounded.
    pub fn bounding_sphere(&self) -> Option<(Vec3, f32)> {
        match self {
            Self::Sphere(sphere) => Some((sphere.centre(), sphere.radius)),
            Self::Box(cuboid) => Some((cuboid.centre(), cuboid.half_size.length())),
            Self::Plane(_) => None,
        }
    }
}

impl From<CollisionSphere> for CollisionPrimitive {
    fn from(sphere: CollisionSphere) -> Self {
        Self::Sphere(sphere)
    }
}

impl From<CollisionBox> for CollisionPrimitive {
    fn from(cuboid: CollisionBox) -> Self {
        Self::Box(cuboid)
    }
}

impl From<CollisionPlane> for CollisionPrimitive {
    fn from(plane: CollisionPlane) -> Self {
        Self::Plane(plane)
    }
}

fn world_transform(body: Option<BodyId>, offset: &Affine3A, bodies: &Arena<RigidBody>) -> Affine3A {
    match body.and_then(|id| bodies.get(id)) {
        Some(body) => *body.transform() * *offset,
        None => *offset,
    }
}

pub(crate) fn axis_of(transform: &Affine3A, index: usize) -> Vec3 {
    match index {
        0 => transform.matrix3.x_axis.into(),
        1 => transform.matrix3.y_axis.into(),
        2 => transform.matrix3.z_axis.into(),
        _ => transform.translation.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Quat;

    #[test]
    fn internals_follow_the_body() {
        let mut bodies = Arena::new();
        let body = RigidBody::new()
            .with_position(Vec3::new(0.0, 2.0, 0.0))
            .with_orientation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let id = bodies.insert(body);

        let mut cuboid = CollisionBox::new(Some(id), Vec3::new(2.0, 1.0, 1.0))
            .with_offset(Affine3A::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        cuboid.calculate_internals(&bodies);

        assert_abs_diff_eq!(cuboid.centre(), Vec3::new(0.0, 3.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(cuboid.axis(0), Vec3::Y, epsilon = 1e-5);
        assert_abs_diff_eq!(cuboid.project_onto(Vec3::Y), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn static_shapes_keep_their_offset() {
        let bodies = Arena::new();
        let mut prim: CollisionPrimitive = CollisionSphere::fixed(Vec3::new(1.0, 0.0, 0.0), 0.5).into();
        prim.calculate_internals(&bodies);
        assert!(prim.is_static());
        assert_eq!(prim.bounding_sphere(), Some((Vec3::new(1.0, 0.0, 0.0), 0.5)));
    }

    #[test]
    fn box_vertices_span_the_half_size() {
        let cuboid = CollisionBox::fixed(Affine3A::IDENTITY, Vec3::new(1.0, 2.0, 3.0));
        let vertices = cuboid.vertices();
        let max = vertices.iter().fold(Vec3::splat(f32::MIN), |acc, v| acc.max(*v));
        let min = vertices.iter().fold(Vec3::splat(f32::MAX), |acc, v| acc.min(*v));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(min, Vec3::new(-1.0, -2.0, -3.0));
    }
}
