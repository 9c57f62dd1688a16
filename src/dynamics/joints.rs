use glam::Vec3;

use crate::{
    collision::collision_data::CollisionData,
    core::RigidBody,
    dynamics::contact::Contact,
    utils::allocator::{Arena, BodyId},
};

/// Source of rigid-body contacts that do not come from geometry, run by
/// the world after the narrow phase.
pub trait ContactGenerator: Send + Sync {
    /// Writes contacts into `data` while it has room and returns how many
    /// were written.
    fn add_contact(&self, bodies: &Arena<RigidBody>, data: &mut CollisionData) -> usize;
}

/// Keeps a point on each of two bodies within `error` of one another.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub bodies: [BodyId; 2],
    /// Body-space anchor on each body.
    pub positions: [Vec3; 2],
    pub error: f32,
}

impl Joint {
    pub fn new(first: BodyId, first_anchor: Vec3, second: BodyId, second_anchor: Vec3, error: f32) -> Self {
        Self {
            bodies: [first, second],
            positions: [first_anchor, second_anchor],
            error,
        }
    }

    /// Current world-space distance between the two anchors, or `None` if
    /// either body is gone.
    pub fn separation(&self, bodies: &Arena<RigidBody>) -> Option<f32> {
        let (a, b) = self.world_anchors(bodies)?;
        Some(a.distance(b))
    }

    fn world_anchors(&self, bodies: &Arena<RigidBody>) -> Option<(Vec3, Vec3)> {
        let a = bodies.get(self.bodies[0])?.point_in_world_space(self.positions[0]);
        let b = bodies.get(self.bodies[1])?.point_in_world_space(self.positions[1]);
        Some((a, b))
    }
}

impl ContactGenerator for Joint {
    fn add_contact(&self, bodies: &Arena<RigidBody>, data: &mut CollisionData) -> usize {
        let Some((a, b)) = self.world_anchors(bodies) else {
            return 0;
        };

        let a_to_b = b - a;
        let length = a_to_b.length();
        if length <= self.error {
            return 0;
        }

        let contact = Contact::new(
            Some(self.bodies[0]),
            Some(self.bodies[1]),
            (a + b) * 0.5,
            a_to_b / length,
            length - self.error,
        )
        .with_material(1.0, 0.0);
        data.push(contact) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn pair(gap: f32) -> (Arena<RigidBody>, Joint) {
        let mut bodies = Arena::new();
        let a = bodies.insert(RigidBody::solid_box(Vec3::splat(0.5), 1.0));
        let b = bodies.insert(RigidBody::solid_box(Vec3::splat(0.5), 1.0).with_position(Vec3::new(1.0 + gap, 0.0, 0.0)));
        let joint = Joint::new(a, Vec3::new(0.5, 0.0, 0.0), b, Vec3::new(-0.5, 0.0, 0.0), 0.1);
        (bodies, joint)
    }

    #[test]
    fn slack_joint_is_quiet() {
        let (bodies, joint) = pair(0.05);
        let mut data = CollisionData::new(4);
        assert_eq!(joint.add_contact(&bodies, &mut data), 0);
        assert_abs_diff_eq!(joint.separation(&bodies).unwrap_or_default(), 0.05, epsilon = 1e-6);
    }

    #[test]
    fn stretched_joint_pulls_bodies_together() {
        let (bodies, joint) = pair(0.5);
        let mut data = CollisionData::new(4);
        assert_eq!(joint.add_contact(&bodies, &mut data), 1);

        let contact = &data.contacts()[0];
        assert_abs_diff_eq!(contact.penetration, 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(contact.normal, Vec3::X, epsilon = 1e-6);
        assert_abs_diff_eq!(contact.point, Vec3::new(0.75, 0.0, 0.0), epsilon = 1e-6);
        assert_eq!(contact.friction, 1.0);
        assert_eq!(contact.restitution, 0.0);
    }

    #[test]
    fn full_buffer_or_missing_body_yields_nothing() {
        let (mut bodies, joint) = pair(0.5);
        let mut full = CollisionData::new(0);
        assert_eq!(joint.add_contact(&bodies, &mut full), 0);
        assert!(full.overflowed());

        bodies.remove(joint.bodies[1]);
        let mut data = CollisionData::new(4);
        assert_eq!(joint.add_contact(&bodies, &mut data), 0);
    }
}
