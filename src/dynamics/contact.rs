//! Contact records and the per-contact impulse and projection math.

use glam::{Mat3, Vec3};

use crate::{
    core::RigidBody,
    utils::{
        allocator::{Arena, BodyId},
        math::skew_symmetric,
    },
};

/// Closing speed below which restitution is ignored so resting contacts
/// do not jitter.
const VELOCITY_LIMIT: f32 = 0.25;

/// Largest rotation, as a fraction of the lever arm, a position
/// correction may use.
const ANGULAR_LIMIT: f32 = 0.2;

/// Contact between two bodies, or between a body and static geometry
/// (second slot empty).
///
/// The normal points from the second body towards the first. Fields after
/// `penetration` are derived by [`Contact::calculate_internals`].
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub bodies: [Option<BodyId>; 2],
    pub friction: f32,
    pub restitution: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub penetration: f32,
    contact_to_world: Mat3,
    contact_velocity: Vec3,
    desired_delta_velocity: f32,
    relative_contact_position: [Vec3; 2],
}

/// Linear and angular change applied to each body by a resolution step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyChange {
    pub linear: [Vec3; 2],
    pub angular: [Vec3; 2],
}

impl Contact {
    pub fn new(
        first: Option<BodyId>,
        second: Option<BodyId>,
        point: Vec3,
        normal: Vec3,
        penetration: f32,
    ) -> Self {
        Self {
            bodies: [first, second],
            friction: 0.0,
            restitution: 0.0,
            point,
            normal,
            penetration,
            contact_to_world: Mat3::IDENTITY,
            contact_velocity: Vec3::ZERO,
            desired_delta_velocity: 0.0,
            relative_contact_position: [Vec3::ZERO; 2],
        }
    }

    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    /// Orthonormal basis with the normal as its first column.
    pub fn contact_to_world(&self) -> Mat3 {
        self.contact_to_world
    }

    /// Closing velocity in contact coordinates (x along the normal).
    pub fn contact_velocity(&self) -> Vec3 {
        self.contact_velocity
    }

    pub fn desired_delta_velocity(&self) -> f32 {
        self.desired_delta_velocity
    }

    pub fn relative_contact_position(&self, slot: usize) -> Vec3 {
        self.relative_contact_position[slot]
    }

    /// True when the two contacts involve at least one common body.
    pub fn shares_body_with(&self, other: &Contact) -> bool {
        self.bodies
            .iter()
            .flatten()
            .any(|id| other.bodies.iter().flatten().any(|o| o == id))
    }

    /// Derives basis, lever arms, closing velocity and desired velocity
    /// change. A contact with only its second slot set is swapped first.
    pub fn calculate_internals(&mut self, bodies: &Arena<RigidBody>, dt: f32) {
        if self.bodies[0].is_none() {
            self.swap_bodies();
        }

        self.calculate_contact_basis();

        let first = self.body(bodies, 0);
        let second = self.body(bodies, 1);

        self.relative_contact_position = [
            first.map_or(Vec3::ZERO, |b| self.point - b.position()),
            second.map_or(Vec3::ZERO, |b| self.point - b.position()),
        ];

        let mut velocity = first.map_or(Vec3::ZERO, |b| self.local_velocity(b, 0, dt));
        if let Some(b) = second {
            velocity -= self.local_velocity(b, 1, dt);
        }
        self.contact_velocity = velocity;

        self.calculate_desired_delta_velocity(bodies, dt);
    }

    fn swap_bodies(&mut self) {
        self.normal = -self.normal;
        self.bodies.swap(0, 1);
    }

    fn body<'a>(&self, bodies: &'a Arena<RigidBody>, slot: usize) -> Option<&'a RigidBody> {
        self.bodies[slot].and_then(|id| bodies.get(id))
    }

    /// Builds the basis from whichever world axis is further from the
    /// normal to keep the cross products well conditioned.
    fn calculate_contact_basis(&mut self) {
        let n = self.normal;
        let (tangent, bitangent) = if n.x.abs() > n.y.abs() {
            let s = 1.0 / (n.z * n.z + n.x * n.x).sqrt();
            let t = Vec3::new(n.z * s, 0.0, -n.x * s);
            (t, n.cross(t))
        } else {
            let s = 1.0 / (n.z * n.z + n.y * n.y).sqrt();
            let t = Vec3::new(0.0, -n.z * s, n.y * s);
            (t, n.cross(t))
        };
        self.contact_to_world = Mat3::from_cols(n, tangent, bitangent);
    }

    fn local_velocity(&self, body: &RigidBody, slot: usize, dt: f32) -> Vec3 {
        let velocity = body.rotation().cross(self.relative_contact_position[slot]) + body.velocity();
        let mut contact_velocity = self.contact_to_world.transpose() * velocity;

        // Planar velocity gained from this frame's acceleration; the normal
        // component is handled by the desired velocity change.
        let mut acc_velocity = self.contact_to_world.transpose() * (body.last_frame_acceleration() * dt);
        acc_velocity.x = 0.0;
        contact_velocity += acc_velocity;
        contact_velocity
    }

    /// Target velocity change along the normal, discounting the closing
    /// velocity built up by acceleration during the last frame.
    pub fn calculate_desired_delta_velocity(&mut self, bodies: &Arena<RigidBody>, dt: f32) {
        let mut velocity_from_acc = 0.0;
        if let Some(b) = self.body(bodies, 0).filter(|b| b.is_awake()) {
            velocity_from_acc += (b.last_frame_acceleration() * dt).dot(self.normal);
        }
        if let Some(b) = self.body(bodies, 1).filter(|b| b.is_awake()) {
            velocity_from_acc -= (b.last_frame_acceleration() * dt).dot(self.normal);
        }

        let closing = self.contact_velocity.x;
        let restitution = if closing.abs() < VELOCITY_LIMIT {
            0.0
        } else {
            self.restitution
        };

        self.desired_delta_velocity = -closing - restitution * (closing - velocity_from_acc);
    }

    /// Wakes the sleeping body of an awake/asleep pair. Contacts with
    /// static geometry never wake anything.
    pub fn match_awake_state(&self, bodies: &mut Arena<RigidBody>) {
        let (Some(a), Some(b)) = (self.bodies[0], self.bodies[1]) else {
            return;
        };
        if let Some((first, second)) = bodies.get2_mut(a, b) {
            match (first.is_awake(), second.is_awake()) {
                (true, false) => second.set_awake(true),
                (false, true) => first.set_awake(true),
                _ => {}
            }
        }
    }

    pub(crate) fn adjust_contact_velocity(&mut self, delta_world: Vec3, sign: f32) {
        self.contact_velocity += self.contact_to_world.transpose() * delta_world * sign;
    }

    /// Applies the impulse that achieves the desired velocity change and
    /// returns the velocity and rotation change of each body.
    pub fn apply_velocity_change(&self, bodies: &mut Arena<RigidBody>) -> BodyChange {
        let inverse_inertia = [
            self.body(bodies, 0)
                .map_or(Mat3::ZERO, |b| b.inverse_inertia_tensor_world()),
            self.body(bodies, 1)
                .map_or(Mat3::ZERO, |b| b.inverse_inertia_tensor_world()),
        ];
        let inverse_mass = [
            self.body(bodies, 0).map_or(0.0, |b| b.inverse_mass()),
            self.body(bodies, 1).map_or(0.0, |b| b.inverse_mass()),
        ];

        let impulse_contact = if self.friction == 0.0 {
            self.frictionless_impulse(&inverse_inertia, &inverse_mass)
        } else {
            self.friction_impulse(&inverse_inertia, &inverse_mass)
        };
        let impulse = self.contact_to_world * impulse_contact;

        let mut change = BodyChange::default();
        change.angular[0] = inverse_inertia[0] * self.relative_contact_position[0].cross(impulse);
        change.linear[0] = impulse * inverse_mass[0];
        change.angular[1] = inverse_inertia[1] * impulse.cross(self.relative_contact_position[1]);
        change.linear[1] = impulse * -inverse_mass[1];

        for slot in 0..2 {
            if let Some(body) = self.bodies[slot].and_then(|id| bodies.get_mut(id)) {
                body.add_velocity(change.linear[slot]);
                body.add_rotation(change.angular[slot]);
            }
        }
        change
    }

    fn frictionless_impulse(&self, inverse_inertia: &[Mat3; 2], inverse_mass: &[f32; 2]) -> Vec3 {
        let mut delta_velocity = 0.0;
        for slot in 0..2 {
            if self.bodies[slot].is_none() {
                continue;
            }
            let r = self.relative_contact_position[slot];
            let delta_vel_world = (inverse_inertia[slot] * r.cross(self.normal)).cross(r);
            delta_velocity += delta_vel_world.dot(self.normal) + inverse_mass[slot];
        }
        if delta_velocity <= 0.0 {
            return Vec3::ZERO;
        }
        Vec3::new(self.desired_delta_velocity / delta_velocity, 0.0, 0.0)
    }

    /// Solves the full 3×3 contact-space system, falling back to dynamic
    /// friction on the edge of the Coulomb cone.
    fn friction_impulse(&self, inverse_inertia: &[Mat3; 2], inverse_mass: &[f32; 2]) -> Vec3 {
        let mut total_inverse_mass = 0.0;
        let mut delta_vel_world = Mat3::ZERO;
        for slot in 0..2 {
            if self.bodies[slot].is_none() {
                continue;
            }
            let impulse_to_torque = skew_symmetric(self.relative_contact_position[slot]);
            delta_vel_world -= impulse_to_torque * inverse_inertia[slot] * impulse_to_torque;
            total_inverse_mass += inverse_mass[slot];
        }

        let mut delta_velocity =
            self.contact_to_world.transpose() * delta_vel_world * self.contact_to_world;
        delta_velocity += Mat3::from_diagonal(Vec3::splat(total_inverse_mass));

        if delta_velocity.determinant().abs() < f32::EPSILON {
            return self.frictionless_impulse(inverse_inertia, inverse_mass);
        }
        let impulse_matrix = delta_velocity.inverse();

        let vel_kill = Vec3::new(
            self.desired_delta_velocity,
            -self.contact_velocity.y,
            -self.contact_velocity.z,
        );
        let mut impulse = impulse_matrix * vel_kill;

        let planar = (impulse.y * impulse.y + impulse.z * impulse.z).sqrt();
        if planar > impulse.x * self.friction {
            let dir_y = impulse.y / planar;
            let dir_z = impulse.z / planar;
            // Row 0 of the contact-space velocity-per-impulse matrix.
            let response = delta_velocity.x_axis.x
                + delta_velocity.y_axis.x * self.friction * dir_y
                + delta_velocity.z_axis.x * self.friction * dir_z;
            impulse.x = self.desired_delta_velocity / response;
            impulse.y = dir_y * self.friction * impulse.x;
            impulse.z = dir_z * self.friction * impulse.x;
        }
        impulse
    }

    /// Pushes the bodies apart along the normal by `penetration`, sharing
    /// the move between linear and angular inertia. Returns the applied
    /// linear and angular changes.
    pub fn apply_position_change(&self, bodies: &mut Arena<RigidBody>, penetration: f32) -> BodyChange {
        let mut linear_inertia = [0.0_f32; 2];
        let mut angular_inertia = [0.0_f32; 2];
        let mut total_inertia = 0.0;

        for slot in 0..2 {
            if let Some(body) = self.body(bodies, slot) {
                let r = self.relative_contact_position[slot];
                let angular_world = (body.inverse_inertia_tensor_world() * r.cross(self.normal)).cross(r);
                angular_inertia[slot] = angular_world.dot(self.normal);
                linear_inertia[slot] = body.inverse_mass();
                total_inertia += linear_inertia[slot] + angular_inertia[slot];
            }
        }

        let mut change = BodyChange::default();
        if total_inertia <= 0.0 {
            return change;
        }

        for slot in 0..2 {
            let Some(id) = self.bodies[slot] else {
                continue;
            };
            let Some(body) = bodies.get_mut(id) else {
                continue;
            };

            let sign = if slot == 0 { 1.0 } else { -1.0 };
            let mut angular_move = sign * penetration * (angular_inertia[slot] / total_inertia);
            let mut linear_move = sign * penetration * (linear_inertia[slot] / total_inertia);

            let r = self.relative_contact_position[slot];
            let projection = r - self.normal * r.dot(self.normal);
            let max_magnitude = ANGULAR_LIMIT * projection.length();

            if angular_move.abs() > max_magnitude {
                let total_move = angular_move + linear_move;
                angular_move = max_magnitude.copysign(angular_move);
                linear_move = total_move - angular_move;
            }

            change.angular[slot] = if angular_move == 0.0 || angular_inertia[slot] == 0.0 {
                Vec3::ZERO
            } else {
                let target_direction = r.cross(self.normal);
                body.inverse_inertia_tensor_world() * target_direction
                    * (angular_move / angular_inertia[slot])
            };
            change.linear[slot] = self.normal * linear_move;

            body.apply_position_change(change.linear[slot], change.angular[slot]);
        }
        change
    }
}
