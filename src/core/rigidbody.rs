use glam::{Affine3A, Mat3, Quat, Vec3};

use crate::{
    config::{DEFAULT_ANGULAR_DAMPING, DEFAULT_LINEAR_DAMPING, DEFAULT_SLEEP_EPSILON},
    error::{PhysicsError, Result},
    utils::allocator::{ArenaItem, BodyId},
    utils::math::{
        column_major_transform, quat_add_scaled_vector, rigid_transform, transform_inertia_tensor,
        InertiaTensorExt,
    },
};

const TENSOR_EPSILON: f32 = 1e-6;

/// Rigid body state advanced by semi-implicit Newton-Euler integration.
///
/// Infinite mass is expressed through a zero inverse mass. The world
/// transform and world-space inverse inertia tensor are derived from
/// position and orientation; every public setter of those keeps them in sync.
#[derive(Debug, Clone)]
pub struct RigidBody {
    inverse_mass: f32,
    inverse_inertia_tensor: Mat3,
    linear_damping: f32,
    angular_damping: f32,
    position: Vec3,
    orientation: Quat,
    velocity: Vec3,
    rotation: Vec3,
    acceleration: Vec3,
    last_frame_acceleration: Vec3,
    force_accum: Vec3,
    torque_accum: Vec3,
    inverse_inertia_tensor_world: Mat3,
    transform: Affine3A,
    motion: f32,
    is_awake: bool,
    can_sleep: bool,
    sleep_epsilon: f32,
}

impl ArenaItem for RigidBody {
    type Id = BodyId;
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// Unit mass, unit inertia, awake body at the origin.
    pub fn new() -> Self {
        let mut body = Self {
            inverse_mass: 1.0,
            inverse_inertia_tensor: Mat3::IDENTITY,
            linear_damping: DEFAULT_LINEAR_DAMPING,
            angular_damping: DEFAULT_ANGULAR_DAMPING,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            last_frame_acceleration: Vec3::ZERO,
            force_accum: Vec3::ZERO,
            torque_accum: Vec3::ZERO,
            inverse_inertia_tensor_world: Mat3::IDENTITY,
            transform: Affine3A::IDENTITY,
            motion: DEFAULT_SLEEP_EPSILON * 2.0,
            is_awake: true,
            can_sleep: true,
            sleep_epsilon: DEFAULT_SLEEP_EPSILON,
        };
        body.calculate_derived_data();
        body
    }

    /// Solid box of the given half extents and mass.
    pub fn solid_box(half_size: Vec3, mass: f32) -> Self {
        let mut body = Self::new();
        body.set_mass(mass);
        body.inverse_inertia_tensor = Mat3::for_solid_box(half_size, mass).inverse();
        body.calculate_derived_data();
        body
    }

    /// Solid sphere of the given radius and mass.
    pub fn solid_sphere(radius: f32, mass: f32) -> Self {
        let mut body = Self::new();
        body.set_mass(mass);
        body.inverse_inertia_tensor = Mat3::for_solid_sphere(radius, mass).inverse();
        body.calculate_derived_data();
        body
    }

    /// Immovable body: zero inverse mass and zero inverse inertia.
    pub fn fixed() -> Self {
        let mut body = Self::new();
        body.inverse_mass = 0.0;
        body.inverse_inertia_tensor = Mat3::ZERO;
        body.can_sleep = false;
        body.calculate_derived_data();
        body
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.set_orientation(orientation);
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Normalizes the orientation and rebuilds the world transform and
    /// world-space inverse inertia tensor.
    pub fn calculate_derived_data(&mut self) {
        self.orientation = self.orientation.normalize();
        self.transform = rigid_transform(self.position, self.orientation);
        self.inverse_inertia_tensor_world = transform_inertia_tensor(
            self.inverse_inertia_tensor,
            Mat3::from_quat(self.orientation),
        );
    }

    pub fn integrate(&mut self, dt: f32) {
        if !self.is_awake {
            return;
        }

        self.last_frame_acceleration = self.acceleration + self.force_accum * self.inverse_mass;
        let angular_acceleration = self.inverse_inertia_tensor_world * self.torque_accum;

        self.velocity += self.last_frame_acceleration * dt;
        self.rotation += angular_acceleration * dt;

        self.velocity *= self.linear_damping.powf(dt);
        self.rotation *= self.angular_damping.powf(dt);

        self.position += self.velocity * dt;
        self.orientation = quat_add_scaled_vector(self.orientation, self.rotation, dt);

        self.calculate_derived_data();
        self.clear_accumulators();

        if self.can_sleep {
            let current_motion = self.velocity.length_squared() + self.rotation.length_squared();
            let bias = 0.5_f32.powf(dt);
            self.motion = bias * self.motion + (1.0 - bias) * current_motion;

            if self.motion < self.sleep_epsilon {
                self.set_awake(false);
            } else if self.motion > 10.0 * self.sleep_epsilon {
                self.motion = 10.0 * self.sleep_epsilon;
            }
        }
    }

    pub fn clear_accumulators(&mut self) {
        self.force_accum = Vec3::ZERO;
        self.torque_accum = Vec3::ZERO;
    }

    /// Sets the mass. Zero mass is a programming error; use
    /// [`set_inverse_mass(0.0)`](Self::set_inverse_mass) for immovable bodies.
    pub fn set_mass(&mut self, mass: f32) {
        assert!(mass != 0.0, "rigid body mass must be non-zero");
        self.inverse_mass = 1.0 / mass;
    }

    /// Mass of the body; `f32::MAX` when infinite.
    pub fn mass(&self) -> f32 {
        if self.inverse_mass == 0.0 {
            f32::MAX
        } else {
            1.0 / self.inverse_mass
        }
    }

    pub fn set_inverse_mass(&mut self, inverse_mass: f32) {
        self.inverse_mass = inverse_mass;
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Sets the body-space inertia tensor, rejecting tensors that are not
    /// invertible or not physical. The body is unchanged on error.
    pub fn set_inertia_tensor(&mut self, tensor: Mat3) -> Result<()> {
        check_tensor_shape(&tensor)?;
        let diagonal = Vec3::new(tensor.x_axis.x, tensor.y_axis.y, tensor.z_axis.z);
        if diagonal.min_element() <= 0.0 {
            return Err(PhysicsError::InvalidInertiaTensor(format!(
                "diagonal must be positive, got {diagonal}"
            )));
        }
        if tensor.determinant().abs() < TENSOR_EPSILON {
            return Err(PhysicsError::SingularInertiaTensor);
        }
        self.inverse_inertia_tensor = tensor.inverse();
        self.calculate_derived_data();
        Ok(())
    }

    /// Sets the body-space inverse inertia tensor directly. A zero matrix
    /// is accepted and makes the body rotationally immovable.
    pub fn set_inverse_inertia_tensor(&mut self, inverse: Mat3) -> Result<()> {
        check_tensor_shape(&inverse)?;
        let diagonal = Vec3::new(inverse.x_axis.x, inverse.y_axis.y, inverse.z_axis.z);
        if diagonal.min_element() < 0.0 {
            return Err(PhysicsError::InvalidInertiaTensor(format!(
                "diagonal must be non-negative, got {diagonal}"
            )));
        }
        self.inverse_inertia_tensor = inverse;
        self.calculate_derived_data();
        Ok(())
    }

    /// Body-space inertia tensor, or `None` when rotation is locked.
    pub fn inertia_tensor(&self) -> Option<Mat3> {
        if self.inverse_inertia_tensor.determinant().abs() < TENSOR_EPSILON {
            None
        } else {
            Some(self.inverse_inertia_tensor.inverse())
        }
    }

    pub fn inverse_inertia_tensor(&self) -> Mat3 {
        self.inverse_inertia_tensor
    }

    pub fn inverse_inertia_tensor_world(&self) -> Mat3 {
        self.inverse_inertia_tensor_world
    }

    pub fn set_damping(&mut self, linear: f32, angular: f32) {
        self.linear_damping = linear;
        self.angular_damping = angular;
    }

    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.calculate_derived_data();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
        self.calculate_derived_data();
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// 4×3 world transform.
    pub fn transform(&self) -> &Affine3A {
        &self.transform
    }

    /// World transform as a column-major 4×4 model matrix.
    pub fn column_major_transform(&self) -> [f32; 16] {
        column_major_transform(&self.transform)
    }

    pub fn point_in_world_space(&self, point: Vec3) -> Vec3 {
        self.transform.transform_point3(point)
    }

    pub fn point_in_local_space(&self, point: Vec3) -> Vec3 {
        self.transform.inverse().transform_point3(point)
    }

    pub fn direction_in_world_space(&self, direction: Vec3) -> Vec3 {
        self.transform.transform_vector3(direction)
    }

    pub fn direction_in_local_space(&self, direction: Vec3) -> Vec3 {
        self.orientation.inverse() * direction
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn add_velocity(&mut self, delta: Vec3) {
        self.velocity += delta;
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    /// Angular velocity in world space.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn add_rotation(&mut self, delta: Vec3) {
        self.rotation += delta;
    }

    pub fn set_acceleration(&mut self, acceleration: Vec3) {
        self.acceleration = acceleration;
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Linear acceleration actually applied during the last integration.
    pub fn last_frame_acceleration(&self) -> Vec3 {
        self.last_frame_acceleration
    }

    pub fn is_awake(&self) -> bool {
        self.is_awake
    }

    /// Waking seeds the motion average at twice the sleep threshold so the
    /// body is not put back to sleep by the next integration. Sleeping
    /// zeroes velocity and rotation.
    pub fn set_awake(&mut self, awake: bool) {
        if awake {
            self.is_awake = true;
            self.motion = self.sleep_epsilon * 2.0;
        } else {
            self.is_awake = false;
            self.velocity = Vec3::ZERO;
            self.rotation = Vec3::ZERO;
        }
    }

    pub fn can_sleep(&self) -> bool {
        self.can_sleep
    }

    pub fn set_can_sleep(&mut self, can_sleep: bool) {
        self.can_sleep = can_sleep;
        if !can_sleep && !self.is_awake {
            self.set_awake(true);
        }
    }

    pub fn motion(&self) -> f32 {
        self.motion
    }

    pub fn sleep_epsilon(&self) -> f32 {
        self.sleep_epsilon
    }

    pub fn set_sleep_epsilon(&mut self, sleep_epsilon: f32) {
        self.sleep_epsilon = sleep_epsilon;
    }

    pub fn force_accum(&self) -> Vec3 {
        self.force_accum
    }

    pub fn torque_accum(&self) -> Vec3 {
        self.torque_accum
    }

    /// Adds a force through the centre of mass (world space).
    pub fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
        self.is_awake = true;
    }

    /// Adds a force applied at a world-space point.
    pub fn add_force_at_point(&mut self, force: Vec3, point: Vec3) {
        let arm = point - self.position;
        self.force_accum += force;
        self.torque_accum += arm.cross(force);
        self.is_awake = true;
    }

    /// Adds a world-space force applied at a body-space point.
    pub fn add_force_at_body_point(&mut self, force: Vec3, point: Vec3) {
        let world_point = self.point_in_world_space(point);
        self.add_force_at_point(force, world_point);
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque_accum += torque;
        self.is_awake = true;
    }

    /// Moves the body outside of integration. Sleeping bodies get their
    /// derived data rebuilt immediately; awake ones at the next integration.
    pub(crate) fn apply_position_change(&mut self, linear: Vec3, angular: Vec3) {
        self.position += linear;
        self.orientation = quat_add_scaled_vector(self.orientation, angular, 1.0);
        if !self.is_awake {
            self.calculate_derived_data();
        }
    }
}

fn check_tensor_shape(tensor: &Mat3) -> Result<()> {
    if !tensor.is_finite() {
        return Err(PhysicsError::InvalidInertiaTensor(
            "tensor contains non-finite values".to_string(),
        ));
    }
    let asymmetry = (*tensor - tensor.transpose()).abs();
    let scale = tensor.abs().to_cols_array().into_iter().fold(1.0_f32, f32::max);
    let worst = asymmetry.to_cols_array().into_iter().fold(0.0_f32, f32::max);
    if worst > 1e-4 * scale {
        return Err(PhysicsError::InvalidInertiaTensor(format!(
            "tensor must be symmetric (asymmetry {worst})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn integrate_applies_acceleration_and_damping() {
        let mut body = RigidBody::new()
            .with_acceleration(Vec3::new(0.0, -10.0, 0.0))
            .with_damping(1.0, 1.0);
        body.set_can_sleep(false);
        body.integrate(0.5);

        assert_abs_diff_eq!(body.velocity(), Vec3::new(0.0, -5.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(body.position(), Vec3::new(0.0, -2.5, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(body.last_frame_acceleration().y, -10.0, epsilon = 1e-5);
    }

    #[test]
    fn accumulators_are_cleared_after_integration() {
        let mut body = RigidBody::new();
        body.add_force_at_point(Vec3::X, Vec3::new(0.0, 1.0, 0.0));
        assert_abs_diff_eq!(body.torque_accum(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        body.integrate(0.01);
        assert_eq!(body.force_accum(), Vec3::ZERO);
        assert_eq!(body.torque_accum(), Vec3::ZERO);
        assert!(body.rotation().z < 0.0);
    }

    #[test]
    fn orientation_stays_normalized() {
        let mut body = RigidBody::new().with_damping(1.0, 1.0);
        body.set_can_sleep(false);
        body.set_rotation(Vec3::new(3.0, 1.0, -2.0));
        for _ in 0..100 {
            body.integrate(1.0 / 60.0);
        }
        assert_abs_diff_eq!(body.orientation().length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn resting_body_falls_asleep_and_zeroes_motion() {
        let mut body = RigidBody::new().with_velocity(Vec3::new(0.01, 0.0, 0.0));
        for _ in 0..240 {
            body.integrate(1.0 / 60.0);
        }
        assert!(!body.is_awake());
        assert_eq!(body.velocity(), Vec3::ZERO);
        assert_eq!(body.rotation(), Vec3::ZERO);
    }

    #[test]
    fn sleeping_body_is_not_integrated() {
        let mut body = RigidBody::new().with_position(Vec3::ONE);
        body.set_awake(false);
        body.set_acceleration(Vec3::new(0.0, -9.81, 0.0));
        body.integrate(0.1);
        assert_eq!(body.position(), Vec3::ONE);
    }

    #[test]
    fn fast_body_motion_is_clamped() {
        let mut body = RigidBody::new().with_velocity(Vec3::new(100.0, 0.0, 0.0));
        body.integrate(1.0);
        assert_abs_diff_eq!(body.motion(), 10.0 * body.sleep_epsilon(), epsilon = 1e-6);
    }

    #[test]
    fn waking_seeds_motion() {
        let mut body = RigidBody::new();
        body.set_awake(false);
        body.set_awake(true);
        assert_abs_diff_eq!(body.motion(), 2.0 * DEFAULT_SLEEP_EPSILON);

        body.set_awake(false);
        body.set_can_sleep(false);
        assert!(body.is_awake());
    }

    #[test]
    fn forces_wake_the_body() {
        let mut body = RigidBody::new();
        body.set_awake(false);
        body.add_force(Vec3::Y);
        assert!(body.is_awake());
    }

    #[test]
    fn force_at_point_leaves_point_untouched() {
        let mut body = RigidBody::new().with_position(Vec3::new(1.0, 0.0, 0.0));
        let point = Vec3::new(1.0, 2.0, 0.0);
        body.add_force_at_point(Vec3::X, point);
        assert_eq!(point, Vec3::new(1.0, 2.0, 0.0));
        assert_abs_diff_eq!(body.torque_accum(), Vec3::new(0.0, 0.0, -2.0), epsilon = 1e-6);
    }

    #[test]
    #[should_panic]
    fn zero_mass_is_rejected() {
        RigidBody::new().set_mass(0.0);
    }

    #[test]
    fn singular_inertia_tensor_is_rejected() {
        let mut body = RigidBody::new();
        let singular = Mat3::from_diagonal(Vec3::new(1.0, 1.0, 0.0));
        assert!(body.set_inertia_tensor(singular).is_err());
        assert_eq!(body.inverse_inertia_tensor(), Mat3::IDENTITY);

        let asymmetric = Mat3::from_cols(Vec3::new(1.0, 0.5, 0.0), Vec3::Y, Vec3::Z);
        assert!(matches!(
            body.set_inertia_tensor(asymmetric),
            Err(PhysicsError::InvalidInertiaTensor(_))
        ));

        let nan = Mat3::from_diagonal(Vec3::new(f32::NAN, 1.0, 1.0));
        assert!(body.set_inverse_inertia_tensor(nan).is_err());
        assert!(body.set_inverse_inertia_tensor(Mat3::ZERO).is_ok());
    }

    #[test]
    fn world_inertia_follows_orientation() {
        let mut body = RigidBody::solid_box(Vec3::new(2.0, 0.5, 0.5), 1.0);
        let local = body.inverse_inertia_tensor();
        body.set_orientation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let world = body.inverse_inertia_tensor_world();
        assert_abs_diff_eq!(world.x_axis.x, local.y_axis.y, epsilon = 1e-4);
        assert_abs_diff_eq!(world.y_axis.y, local.x_axis.x, epsilon = 1e-4);
    }

    #[test]
    fn transform_round_trips_points() {
        let body = RigidBody::new()
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_orientation(Quat::from_rotation_y(0.4));
        let local = Vec3::new(0.5, -0.25, 1.0);
        let world = body.point_in_world_space(local);
        assert_abs_diff_eq!(body.point_in_local_space(world), local, epsilon = 1e-5);
        assert_eq!(body.column_major_transform()[12..15], [1.0, 2.0, 3.0]);
    }
}
