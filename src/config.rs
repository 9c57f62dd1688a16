//! Tuning constants and the per-simulation configuration value.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Standard gravity (Y-up).
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Exaggerated gravity for projectile-scale demos.
pub const HIGH_GRAVITY: Vec3 = Vec3::new(0.0, -19.62, 0.0);

/// World up direction.
pub const UP: Vec3 = Vec3::Y;

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Motion energy below which a body is put to sleep.
pub const DEFAULT_SLEEP_EPSILON: f32 = 0.3;

/// Capacity of the per-step contact buffer.
pub const DEFAULT_MAX_CONTACTS: usize = 256;

/// Desired velocity change below which a contact counts as resolved.
pub const DEFAULT_VELOCITY_EPSILON: f32 = 0.01;

/// Penetration below which a contact counts as resolved.
pub const DEFAULT_POSITION_EPSILON: f32 = 0.01;

/// Friction coefficient for generated contacts.
pub const DEFAULT_FRICTION: f32 = 0.9;

/// Restitution coefficient for generated contacts.
pub const DEFAULT_RESTITUTION: f32 = 0.1;

/// Per-second velocity retention applied to new bodies.
pub const DEFAULT_LINEAR_DAMPING: f32 = 0.99;

/// Per-second rotation retention applied to new bodies.
pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.8;

/// Resolver iterations granted per rigid contact when iterations are automatic.
pub const RIGID_ITERATIONS_PER_CONTACT: usize = 4;

/// Resolver iterations granted per particle contact when iterations are automatic.
pub const PARTICLE_ITERATIONS_PER_CONTACT: usize = 2;

/// Capacity of the broad-phase candidate pair buffer.
pub const DEFAULT_MAX_POTENTIAL_CONTACTS: usize = 1024;

/// Explicit tuning handed to each world and resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub sleep_epsilon: f32,
    pub max_contacts: usize,
    pub max_potential_contacts: usize,
    /// Resolver iterations per pass; `0` scales with the contact count.
    pub iterations: usize,
    pub velocity_epsilon: f32,
    pub position_epsilon: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sleep_epsilon: DEFAULT_SLEEP_EPSILON,
            max_contacts: DEFAULT_MAX_CONTACTS,
            max_potential_contacts: DEFAULT_MAX_POTENTIAL_CONTACTS,
            iterations: 0,
            velocity_epsilon: DEFAULT_VELOCITY_EPSILON,
            position_epsilon: DEFAULT_POSITION_EPSILON,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
        }
    }
}

impl SimulationConfig {
    pub fn with_sleep_epsilon(mut self, epsilon: f32) -> Self {
        self.sleep_epsilon = epsilon;
        self
    }

    pub fn with_max_contacts(mut self, max: usize) -> Self {
        self.max_contacts = max;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_epsilons(mut self, velocity: f32, position: f32) -> Self {
        self.velocity_epsilon = velocity;
        self.position_epsilon = position;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sleep_epsilon.is_finite() && self.sleep_epsilon >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "sleep_epsilon must be finite and non-negative, got {}",
                self.sleep_epsilon
            )));
        }
        if self.max_contacts == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max_contacts must be at least 1".to_string(),
            ));
        }
        if self.max_potential_contacts == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max_potential_contacts must be at least 1".to_string(),
            ));
        }
        if !(self.velocity_epsilon >= 0.0 && self.position_epsilon >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "epsilons must be non-negative, got velocity {} / position {}",
                self.velocity_epsilon, self.position_epsilon
            )));
        }
        if !(self.friction >= 0.0 && self.friction.is_finite()) {
            return Err(PhysicsError::InvalidConfig(format!(
                "friction must be non-negative, got {}",
                self.friction
            )));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(PhysicsError::InvalidConfig(format!(
                "restitution must lie in [0, 1], got {}",
                self.restitution
            )));
        }
        Ok(())
    }
}
