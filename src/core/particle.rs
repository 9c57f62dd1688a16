use glam::Vec3;

use crate::{
    config::DEFAULT_LINEAR_DAMPING,
    utils::allocator::{ArenaItem, ParticleId},
};

/// Point mass with a single linear degree of freedom.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Constant acceleration (gravity and the like).
    pub acceleration: Vec3,
    pub damping: f32,
    inverse_mass: f32,
    force_accum: Vec3,
}

impl ArenaItem for Particle {
    type Id = ParticleId;
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            damping: DEFAULT_LINEAR_DAMPING,
            inverse_mass: 1.0,
            force_accum: Vec3::ZERO,
        }
    }
}

impl Particle {
    pub fn new(position: Vec3, mass: f32) -> Self {
        let mut particle = Self {
            position,
            ..Self::default()
        };
        particle.set_mass(mass);
        particle
    }

    /// Particle that never moves in response to forces or contacts.
    pub fn anchored(position: Vec3) -> Self {
        Self {
            position,
            inverse_mass: 0.0,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Sets the mass. Zero mass is a programming error.
    pub fn set_mass(&mut self, mass: f32) {
        assert!(mass != 0.0, "particle mass must be non-zero");
        self.inverse_mass = 1.0 / mass;
    }

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

    pub fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    pub fn force_accum(&self) -> Vec3 {
        self.force_accum
    }

    pub fn clear_accumulator(&mut self) {
        self.force_accum = Vec3::ZERO;
    }

    /// Advances position then velocity; infinite-mass particles are skipped.
    pub fn integrate(&mut self, dt: f32) {
        if self.inverse_mass <= 0.0 {
            return;
        }

        self.position += self.velocity * dt;

        let resulting_acc = self.acceleration + self.force_accum * self.inverse_mass;
        self.velocity += resulting_acc * dt;
        self.velocity *= self.damping.powf(dt);

        self.clear_accumulator();
    }
}
