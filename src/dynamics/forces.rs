use std::sync::Arc;

use glam::Vec3;

use crate::{
    config::GRAVITY,
    core::{Particle, RigidBody},
    particles::forces::ParticleForceGenerator,
    utils::allocator::{Arena, BodyId},
};

/// Adds force and torque to a rigid body once per step.
pub trait ForceGenerator: Send + Sync {
    fn update_force(&self, body: &mut RigidBody, dt: f32);
}

/// Registrations of generators against bodies. A generator may be shared
/// by any number of bodies.
#[derive(Default)]
pub struct ForceRegistry {
    registrations: Vec<(BodyId, Arc<dyn ForceGenerator>)>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, body: BodyId, generator: Arc<dyn ForceGenerator>) {
        self.registrations.push((body, generator));
    }

    /// Drops one registration of exactly this generator for `body`.
    pub fn remove(&mut self, body: BodyId, generator: &Arc<dyn ForceGenerator>) -> bool {
        let position = self
            .registrations
            .iter()
            .position(|(id, g)| *id == body && Arc::ptr_eq(g, generator));
        match position {
            Some(index) => {
                self.registrations.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drops every registration for `body`, returning how many were removed.
    pub fn remove_body(&mut self, body: BodyId) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|(id, _)| *id != body);
        before - self.registrations.len()
    }

    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Runs every registration in insertion order. Registrations for
    /// removed bodies are skipped.
    pub fn update_forces(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for (id, generator) in &self.registrations {
            if let Some(body) = bodies.get_mut(*id) {
                generator.update_force(body, dt);
            }
        }
    }
}

/// Constant acceleration applied as a mass-scaled force. Immovable bodies
/// and anchored particles are left alone.
///
/// Adding force wakes a body, so bodies that should be able to sleep carry
/// gravity as their constant acceleration instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub gravity: Vec3,
}

impl Gravity {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(GRAVITY)
    }
}

impl ForceGenerator for Gravity {
    fn update_force(&self, body: &mut RigidBody, _dt: f32) {
        if !body.has_finite_mass() {
            return;
        }
        body.add_force(self.gravity * body.mass());
    }
}

impl ParticleForceGenerator for Gravity {
    fn update_force(&self, particle: &mut Particle, _dt: f32) {
        if !particle.has_finite_mass() {
            return;
        }
        particle.add_force(self.gravity * particle.mass());
    }
}
