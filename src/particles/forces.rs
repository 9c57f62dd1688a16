use std::sync::Arc;

use crate::{
    core::Particle,
    utils::allocator::{Arena, ParticleId},
};

/// Adds force to a particle once per step.
pub trait ParticleForceGenerator: Send + Sync {
    fn update_force(&self, particle: &mut Particle, dt: f32);
}

#[derive(Default)]
pub struct ParticleForceRegistry {
    registrations: Vec<(ParticleId, Arc<dyn ParticleForceGenerator>)>,
}

impl ParticleForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, particle: ParticleId, generator: Arc<dyn ParticleForceGenerator>) {
        self.registrations.push((particle, generator));
    }

    pub fn remove(&mut self, particle: ParticleId, generator: &Arc<dyn ParticleForceGenerator>) -> bool {
        let position = self
            .registrations
            .iter()
            .position(|(id, g)| *id == particle && Arc::ptr_eq(g, generator));
        position
            .map(|index| self.registrations.remove(index))
            .is_some()
    }

    pub fn remove_particle(&mut self, particle: ParticleId) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|(id, _)| *id != particle);
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

    pub fn update_forces(&self, particles: &mut Arena<Particle>, dt: f32) {
        for (id, generator) in &self.registrations {
            if let Some(particle) = particles.get_mut(*id) {
                generator.update_force(particle, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::forces::Gravity;
    use glam::Vec3;

    #[test]
    fn shared_generator_drives_many_particles() {
        let mut particles = Arena::new();
        let a = particles.insert(Particle::new(Vec3::ZERO, 1.0));
        let b = particles.insert(Particle::new(Vec3::ONE, 2.0));

        let gravity: Arc<dyn ParticleForceGenerator> = Arc::new(Gravity::new(Vec3::new(0.0, -2.0, 0.0)));
        let mut registry = ParticleForceRegistry::new();
        registry.add(a, gravity.clone());
        registry.add(b, gravity.clone());
        registry.update_forces(&mut particles, 0.1);

        assert_eq!(particles.get(a).map(|p| p.force_accum()), Some(Vec3::new(0.0, -2.0, 0.0)));
        assert_eq!(particles.get(b).map(|p| p.force_accum()), Some(Vec3::new(0.0, -4.0, 0.0)));

        assert!(registry.remove(a, &gravity));
        assert_eq!(registry.remove_particle(b), 1);
        assert!(registry.is_empty());
    }
}
