//! Particle contacts and their single-pass resolver.

use glam::Vec3;

use crate::{
    core::Particle,
    utils::{
        allocator::{Arena, ParticleId},
        logging::log_iteration_usage,
    },
};

/// Two particles (or one particle and scenery) touching along `normal`.
/// The normal points the way the first particle should move.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleContact {
    pub particles: [Option<ParticleId>; 2],
    pub restitution: f32,
    pub normal: Vec3,
    pub penetration: f32,
    movement: [Vec3; 2],
}

impl ParticleContact {
    pub fn new(first: ParticleId, second: Option<ParticleId>, normal: Vec3, penetration: f32) -> Self {
        Self {
            particles: [Some(first), second],
            restitution: 0.0,
            normal,
            penetration,
            movement: [Vec3::ZERO; 2],
        }
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Displacement applied to each particle by the last call to
    /// [`resolve`](Self::resolve).
    pub fn movement(&self) -> [Vec3; 2] {
        self.movement
    }

    /// Relative velocity along the normal; negative when closing.
    pub fn separating_velocity(&self, particles: &Arena<Particle>) -> f32 {
        let relative = self.velocity_of(particles, 0) - self.velocity_of(particles, 1);
        relative.dot(self.normal)
    }

    pub fn resolve(&mut self, particles: &mut Arena<Particle>, dt: f32) {
        self.resolve_velocity(particles, dt);
        self.resolve_interpenetration(particles);
    }

    fn particle<'a>(&self, particles: &'a Arena<Particle>, slot: usize) -> Option<&'a Particle> {
        self.particles[slot].and_then(|id| particles.get(id))
    }

    fn velocity_of(&self, particles: &Arena<Particle>, slot: usize) -> Vec3 {
        self.particle(particles, slot).map_or(Vec3::ZERO, |p| p.velocity)
    }

    fn total_inverse_mass(&self, particles: &Arena<Particle>) -> f32 {
        (0..2)
            .filter_map(|slot| self.particle(particles, slot))
            .map(Particle::inverse_mass)
            .sum()
    }

    fn resolve_velocity(&mut self, particles: &mut Arena<Particle>, dt: f32) {
        let separating = self.separating_velocity(particles);
        if separating > 0.0 {
            return;
        }

        let mut new_separating = -separating * self.restitution;

        // Remove closing velocity that built up from acceleration alone this step.
        let acc_of = |slot: usize| self.particle(particles, slot).map_or(Vec3::ZERO, |p| p.acceleration);
        let acc_separating = (acc_of(0) - acc_of(1)).dot(self.normal) * dt;
        if acc_separating < 0.0 {
            new_separating = (new_separating + self.restitution * acc_separating).max(0.0);
        }

        let total_inverse_mass = self.total_inverse_mass(particles);
        if total_inverse_mass <= 0.0 {
            return;
        }

        let impulse_per_inverse_mass = self.normal * ((new_separating - separating) / total_inverse_mass);
        for (slot, sign) in [(0, 1.0), (1, -1.0)] {
            if let Some(particle) = self.particles[slot].and_then(|id| particles.get_mut(id)) {
                particle.velocity += impulse_per_inverse_mass * (particle.inverse_mass() * sign);
            }
        }
    }

    fn resolve_interpenetration(&mut self, particles: &mut Arena<Particle>) {
        self.movement = [Vec3::ZERO; 2];
        if self.penetration <= 0.0 {
            return;
        }

        let total_inverse_mass = self.total_inverse_mass(particles);
        if total_inverse_mass <= 0.0 {
            return;
        }

        let move_per_inverse_mass = self.normal * (self.penetration / total_inverse_mass);
        for (slot, sign) in [(0, 1.0), (1, -1.0)] {
            if let Some(particle) = self.particles[slot].and_then(|id| particles.get_mut(id)) {
                self.movement[slot] = move_per_inverse_mass * (particle.inverse_mass() * sign);
                particle.position += self.movement[slot];
            }
        }
    }
}

/// Source of particle contacts: links, constraints, ground planes.
pub trait ParticleContactGenerator: Send + Sync {
    /// Appends at most `limit` contacts and returns how many were added.
    fn add_contact(&self, particles: &Arena<Particle>, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize;
}

/// Repeatedly resolves the contact with the most negative separating
/// velocity among those closing or penetrating.
#[derive(Debug, Clone)]
pub struct ParticleContactResolver {
    pub iterations: usize,
    iterations_used: usize,
}

impl ParticleContactResolver {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            iterations_used: 0,
        }
    }

    pub fn set_iterations(&mut self, iterations: usize) {
        self.iterations = iterations;
    }

    pub fn iterations_used(&self) -> usize {
        self.iterations_used
    }

    pub fn resolve_contacts(&mut self, contacts: &mut [ParticleContact], particles: &mut Arena<Particle>, dt: f32) {
        self.iterations_used = 0;
        if contacts.is_empty() {
            return;
        }

        while self.iterations_used < self.iterations {
            let mut max = f32::MAX;
            let mut max_index = None;
            for (index, contact) in contacts.iter().enumerate() {
                let separating = contact.separating_velocity(particles);
                if separating < max && (separating < 0.0 || contact.penetration > 0.0) {
                    max = separating;
                    max_index = Some(index);
                }
            }
            let Some(index) = max_index else {
                break;
            };

            contacts[index].resolve(particles, dt);

            let moved = contacts[index].particles;
            let movement = contacts[index].movement();
            for contact in contacts.iter_mut() {
                for (slot, sign) in [(0, -1.0), (1, 1.0)] {
                    let Some(id) = contact.particles[slot] else {
                        continue;
                    };
                    if let Some(which) = moved.iter().position(|m| *m == Some(id)) {
                        contact.penetration += sign * movement[which].dot(contact.normal);
                    }
                }
            }

            self.iterations_used += 1;
        }

        log_iteration_usage("particles::contacts", self.iterations_used, self.iterations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equal_masses_swap_velocities_head_on() {
        let mut particles = Arena::new();
        let a = particles.insert(Particle::new(Vec3::new(-0.5, 0.0, 0.0), 1.0).with_velocity(Vec3::new(2.0, 0.0, 0.0)));
        let b = particles.insert(Particle::new(Vec3::new(0.5, 0.0, 0.0), 1.0).with_velocity(Vec3::new(-1.0, 0.0, 0.0)));

        let mut contacts = vec![ParticleContact::new(a, Some(b), -Vec3::X, 0.0).with_restitution(1.0)];
        let mut resolver = ParticleContactResolver::new(4);
        resolver.resolve_contacts(&mut contacts, &mut particles, 0.01);

        let va = particles.get(a).map(|p| p.velocity).unwrap_or_default();
        let vb = particles.get(b).map(|p| p.velocity).unwrap_or_default();
        assert_abs_diff_eq!(va, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(vb, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(va + vb, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(resolver.iterations_used(), 1);
    }

    #[test]
    fn penetration_split_by_inverse_mass() {
        let mut particles = Arena::new();
        let light = particles.insert(Particle::new(Vec3::ZERO, 1.0));
        let heavy = particles.insert(Particle::new(Vec3::new(0.0, 0.1, 0.0), 3.0));

        let mut contact = ParticleContact::new(light, Some(heavy), -Vec3::Y, 0.4);
        contact.resolve(&mut particles, 0.01);

        let [moved_light, moved_heavy] = contact.movement();
        assert_abs_diff_eq!(moved_light, Vec3::new(0.0, -0.3, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(moved_heavy, Vec3::new(0.0, 0.1, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(particles.get(heavy).map(|p| p.position.y).unwrap_or_default(), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn stale_movement_is_cleared() {
        let mut particles = Arena::new();
        let p = particles.insert(Particle::new(Vec3::ZERO, 1.0).with_velocity(Vec3::new(0.0, -1.0, 0.0)));

        let mut contact = ParticleContact::new(p, None, Vec3::Y, 0.2);
        contact.resolve(&mut particles, 0.01);
        assert_ne!(contact.movement()[0], Vec3::ZERO);

        contact.penetration = 0.0;
        contact.resolve(&mut particles, 0.01);
        assert_eq!(contact.movement(), [Vec3::ZERO; 2]);
    }

    #[test]
    fn resting_contact_absorbs_gravity_build_up() {
        let mut particles = Arena::new();
        let dt = 0.1;
        let gravity = Vec3::new(0.0, -10.0, 0.0);
        let p = particles.insert(
            Particle::new(Vec3::ZERO, 1.0)
                .with_acceleration(gravity)
                .with_velocity(gravity * dt),
        );

        let mut contact = ParticleContact::new(p, None, Vec3::Y, 0.0).with_restitution(0.5);
        contact.resolve(&mut particles, dt);
        assert_abs_diff_eq!(particles.get(p).map(|p| p.velocity.y).unwrap_or(-1.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn resolver_updates_shared_penetration() {
        let mut particles = Arena::new();
        let p = particles.insert(Particle::new(Vec3::ZERO, 1.0));
        let mut contacts = vec![
            ParticleContact::new(p, None, Vec3::Y, 0.3),
            ParticleContact::new(p, None, Vec3::Y, 0.1),
        ];

        let mut resolver = ParticleContactResolver::new(10);
        resolver.resolve_contacts(&mut contacts, &mut particles, 0.01);

        assert_abs_diff_eq!(contacts[0].penetration, 0.0, epsilon = 1e-6);
        assert!(contacts[1].penetration <= 0.0);
        assert_abs_diff_eq!(particles.get(p).map(|p| p.position.y).unwrap_or_default(), 0.3, epsilon = 1e-6);
    }
}
