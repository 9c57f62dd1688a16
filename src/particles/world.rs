use std::sync::Arc;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{
    contact::{ParticleContact, ParticleContactGenerator, ParticleContactResolver},
    forces::{ParticleForceGenerator, ParticleForceRegistry},
};
use crate::{
    config::{SimulationConfig, PARTICLE_ITERATIONS_PER_CONTACT},
    core::Particle,
    error::{PhysicsError, Result},
    utils::{
        allocator::{Arena, ParticleId},
        logging::ScopedTimer,
    },
};

/// Mass-aggregate simulation: particles, their force registrations and the
/// contact generators that link them.
pub struct ParticleWorld {
    particles: Arena<Particle>,
    registry: ParticleForceRegistry,
    resolver: ParticleContactResolver,
    generators: Vec<Box<dyn ParticleContactGenerator>>,
    contacts: Vec<ParticleContact>,
    max_contacts: usize,
    calculate_iterations: bool,
    parallel_enabled: bool,
}

impl ParticleWorld {
    /// `config.iterations == 0` grants two resolver iterations per contact
    /// each step.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            particles: Arena::new(),
            registry: ParticleForceRegistry::new(),
            resolver: ParticleContactResolver::new(config.iterations),
            generators: Vec::new(),
            contacts: Vec::with_capacity(config.max_contacts),
            max_contacts: config.max_contacts,
            calculate_iterations: config.iterations == 0,
            parallel_enabled: false,
        })
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled;
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        self.particles.insert(particle)
    }

    /// Removes the particle and its force registrations. Contact generators
    /// that still name it simply stop producing contacts for it.
    pub fn remove_particle(&mut self, id: ParticleId) -> Result<Particle> {
        let particle = self.particles.remove(id).ok_or(PhysicsError::UnknownParticle(id))?;
        self.registry.remove_particle(id);
        Ok(particle)
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    pub fn particles(&self) -> &Arena<Particle> {
        &self.particles
    }

    pub fn add_force(&mut self, id: ParticleId, generator: Arc<dyn ParticleForceGenerator>) -> Result<()> {
        if !self.particles.contains(id) {
            return Err(PhysicsError::UnknownParticle(id));
        }
        self.registry.add(id, generator);
        Ok(())
    }

    pub fn force_registry_mut(&mut self) -> &mut ParticleForceRegistry {
        &mut self.registry
    }

    pub fn add_contact_generator<G: ParticleContactGenerator + 'static>(&mut self, generator: G) {
        self.generators.push(Box::new(generator));
    }

    /// Contacts generated by the most recent step.
    pub fn contacts(&self) -> &[ParticleContact] {
        &self.contacts
    }

    pub fn resolver(&self) -> &ParticleContactResolver {
        &self.resolver
    }

    /// Clears every force accumulator. Call before adding per-frame forces.
    pub fn start_frame(&mut self) {
        for particle in self.particles.iter_mut() {
            particle.clear_accumulator();
        }
    }

    /// Refills the contact buffer from every generator, stopping once it is
    /// full. Returns the number of contacts generated.
    pub fn generate_contacts(&mut self) -> usize {
        self.contacts.clear();
        let mut limit = self.max_contacts;
        for generator in &self.generators {
            let used = generator.add_contact(&self.particles, &mut self.contacts, limit);
            limit = limit.saturating_sub(used);
            if limit == 0 {
                debug!("particle contact buffer full ({} contacts)", self.max_contacts);
                break;
            }
        }
        self.contacts.len()
    }

    pub fn integrate(&mut self, dt: f32) {
        #[cfg(feature = "parallel")]
        {
            if self.parallel_enabled {
                self.particles.par_iter_mut().for_each(|particle| particle.integrate(dt));
                return;
            }
        }

        for particle in self.particles.iter_mut() {
            particle.integrate(dt);
        }
    }

    /// Forces, integration, contact generation and resolution for one step.
    pub fn run_physics(&mut self, dt: f32) {
        let _timer = ScopedTimer::new("particles::step");

        self.registry.update_forces(&mut self.particles, dt);
        self.integrate(dt);

        let used = self.generate_contacts();
        if used > 0 {
            if self.calculate_iterations {
                self.resolver.set_iterations(used * PARTICLE_ITERATIONS_PER_CONTACT);
            }
            self.resolver.resolve_contacts(&mut self.contacts, &mut self.particles, dt);
        }
    }
}
