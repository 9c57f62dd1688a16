use std::{collections::BTreeMap, sync::Arc};

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    collision::{
        bounding::{BoundingSphere, BoundingVolume},
        bvh::{Bvh, PotentialContact},
        collision_data::CollisionData,
        narrowphase::CollisionDetector,
        primitives::CollisionPrimitive,
    },
    config::{SimulationConfig, RIGID_ITERATIONS_PER_CONTACT},
    core::RigidBody,
    dynamics::{
        contact::Contact,
        forces::{ForceGenerator, ForceRegistry},
        joints::ContactGenerator,
        resolver::ContactResolver,
    },
    error::{PhysicsError, Result},
    utils::{
        allocator::{Arena, BodyId, ColliderId, NodeId},
        logging::ScopedTimer,
    },
};

/// Counters describing the most recent call to [`World::run_physics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub bodies_integrated: usize,
    pub potential_contacts: usize,
    pub contacts_generated: usize,
    pub position_iterations: usize,
    pub velocity_iterations: usize,
    /// A contact was dropped because the buffer was already full.
    pub saturated: bool,
}

/// Rigid-body simulation: bodies, their collision geometry, force and
/// contact generators, and the resolver that ties them together each step.
pub struct World {
    bodies: Arena<RigidBody>,
    colliders: Arena<CollisionPrimitive>,
    body_colliders: BTreeMap<BodyId, Vec<ColliderId>>,
    static_colliders: Vec<ColliderId>,
    leaves: BTreeMap<BodyId, NodeId>,
    bvh: Bvh<BoundingSphere>,
    registry: ForceRegistry,
    generators: Vec<Box<dyn ContactGenerator>>,
    resolver: ContactResolver,
    collision_data: CollisionData,
    potential: Vec<PotentialContact>,
    config: SimulationConfig,
    calculate_iterations: bool,
    stats: StepStats,
    parallel_enabled: bool,
}

impl World {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let resolver =
            ContactResolver::with_epsilons(config.iterations, config.velocity_epsilon, config.position_epsilon);

        Ok(Self {
            bodies: Arena::new(),
            colliders: Arena::new(),
            body_colliders: BTreeMap::new(),
            static_colliders: Vec::new(),
            leaves: BTreeMap::new(),
            bvh: Bvh::new(),
            registry: ForceRegistry::new(),
            generators: Vec::new(),
            resolver,
            collision_data: CollisionData::new(config.max_contacts)
                .with_material(config.friction, config.restitution),
            potential: Vec::with_capacity(config.max_potential_contacts),
            config,
            calculate_iterations: config.iterations == 0,
            stats: StepStats::default(),
            parallel_enabled: false,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled;
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    /// Registers a body, giving it this world's sleep threshold.
    pub fn add_body(&mut self, mut body: RigidBody) -> BodyId {
        body.set_sleep_epsilon(self.config.sleep_epsilon);
        body.calculate_derived_data();
        self.bodies.insert(body)
    }

    /// Removes a body together with its colliders, its broad-phase leaf and
    /// its force registrations.
    pub fn remove_body(&mut self, id: BodyId) -> Result<RigidBody> {
        let body = self.bodies.remove(id).ok_or(PhysicsError::UnknownBody(id))?;

        let colliders = self.body_colliders.remove(&id).unwrap_or_default();
        for collider in &colliders {
            self.colliders.remove(*collider);
        }
        if let Some(leaf) = self.leaves.remove(&id) {
            self.bvh.remove(leaf);
        }
        let registrations = self.registry.remove_body(id);

        debug!(
            "removed body {id} with {} colliders and {registrations} force registrations",
            colliders.len()
        );
        Ok(body)
    }

    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> &Arena<RigidBody> {
        &self.bodies
    }

    /// Attaches collision geometry. Primitives without a body (and planes)
    /// are static scenery tested against every dynamic collider.
    pub fn add_collider(&mut self, primitive: impl Into<CollisionPrimitive>) -> Result<ColliderId> {
        let mut primitive = primitive.into();
        let owner = primitive.body();
        if let Some(body) = owner {
            if !self.bodies.contains(body) {
                return Err(PhysicsError::UnknownBody(body));
            }
        }

        primitive.calculate_internals(&self.bodies);
        let id = self.colliders.insert(primitive);

        match owner {
            Some(body) => {
                self.body_colliders.entry(body).or_default().push(id);
                self.refresh_leaf(body);
            }
            None => self.static_colliders.push(id),
        }
        Ok(id)
    }

    pub fn remove_collider(&mut self, id: ColliderId) -> Option<CollisionPrimitive> {
        let primitive = self.colliders.remove(id)?;
        match primitive.body() {
            Some(body) => {
                if let Some(list) = self.body_colliders.get_mut(&body) {
                    list.retain(|c| *c != id);
                }
                self.refresh_leaf(body);
            }
            None => self.static_colliders.retain(|c| *c != id),
        }
        Some(primitive)
    }

    pub fn collider(&self, id: ColliderId) -> Option<&CollisionPrimitive> {
        self.colliders.get(id)
    }

    pub fn add_force(&mut self, body: BodyId, generator: Arc<dyn ForceGenerator>) -> Result<()> {
        if !self.bodies.contains(body) {
            return Err(PhysicsError::UnknownBody(body));
        }
        self.registry.add(body, generator);
        Ok(())
    }

    pub fn force_registry_mut(&mut self) -> &mut ForceRegistry {
        &mut self.registry
    }

    pub fn add_contact_generator<G: ContactGenerator + 'static>(&mut self, generator: G) {
        self.generators.push(Box::new(generator));
    }

    pub fn resolver(&self) -> &ContactResolver {
        &self.resolver
    }

    /// Contacts generated (and resolved) by the most recent step.
    pub fn contacts(&self) -> &[Contact] {
        self.collision_data.contacts()
    }

    pub fn stats(&self) -> StepStats {
        self.stats
    }

    /// Clears accumulators and refreshes derived data of every body.
    pub fn start_frame(&mut self) {
        for body in self.bodies.iter_mut() {
            body.clear_accumulators();
            body.calculate_derived_data();
        }
    }

    /// Advances the simulation by `dt`.
    pub fn run_physics(&mut self, dt: f32) {
        let _step_timer = ScopedTimer::new("world::step");
        let mut stats = StepStats::default();

        {
            let _timer = ScopedTimer::new("forces::update");
            self.registry.update_forces(&mut self.bodies, dt);
        }
        {
            let _timer = ScopedTimer::new("integrator");
            stats.bodies_integrated = self.bodies.iter().filter(|b| b.is_awake()).count();
            self.integrate(dt);
        }

        stats.contacts_generated = {
            let _timer = ScopedTimer::new("contacts::generate");
            self.generate_contacts()
        };
        stats.potential_contacts = self.potential.len();
        stats.saturated = self.collision_data.overflowed();

        if stats.contacts_generated > 0 {
            let _timer = ScopedTimer::new("contacts::resolve");
            if self.calculate_iterations {
                let iterations = stats.contacts_generated * RIGID_ITERATIONS_PER_CONTACT;
                self.resolver.set_iterations(iterations, iterations);
            }
            self.resolver
                .resolve_contacts(self.collision_data.contacts_mut(), &mut self.bodies, dt);
            stats.position_iterations = self.resolver.position_iterations_used();
            stats.velocity_iterations = self.resolver.velocity_iterations_used();
        }

        for body in self.bodies.iter_mut() {
            body.calculate_derived_data();
        }
        self.stats = stats;
    }

    /// Runs the broad phase, the narrow phase and every contact generator
    /// into the world's contact buffer. Returns the number of contacts.
    pub fn generate_contacts(&mut self) -> usize {
        self.collision_data.reset();

        for collider in self.colliders.iter_mut() {
            collider.calculate_internals(&self.bodies);
        }
        let dynamic: Vec<BodyId> = self.leaves.keys().copied().collect();
        for body in dynamic {
            self.refresh_leaf(body);
        }

        self.potential.clear();
        self.bvh
            .potential_contacts(&mut self.potential, self.config.max_potential_contacts);

        'pairs: for pair in &self.potential {
            let [first, second] = pair.bodies;
            if immovable(&self.bodies, first) && immovable(&self.bodies, second) {
                continue;
            }
            let (Some(a), Some(b)) = (self.body_colliders.get(&first), self.body_colliders.get(&second)) else {
                continue;
            };
            for one in a {
                for two in b {
                    if self.collision_data.overflowed() {
                        break 'pairs;
                    }
                    if let (Some(one), Some(two)) = (self.colliders.get(*one), self.colliders.get(*two)) {
                        CollisionDetector::collide(one, two, &mut self.collision_data);
                    }
                }
            }
        }

        'statics: for scenery in &self.static_colliders {
            let Some(scenery) = self.colliders.get(*scenery) else {
                continue;
            };
            for (body, colliders) in &self.body_colliders {
                if immovable(&self.bodies, *body) {
                    continue;
                }
                for dynamic in colliders {
                    if self.collision_data.overflowed() {
                        break 'statics;
                    }
                    if let Some(dynamic) = self.colliders.get(*dynamic) {
                        CollisionDetector::collide(dynamic, scenery, &mut self.collision_data);
                    }
                }
            }
        }

        for generator in &self.generators {
            if self.collision_data.overflowed() {
                break;
            }
            generator.add_contact(&self.bodies, &mut self.collision_data);
        }

        if self.collision_data.overflowed() {
            debug!(
                "contact buffer full ({} contacts); later contacts dropped this step",
                self.collision_data.max_contacts()
            );
        }
        self.collision_data.contact_count()
    }

    fn integrate(&mut self, dt: f32) {
        #[cfg(feature = "parallel")]
        {
            if self.parallel_enabled {
                self.bodies.par_iter_mut().for_each(|body| body.integrate(dt));
                return;
            }
        }

        for body in self.bodies.iter_mut() {
            body.integrate(dt);
        }
    }

    /// Bounding sphere around every collider of `body`.
    fn body_volume(&self, body: BodyId) -> Option<BoundingSphere> {
        self.body_colliders
            .get(&body)?
            .iter()
            .filter_map(|id| self.colliders.get(*id)?.bounding_sphere())
            .map(|(centre, radius)| BoundingSphere::new(centre, radius))
            .reduce(|a, b| BoundingSphere::enclosing(&a, &b))
    }

    /// Inserts, refits or drops the broad-phase leaf of `body`.
    fn refresh_leaf(&mut self, body: BodyId) {
        match (self.body_volume(body), self.leaves.get(&body).copied()) {
            (Some(volume), Some(leaf)) => {
                self.bvh.update_volume(leaf, volume);
            }
            (Some(volume), None) => {
                let leaf = self.bvh.insert(body, volume);
                self.leaves.insert(body, leaf);
            }
            (None, Some(leaf)) => {
                self.bvh.remove(leaf);
                self.leaves.remove(&body);
            }
            (None, None) => {}
        }
    }
}

/// Fixed bodies, and bodies that no longer exist, cannot be pushed apart.
fn immovable(bodies: &Arena<RigidBody>, id: BodyId) -> bool {
    bodies.get(id).map_or(true, |body| !body.has_finite_mass())
}
