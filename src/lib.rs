//! Impulse Forge – rigid-body and particle physics for Rust.
//!
//! The crate is built around an iterative, impulse-based contact pipeline:
//! a bounding volume hierarchy culls pairs, narrow-phase tests turn
//! overlapping primitives into contacts, and a priority-ordered resolver
//! removes interpenetration and applies bounce and friction. A lighter
//! mass-aggregate particle simulation shares the same approach.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod particles;
pub mod utils;
pub mod world;

pub use glam::{Affine3A, Mat3, Mat4, Quat, Vec3};

pub use collision::{
    BoundingBox, BoundingSphere, BoundingVolume, Bvh, CollisionBox, CollisionData, CollisionDetector,
    CollisionPlane, CollisionPrimitive, CollisionSphere, IntersectionTests, PotentialContact,
};
pub use config::SimulationConfig;
pub use core::{Particle, RigidBody};
pub use dynamics::{Contact, ContactGenerator, ContactResolver, ForceGenerator, ForceRegistry, Gravity, Joint};
pub use error::{PhysicsError, Result};
pub use particles::{ParticleContact, ParticleContactResolver, ParticleWorld};
pub use utils::allocator::{Arena, ArenaId, ArenaItem, BodyId, ColliderId, GenerationalId, Handle, NodeId, ParticleId};
pub use world::{StepStats, World};

/// High-level convenience wrapper that owns a [`World`].
pub struct PhysicsEngine {
    world: World,
}

impl PhysicsEngine {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self {
            world: World::new(config)?,
        })
    }

    /// Adds a rigid body to the world and returns its [`BodyId`].
    pub fn add_body(&mut self, body: RigidBody) -> BodyId {
        self.world.add_body(body)
    }

    /// Attaches collision geometry; see [`World::add_collider`].
    pub fn add_collider(&mut self, primitive: impl Into<CollisionPrimitive>) -> Result<ColliderId> {
        self.world.add_collider(primitive)
    }

    /// Starts a frame and advances the simulation by `dt`.
    pub fn step(&mut self, dt: f32) {
        self.world.start_frame();
        self.world.run_physics(dt);
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.world.set_parallel_enabled(enabled);
    }

    pub fn parallel_enabled(&self) -> bool {
        self.world.parallel_enabled()
    }

    pub fn get_body(&self, id: BodyId) -> Option<&RigidBody> {
        self.world.body(id)
    }

    pub fn get_body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.world.body_mut(id)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
