//! Mass-aggregate particle simulation: contacts, links, forces and the particle world.

pub mod contact;
pub mod forces;
pub mod links;
pub mod world;

pub use contact::{ParticleContact, ParticleContactGenerator, ParticleContactResolver};
pub use forces::{ParticleForceGenerator, ParticleForceRegistry};
pub use links::{GroundContacts, ParticleCable, ParticleCableConstraint, ParticleRod, ParticleRodConstraint};
pub use world::ParticleWorld;
