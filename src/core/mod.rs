//! Simulated entities: rigid bodies and point particles.

pub mod particle;
pub mod rigidbody;

pub use particle::Particle;
pub use rigidbody::RigidBody;
