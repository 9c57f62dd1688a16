//! Error types for the physics core.
//!
//! Numeric degeneracies inside a step are never errors; only invalid input
//! supplied by the host surfaces as a [`PhysicsError`].

use std::fmt;

use crate::utils::allocator::{BodyId, ParticleId};

#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// The supplied tensor has no usable inverse.
    SingularInertiaTensor,
    /// The supplied tensor is not a physical inertia tensor.
    InvalidInertiaTensor(String),
    /// A [`SimulationConfig`](crate::config::SimulationConfig) value is out of range.
    InvalidConfig(String),
    UnknownBody(BodyId),
    UnknownParticle(ParticleId),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SingularInertiaTensor => write!(f, "Inertia tensor is singular"),
            Self::InvalidInertiaTensor(msg) => write!(f, "Invalid inertia tensor: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "Invalid simulation config: {msg}"),
            Self::UnknownBody(id) => write!(f, "Unknown body {id}"),
            Self::UnknownParticle(id) => write!(f, "Unknown particle {id}"),
        }
    }
}

impl std::error::Error for PhysicsError {}

/// Convenient Result type alias for physics operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::BodyId;

    #[test]
    fn test_error_display() {
        let err = PhysicsError::InvalidConfig("sleep_epsilon must be positive".to_string());
        assert!(err.to_string().contains("sleep_epsilon"));

        let err = PhysicsError::UnknownBody(BodyId::new(3, 1));
        assert_eq!(err.to_string(), "Unknown body #3v1");
    }
}
