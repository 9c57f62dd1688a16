//! Utility helpers: math extensions, the generational arena, and logging.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, ArenaId, ArenaItem, BodyId, ColliderId, GenerationalId, Handle, NodeId, ParticleId};
pub use math::*;
