//! Collision detection: primitives, broad-phase hierarchy and contact generation.

pub mod bounding;
pub mod bvh;
pub mod collision_data;
pub mod intersection;
pub mod narrowphase;
pub mod primitives;

pub use bounding::{BoundingBox, BoundingSphere, BoundingVolume};
pub use bvh::{Bvh, BvhNode, PotentialContact};
pub use collision_data::CollisionData;
pub use intersection::IntersectionTests;
pub use narrowphase::CollisionDetector;
pub use primitives::{CollisionBox, CollisionPlane, CollisionPrimitive, CollisionSphere};
