//! Contact model, contact resolution, joints and force generators.

pub mod contact;
pub mod forces;
pub mod joints;
pub mod resolver;

pub use contact::{BodyChange, Contact};
pub use forces::{ForceGenerator, ForceRegistry, Gravity};
pub use joints::{ContactGenerator, Joint};
pub use resolver::ContactResolver;
