//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to actor entities.
//! They have no behavior - that lives in systems.

mod actor;
mod orders;

pub use actor::*;
pub use orders::*;
