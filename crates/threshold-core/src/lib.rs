//! Threshold Core - Room Leasing Landscape Engine
//!
//! An ECS-based simulation of actors that alternate between resting in
//! single-occupant rooms and wandering the road network between them.
//! Rooms are leased through a reservation protocol with timeouts and
//! cooldowns so that actors competing for the same room never collide.
//!
//! # Architecture
//!
//! - **Entities**: actors, stored in a `hecs` world
//! - **Components**: lifecycle phase, reservation, occupancy, egress,
//!   wander orders, cooldowns, mood
//! - **Registry**: the fixed room pool, the only shared mutable structure
//! - **Systems**: per-tick logic run by [`engine::SimulationEngine::advance`]
//!
//! Movement and presentation are external collaborators expressed as
//! traits ([`movement::MovementService`], [`presentation::PresentationSink`]);
//! a straight-line mover and a null sink are provided for headless runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use threshold_core::prelude::*;
//! use threshold_logic::config::SimConfig;
//!
//! let mut engine = SimulationEngine::headless(SimConfig::default()).unwrap();
//! engine.reset();
//!
//! loop {
//!     engine.advance(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod components;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod lease;
pub mod movement;
pub mod presentation;
pub mod registry;
pub mod snapshot;
pub mod stats;
pub mod systems;
pub mod zones;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::SimulationEngine;
    pub use crate::error::SimError;
    pub use crate::movement::{MovementService, StraightLineMover};
    pub use crate::presentation::{NullSink, PresentationSink, RecordingSink};
    pub use crate::registry::{RoomId, RoomRegistry, RoomState};
}
