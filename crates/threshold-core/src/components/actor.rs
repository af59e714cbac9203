//! Actor identity, lifecycle phase and mood.

use serde::{Deserialize, Serialize};
use threshold_logic::population::Label;
use threshold_logic::satisfaction::SatisfactionState;

use crate::registry::RoomId;

/// Stable actor handle shared with the movement service and presentation
/// sink. Unlike `hecs::Entity` it survives snapshots unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Actor component - who this is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub label: Label,
    /// Prejudice in [0, 1]; only meaningful for Main actors.
    pub bias: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No room held: chasing a reservation or wandering the roads.
    Moving,
    /// Parked inside a room until the hold timer runs out.
    Resting,
    /// Walking out to the road next to the room just vacated.
    Leaving,
}

/// Lifecycle component - always present on actors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub phase: Phase,
    /// Simulation time the current phase started.
    pub since: f64,
    /// Room vacated most recently; skipped by the next reservation attempt.
    pub last_room: Option<RoomId>,
}

impl Lifecycle {
    pub fn new(phase: Phase, now: f64) -> Self {
        Self {
            phase,
            since: now,
            last_room: None,
        }
    }

    pub fn enter(&mut self, phase: Phase, now: f64) {
        if self.phase != phase {
            self.phase = phase;
            self.since = now;
        }
    }
}

/// Mood component - last satisfaction classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mood(pub SatisfactionState);
