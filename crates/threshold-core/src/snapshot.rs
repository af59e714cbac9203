//! Read-only views of the landscape for inspection and reporting.

use serde::{Deserialize, Serialize};
use threshold_logic::geometry::Vec3;
use threshold_logic::grid::Cell;
use threshold_logic::population::Label;
use threshold_logic::satisfaction::SatisfactionState;
use threshold_logic::zone::Zone;

use crate::components::{ActorId, Phase};
use crate::registry::{RoomCounts, RoomId, RoomState};
use crate::stats::SimStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub id: RoomId,
    pub cell: Cell,
    pub zone: u32,
    pub state: RoomState,
    pub cooling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorView {
    pub id: ActorId,
    pub label: Label,
    pub bias: f32,
    pub phase: Phase,
    pub position: Option<Vec3>,
    pub cell: Option<Cell>,
    /// Room occupied, if resting.
    pub room: Option<RoomId>,
    /// Room reserved, if chasing one.
    pub reserved: Option<RoomId>,
    pub mood: SatisfactionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub time: f64,
    pub counts: RoomCounts,
    pub rooms: Vec<RoomView>,
    pub actors: Vec<ActorView>,
    pub zones: Vec<Zone>,
    pub stats: SimStats,
}

impl SimSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorView> {
        self.actors.iter().find(|a| a.id == id)
    }

    /// Fraction of actors currently resting.
    pub fn resting_share(&self) -> f32 {
        if self.actors.is_empty() {
            return 0.0;
        }
        let resting = self
            .actors
            .iter()
            .filter(|a| a.phase == Phase::Resting)
            .count();
        resting as f32 / self.actors.len() as f32
    }
}
