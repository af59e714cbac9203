//! Presentation sink - fire-and-forget visual state for a rendering host.

use serde::{Deserialize, Serialize};
use threshold_logic::satisfaction::SatisfactionState;

use crate::components::ActorId;

pub trait PresentationSink {
    fn set_occupancy_visual(&mut self, actor: ActorId, in_room: bool);

    fn set_satisfaction_visual(&mut self, actor: ActorId, state: SatisfactionState);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn set_occupancy_visual(&mut self, _actor: ActorId, _in_room: bool) {}

    fn set_satisfaction_visual(&mut self, _actor: ActorId, _state: SatisfactionState) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualEvent {
    Occupancy { actor: ActorId, in_room: bool },
    Satisfaction { actor: ActorId, state: SatisfactionState },
}

/// Keeps every event, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<VisualEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_for(&self, actor: ActorId) -> impl Iterator<Item = &VisualEvent> {
        self.events.iter().filter(move |e| match e {
            VisualEvent::Occupancy { actor: a, .. } | VisualEvent::Satisfaction { actor: a, .. } => {
                *a == actor
            }
        })
    }
}

impl PresentationSink for RecordingSink {
    fn set_occupancy_visual(&mut self, actor: ActorId, in_room: bool) {
        self.events.push(VisualEvent::Occupancy { actor, in_room });
    }

    fn set_satisfaction_visual(&mut self, actor: ActorId, state: SatisfactionState) {
        self.events.push(VisualEvent::Satisfaction { actor, state });
    }
}
