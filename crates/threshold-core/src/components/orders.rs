//! Transient order and timer components.
//!
//! Every wait in the actor lifecycle is one of these components carrying an
//! absolute simulation-time deadline. Systems compare deadlines against the
//! clock once per tick; nothing ever blocks.

use serde::{Deserialize, Serialize};
use threshold_logic::geometry::Vec3;

use crate::registry::RoomId;

/// Present while the actor holds a reservation it has not yet converted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub room: RoomId,
    pub target: Vec3,
    pub expires_at: f64,
}

/// Present while the actor occupies a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occupancy {
    pub room: RoomId,
    pub started_at: f64,
    pub hold: f32,
}

impl Occupancy {
    pub fn new(room: RoomId, started_at: f64, hold: f32) -> Self {
        Self {
            room,
            started_at,
            hold,
        }
    }

    pub fn is_complete(&self, now: f64) -> bool {
        now - self.started_at >= self.hold as f64
    }
}

/// Present while the actor walks out of a vacated room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Egress {
    pub target: Vec3,
    pub deadline: f64,
}

/// Present while the actor roams toward a road point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wander {
    pub target: Vec3,
    pub retarget_at: f64,
    /// No road target was reachable and the actor was stepped to the
    /// nearest road instead; only the timer picks the next target.
    pub fallback: bool,
}

impl Wander {
    pub fn should_retarget(&self, arrived: bool, now: f64) -> bool {
        now >= self.retarget_at || (arrived && !self.fallback)
    }
}

/// Earliest time the actor may request a reservation again.
///
/// Set by the personal cooldown after leaving a room and by the retry delay
/// after any failed attempt. Only ever extended, never shortened.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cooldown {
    pub until: f64,
}

impl Cooldown {
    pub fn is_active(&self, now: f64) -> bool {
        now < self.until
    }

    pub fn extend_to(&mut self, until: f64) {
        self.until = self.until.max(until);
    }
}

/// Tracks how long an actor with an active order has been standing still.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StallWatch {
    pub still_since: Option<f64>,
}

impl StallWatch {
    /// Feed one observation. Returns `true` once the actor has been still
    /// for longer than `threshold`, and re-arms the watch.
    pub fn observe(&mut self, still: bool, now: f64, threshold: f32) -> bool {
        if !still {
            self.still_since = None;
            return false;
        }
        match self.still_since {
            None => {
                self.still_since = Some(now);
                false
            }
            Some(since) if now - since > threshold as f64 => {
                self.still_since = None;
                true
            }
            Some(_) => false,
        }
    }

    pub fn reset(&mut self) {
        self.still_since = None;
    }
}
