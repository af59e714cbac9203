//! Running counters for a landscape run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub reservations_granted: u64,
    pub reservations_denied: u64,
    pub reservations_expired: u64,
    /// Arrivals that found the room occupied by someone else.
    pub arrivals_contended: u64,
    /// Arrivals whose reservation had already expired or moved on.
    pub arrivals_lost: u64,
    pub stuck_recoveries: u64,
    pub move_failures: u64,
    pub rests_completed: u64,
    pub forced_leaves: u64,
    pub zones_closed: u64,
    pub spawn_failures: u64,
}

impl SimStats {
    /// Every way an attempt to get into a room can fail.
    pub fn failed_attempts(&self) -> u64 {
        self.reservations_denied
            + self.reservations_expired
            + self.arrivals_contended
            + self.arrivals_lost
    }
}
