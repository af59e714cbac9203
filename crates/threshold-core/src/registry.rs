//! Room registry - the fixed pool of single-occupant rooms.
//!
//! Built once from the grid: one slot per room cell, numbered densely in
//! x-major order. Each slot is exactly one of Free, Reserved or Occupied;
//! a Free slot may additionally be cooling down, in which case it is not
//! advertised to reservation requests until the cooldown passes.
//!
//! The registry is the only state shared between actors. Every mutating
//! method takes `&mut self`, so each one is a critical section by
//! construction. The reservation protocol built on top lives in
//! [`crate::lease`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use threshold_logic::geometry::Vec3;
use threshold_logic::grid::{Cell, Grid};
use threshold_logic::zone::ZoneLayout;

use crate::components::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub u32);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoomState {
    Free,
    Reserved { by: ActorId, expires_at: f64 },
    Occupied { by: ActorId },
}

impl RoomState {
    pub fn holder(&self) -> Option<ActorId> {
        match self {
            RoomState::Free => None,
            RoomState::Reserved { by, .. } | RoomState::Occupied { by } => Some(*by),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSlot {
    pub id: RoomId,
    pub cell: Cell,
    /// World-space center.
    pub position: Vec3,
    pub zone: u32,
    pub state: RoomState,
    /// Not advertised as free before this time.
    pub cooldown_until: Option<f64>,
}

impl RoomSlot {
    pub fn is_cooling(&self, now: f64) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    pub fn is_free(&self, now: f64) -> bool {
        self.state == RoomState::Free && !self.is_cooling(now)
    }

    pub(crate) fn extend_cooldown(&mut self, until: f64) {
        let current = self.cooldown_until.unwrap_or(f64::NEG_INFINITY);
        self.cooldown_until = Some(current.max(until));
    }
}

/// Snapshot of registry occupancy.
///
/// `vacant + reserved + occupied == total` always holds; `available` is the
/// subset of vacant rooms not cooling down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCounts {
    pub total: usize,
    pub vacant: usize,
    pub available: usize,
    pub reserved: usize,
    pub occupied: usize,
}

#[derive(Debug, Clone)]
pub struct RoomRegistry {
    pub(crate) rooms: Vec<RoomSlot>,
    by_cell: HashMap<Cell, RoomId>,
}

impl RoomRegistry {
    /// Build the pool from every room cell of `grid`.
    pub fn build(grid: &Grid, zones: &ZoneLayout) -> Self {
        let rooms: Vec<RoomSlot> = grid
            .room_cells()
            .into_iter()
            .enumerate()
            .map(|(i, cell)| RoomSlot {
                id: RoomId(i as u32),
                cell,
                position: grid.cell_center(cell),
                zone: zones.zone_of(cell),
                state: RoomState::Free,
                cooldown_until: None,
            })
            .collect();
        let by_cell = rooms.iter().map(|r| (r.cell, r.id)).collect();
        Self { rooms, by_cell }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoomSlot> {
        self.rooms.iter()
    }

    pub fn slot(&self, id: RoomId) -> Option<&RoomSlot> {
        self.rooms.get(id.0 as usize)
    }

    pub(crate) fn slot_mut(&mut self, id: RoomId) -> Option<&mut RoomSlot> {
        self.rooms.get_mut(id.0 as usize)
    }

    /// World-space center of a room.
    pub fn position(&self, id: RoomId) -> Option<Vec3> {
        self.slot(id).map(|r| r.position)
    }

    pub fn state(&self, id: RoomId) -> Option<RoomState> {
        self.slot(id).map(|r| r.state)
    }

    pub fn room_at(&self, cell: Cell) -> Option<RoomId> {
        self.by_cell.get(&cell).copied()
    }

    /// No occupant, no reservation, cooldown passed.
    pub fn is_free(&self, id: RoomId, now: f64) -> bool {
        self.slot(id).is_some_and(|r| r.is_free(now))
    }

    /// Unconditionally mark `actor` as the occupant, replacing any
    /// reservation. The caller is responsible for eligibility.
    pub fn occupy(&mut self, id: RoomId, actor: ActorId) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.state = RoomState::Occupied { by: actor };
                true
            }
            None => false,
        }
    }

    /// Clear the occupant if it is `actor`, then hold the room back for
    /// `grace` seconds. Returns whether anything was vacated.
    pub fn vacate(&mut self, id: RoomId, actor: ActorId, now: f64, grace: f32) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        if slot.state != (RoomState::Occupied { by: actor }) {
            return false;
        }
        slot.state = RoomState::Free;
        if grace > 0.0 {
            slot.extend_cooldown(now + grace as f64);
        }
        true
    }

    /// Hold a room back from reservation until `until`.
    pub fn begin_cooldown(&mut self, id: RoomId, until: f64) {
        if let Some(slot) = self.slot_mut(id) {
            slot.extend_cooldown(until);
        }
    }

    /// Drop every claim `actor` has on any room. Occupied rooms get the
    /// usual vacate grace. Returns the rooms touched.
    pub fn release_actor(&mut self, actor: ActorId, now: f64, grace: f32) -> Vec<RoomId> {
        let mut released = Vec::new();
        for slot in self.rooms.iter_mut() {
            match slot.state {
                RoomState::Reserved { by, .. } if by == actor => {
                    slot.state = RoomState::Free;
                    released.push(slot.id);
                }
                RoomState::Occupied { by } if by == actor => {
                    slot.state = RoomState::Free;
                    if grace > 0.0 {
                        slot.extend_cooldown(now + grace as f64);
                    }
                    released.push(slot.id);
                }
                _ => {}
            }
        }
        released
    }

    pub fn counts(&self, now: f64) -> RoomCounts {
        let mut counts = RoomCounts {
            total: self.rooms.len(),
            ..Default::default()
        };
        for slot in &self.rooms {
            match slot.state {
                RoomState::Free => {
                    counts.vacant += 1;
                    if !slot.is_cooling(now) {
                        counts.available += 1;
                    }
                }
                RoomState::Reserved { .. } => counts.reserved += 1,
                RoomState::Occupied { .. } => counts.occupied += 1,
            }
        }
        counts
    }

    /// Return every room to Free with no cooldown.
    pub fn reset(&mut self) {
        for slot in self.rooms.iter_mut() {
            slot.state = RoomState::Free;
            slot.cooldown_until = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threshold_logic::grid::GridSpec;

    fn registry() -> RoomRegistry {
        let grid = Grid::new(&GridSpec::default()).unwrap();
        let layout = ZoneLayout::new(&grid, 4);
        RoomRegistry::build(&grid, &layout)
    }

    #[test]
    fn test_build_one_slot_per_room_cell() {
        let reg = registry();
        assert_eq!(reg.len(), 144);
        let first = reg.slot(RoomId(0)).unwrap();
        assert_eq!(first.cell, Cell::new(1, 1));
        assert_eq!(first.position, Vec3::new(1.0, 0.5, -1.0));
        assert_eq!(reg.room_at(Cell::new(1, 1)), Some(RoomId(0)));
        assert_eq!(reg.room_at(Cell::new(0, 0)), None);
        assert_eq!(reg.counts(0.0).available, 144);
    }

    #[test]
    fn test_occupy_and_vacate_with_grace() {
        let mut reg = registry();
        let room = RoomId(3);
        assert!(reg.occupy(room, ActorId(1)));
        assert!(!reg.is_free(room, 0.0));

        // Only the occupant can vacate.
        assert!(!reg.vacate(room, ActorId(2), 1.0, 0.4));
        assert!(reg.vacate(room, ActorId(1), 1.0, 0.4));

        assert!(!reg.is_free(room, 1.2));
        assert!(reg.is_free(room, 1.5));
    }

    #[test]
    fn test_counts_conserve_total() {
        let mut reg = registry();
        reg.occupy(RoomId(0), ActorId(1));
        reg.occupy(RoomId(1), ActorId(2));
        reg.vacate(RoomId(1), ActorId(2), 0.0, 1.0);
        reg.slot_mut(RoomId(2)).unwrap().state = RoomState::Reserved {
            by: ActorId(3),
            expires_at: 9.0,
        };

        let c = reg.counts(0.5);
        assert_eq!(c.occupied, 1);
        assert_eq!(c.reserved, 1);
        assert_eq!(c.vacant, 142);
        assert_eq!(c.available, 141);
        assert_eq!(c.vacant + c.reserved + c.occupied, c.total);
    }

    #[test]
    fn test_release_actor_clears_everything() {
        let mut reg = registry();
        reg.occupy(RoomId(0), ActorId(7));
        reg.slot_mut(RoomId(5)).unwrap().state = RoomState::Reserved {
            by: ActorId(7),
            expires_at: 3.0,
        };
        reg.occupy(RoomId(6), ActorId(8));

        let released = reg.release_actor(ActorId(7), 0.0, 0.0);
        assert_eq!(released, vec![RoomId(0), RoomId(5)]);
        assert_eq!(reg.state(RoomId(6)), Some(RoomState::Occupied { by: ActorId(8) }));
        assert_eq!(reg.counts(0.0).occupied, 1);
    }

    #[test]
    fn test_reset_clears_cooldowns() {
        let mut reg = registry();
        reg.occupy(RoomId(0), ActorId(1));
        reg.begin_cooldown(RoomId(1), 100.0);
        reg.reset();
        let c = reg.counts(0.0);
        assert_eq!(c.available, c.total);
    }
}
