//! Reservation & lease protocol.
//!
//! Room lifecycle:
//!
//! ```text
//!   Free ──try_reserve──▶ Reserved(A) ──confirm_arrival──▶ Occupied(A)
//!    ▲                        │                                 │
//!    │◀──── expire (timeout) ─┘                                 │
//!    │◀──── grace cooldown ◀──────── vacate ────────────────────┘
//! ```
//!
//! `try_reserve` selects AND marks a room in the same call, so two requests
//! made in the same tick can never be handed the same room. Candidates are
//! shuffled uniformly; there is no FIFO or nearest-first preference.
//!
//! A reservation expires at `now + distance / speed + buffer`. Expiry is
//! swept once per tick before any actor logic runs.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use threshold_logic::geometry::Vec3;

use crate::components::ActorId;
use crate::registry::{RoomId, RoomRegistry, RoomSlot, RoomState};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LeaseError {
    #[error("{0} does not exist")]
    UnknownRoom(RoomId),
    #[error("{room} is already occupied by {occupant}")]
    Contended { room: RoomId, occupant: ActorId },
    #[error("{room} is no longer reserved for this actor")]
    NotHeld { room: RoomId, holder: Option<ActorId> },
}

/// Parameters of one reservation attempt.
#[derive(Debug, Clone, Copy)]
pub struct ReserveRequest {
    pub requester: ActorId,
    /// Where the requester stands now; used to estimate travel time.
    pub origin: Vec3,
    pub speed: f32,
    pub buffer: f32,
    pub excluding: Option<RoomId>,
    pub now: f64,
}

/// A successful reservation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub room: RoomId,
    pub position: Vec3,
    pub expires_at: f64,
}

/// A reservation that timed out during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expired {
    pub room: RoomId,
    pub actor: ActorId,
}

/// Deadline for converting a reservation: estimated travel plus buffer.
pub fn reservation_deadline(origin: Vec3, target: Vec3, speed: f32, buffer: f32, now: f64) -> f64 {
    let travel = if speed > 0.0 {
        origin.planar_distance(&target) / speed
    } else {
        0.0
    };
    now + travel as f64 + buffer as f64
}

impl RoomRegistry {
    /// Reserve a uniformly random eligible free room for the requester.
    ///
    /// `eligible` filters candidates (zone gates); `excluding` skips one
    /// room, typically the one the requester just left. Returns `None` when
    /// nothing qualifies, or when the requester already holds a room.
    pub fn try_reserve<R: Rng + ?Sized>(
        &mut self,
        request: &ReserveRequest,
        eligible: &dyn Fn(&RoomSlot) -> bool,
        rng: &mut R,
    ) -> Option<Grant> {
        if let Some(held) = self
            .rooms
            .iter()
            .find(|r| r.state.holder() == Some(request.requester))
        {
            log::warn!(
                "{} requested a room while still holding {}",
                request.requester,
                held.id
            );
            return None;
        }

        let mut candidates: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|r| r.is_free(request.now))
            .filter(|r| Some(r.id) != request.excluding)
            .filter(|r| eligible(r))
            .map(|r| r.id)
            .collect();
        candidates.shuffle(rng);

        for id in candidates {
            let Some(slot) = self.slot_mut(id) else {
                continue;
            };
            if !slot.is_free(request.now) {
                continue;
            }
            let expires_at = reservation_deadline(
                request.origin,
                slot.position,
                request.speed,
                request.buffer,
                request.now,
            );
            slot.state = RoomState::Reserved {
                by: request.requester,
                expires_at,
            };
            return Some(Grant {
                room: id,
                position: slot.position,
                expires_at,
            });
        }
        None
    }

    /// Convert `actor`'s reservation into occupancy on arrival.
    ///
    /// A room found occupied by someone else is put into a contention
    /// cooldown; the incumbent is never evicted.
    pub fn confirm_arrival(
        &mut self,
        room: RoomId,
        actor: ActorId,
        now: f64,
        contention_cooldown: f32,
    ) -> Result<(), LeaseError> {
        let slot = self.slot_mut(room).ok_or(LeaseError::UnknownRoom(room))?;
        match slot.state {
            RoomState::Reserved { by, .. } if by == actor => {
                slot.state = RoomState::Occupied { by: actor };
                Ok(())
            }
            RoomState::Occupied { by } if by == actor => Ok(()),
            RoomState::Occupied { by } => {
                slot.extend_cooldown(now + contention_cooldown as f64);
                Err(LeaseError::Contended {
                    room,
                    occupant: by,
                })
            }
            state => Err(LeaseError::NotHeld {
                room,
                holder: state.holder(),
            }),
        }
    }

    /// Cancel `actor`'s reservation on `room`. No-op for anyone else's.
    pub fn cancel_reservation(&mut self, room: RoomId, actor: ActorId) -> bool {
        match self.slot_mut(room) {
            Some(slot) if matches!(slot.state, RoomState::Reserved { by, .. } if by == actor) => {
                slot.state = RoomState::Free;
                true
            }
            _ => false,
        }
    }

    /// Free every reservation whose deadline has passed. Freed rooms are
    /// held back for `margin` seconds.
    pub fn expire_reservations(&mut self, now: f64, margin: f32) -> Vec<Expired> {
        let mut expired = Vec::new();
        for slot in self.rooms.iter_mut() {
            if let RoomState::Reserved { by, expires_at } = slot.state {
                if now >= expires_at {
                    slot.state = RoomState::Free;
                    if margin > 0.0 {
                        slot.extend_cooldown(now + margin as f64);
                    }
                    expired.push(Expired {
                        room: slot.id,
                        actor: by,
                    });
                }
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use threshold_logic::grid::{Grid, GridSpec};
    use threshold_logic::zone::ZoneLayout;

    fn registry() -> RoomRegistry {
        let grid = Grid::new(&GridSpec::default()).unwrap();
        let layout = ZoneLayout::new(&grid, 4);
        RoomRegistry::build(&grid, &layout)
    }

    fn request(actor: u32, now: f64) -> ReserveRequest {
        ReserveRequest {
            requester: ActorId(actor),
            origin: Vec3::new(0.0, 0.5, 0.0),
            speed: 2.0,
            buffer: 1.0,
            excluding: None,
            now,
        }
    }

    fn any(_: &RoomSlot) -> bool {
        true
    }

    #[test]
    fn test_reserve_marks_room() {
        let mut reg = registry();
        let mut rng = StdRng::seed_from_u64(1);
        let grant = reg.try_reserve(&request(1, 0.0), &any, &mut rng).unwrap();

        match reg.state(grant.room).unwrap() {
            RoomState::Reserved { by, expires_at } => {
                assert_eq!(by, ActorId(1));
                assert_eq!(expires_at, grant.expires_at);
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(!reg.is_free(grant.room, 0.0));
    }

    #[test]
    fn test_same_tick_requests_never_share_a_room() {
        let mut reg = registry();
        let mut rng = StdRng::seed_from_u64(9);
        let mut granted = HashSet::new();
        // More requesters than rooms.
        for actor in 0..200 {
            if let Some(grant) = reg.try_reserve(&request(actor, 0.0), &any, &mut rng) {
                assert!(granted.insert(grant.room), "{} granted twice", grant.room);
            }
        }
        assert_eq!(granted.len(), reg.len());
        assert_eq!(reg.counts(0.0).reserved, reg.len());
    }

    #[test]
    fn test_single_room_contention() {
        let mut reg = registry();
        let only = RoomId(10);
        let allow_one = |slot: &RoomSlot| slot.id == only;
        let mut rng = StdRng::seed_from_u64(4);

        let first = reg.try_reserve(&request(1, 0.0), &allow_one, &mut rng);
        let second = reg.try_reserve(&request(2, 0.0), &allow_one, &mut rng);
        assert_eq!(first.map(|g| g.room), Some(only));
        assert_eq!(second, None);
    }

    #[test]
    fn test_holder_cannot_reserve_twice() {
        let mut reg = registry();
        let mut rng = StdRng::seed_from_u64(2);
        assert!(reg.try_reserve(&request(1, 0.0), &any, &mut rng).is_some());
        assert!(reg.try_reserve(&request(1, 0.0), &any, &mut rng).is_none());
        assert_eq!(reg.counts(0.0).reserved, 1);
    }

    #[test]
    fn test_excluded_and_cooling_rooms_are_skipped() {
        let mut reg = registry();
        let mut rng = StdRng::seed_from_u64(3);
        let pair = |slot: &RoomSlot| slot.id == RoomId(0) || slot.id == RoomId(1);

        reg.begin_cooldown(RoomId(1), 5.0);
        let mut req = request(1, 0.0);
        req.excluding = Some(RoomId(0));
        assert!(reg.try_reserve(&req, &pair, &mut rng).is_none());

        req.now = 5.0;
        assert_eq!(reg.try_reserve(&req, &pair, &mut rng).map(|g| g.room), Some(RoomId(1)));
    }

    #[test]
    fn test_deadline_is_travel_plus_buffer() {
        let origin = Vec3::new(0.0, 0.5, 0.0);
        let target = Vec3::new(6.0, 0.5, -8.0);
        let deadline = reservation_deadline(origin, target, 2.0, 1.5, 10.0);
        assert!((deadline - 16.5).abs() < 1e-6);
    }

    #[test]
    fn test_confirm_arrival_paths() {
        let mut reg = registry();
        let mut rng = StdRng::seed_from_u64(5);
        let grant = reg.try_reserve(&request(1, 0.0), &any, &mut rng).unwrap();

        // Someone else's confirmation is refused.
        assert_eq!(
            reg.confirm_arrival(grant.room, ActorId(2), 1.0, 3.0),
            Err(LeaseError::NotHeld {
                room: grant.room,
                holder: Some(ActorId(1))
            })
        );
        assert_eq!(reg.confirm_arrival(grant.room, ActorId(1), 1.0, 3.0), Ok(()));
        assert_eq!(
            reg.state(grant.room),
            Some(RoomState::Occupied { by: ActorId(1) })
        );
    }

    #[test]
    fn test_confirm_on_contended_room_cools_it_down() {
        let mut reg = registry();
        let mut rng = StdRng::seed_from_u64(6);
        let grant = reg.try_reserve(&request(1, 0.0), &any, &mut rng).unwrap();

        // An outside system drops someone into the room.
        reg.occupy(grant.room, ActorId(9));

        assert_eq!(
            reg.confirm_arrival(grant.room, ActorId(1), 2.0, 3.0),
            Err(LeaseError::Contended {
                room: grant.room,
                occupant: ActorId(9)
            })
        );
        // Incumbent keeps the room.
        assert_eq!(
            reg.state(grant.room),
            Some(RoomState::Occupied { by: ActorId(9) })
        );
        reg.vacate(grant.room, ActorId(9), 2.5, 0.0);
        assert!(!reg.is_free(grant.room, 4.0));
        assert!(reg.is_free(grant.room, 5.0));
    }

    #[test]
    fn test_expiry_frees_room() {
        let mut reg = registry();
        let mut rng = StdRng::seed_from_u64(7);
        let grant = reg.try_reserve(&request(1, 0.0), &any, &mut rng).unwrap();

        assert!(reg.expire_reservations(grant.expires_at - 0.01, 0.0).is_empty());
        let expired = reg.expire_reservations(grant.expires_at, 0.0);
        assert_eq!(
            expired,
            vec![Expired {
                room: grant.room,
                actor: ActorId(1)
            }]
        );
        assert!(reg.is_free(grant.room, grant.expires_at));
        // Late confirmation fails.
        assert!(matches!(
            reg.confirm_arrival(grant.room, ActorId(1), grant.expires_at, 3.0),
            Err(LeaseError::NotHeld { holder: None, .. })
        ));
    }

    #[test]
    fn test_cancel_only_own_reservation() {
        let mut reg = registry();
        let mut rng = StdRng::seed_from_u64(8);
        let grant = reg.try_reserve(&request(1, 0.0), &any, &mut rng).unwrap();
        assert!(!reg.cancel_reservation(grant.room, ActorId(2)));
        assert!(reg.cancel_reservation(grant.room, ActorId(1)));
        assert!(reg.is_free(grant.room, 0.0));
    }
}
