//! Consistency checks between the room registry and actor components.
//!
//! Used by tests and the headless harness after every tick:
//! - room counts add up to the pool size
//! - no actor holds more than one room
//! - every registry holder is a live actor carrying the matching
//!   `Reservation` / `Occupancy` component, and vice versa

use hecs::World;
use std::collections::HashMap;
use thiserror::Error;

use crate::components::{Actor, ActorId, Occupancy, Reservation};
use crate::registry::{RoomCounts, RoomId, RoomRegistry, RoomState};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("room counts do not add up: {0:?}")]
    Conservation(RoomCounts),
    #[error("{actor} holds both {first} and {second}")]
    DoubleHold {
        actor: ActorId,
        first: RoomId,
        second: RoomId,
    },
    #[error("{room} is held by {actor}, which does not exist")]
    Orphaned { room: RoomId, actor: ActorId },
    #[error("{actor} believes it holds {room}, registry says {state:?}")]
    Mismatch {
        actor: ActorId,
        room: RoomId,
        state: Option<RoomState>,
    },
}

pub fn check_invariants(
    world: &World,
    registry: &RoomRegistry,
    now: f64,
) -> Result<(), InvariantViolation> {
    let counts = registry.counts(now);
    if counts.vacant + counts.reserved + counts.occupied != counts.total
        || counts.available > counts.vacant
    {
        return Err(InvariantViolation::Conservation(counts));
    }

    let mut held: HashMap<ActorId, RoomId> = HashMap::new();
    for slot in registry.iter() {
        if let Some(actor) = slot.state.holder() {
            if let Some(first) = held.insert(actor, slot.id) {
                return Err(InvariantViolation::DoubleHold {
                    actor,
                    first,
                    second: slot.id,
                });
            }
        }
    }

    let mut claims: HashMap<ActorId, Option<RoomId>> = HashMap::new();
    for (_, (actor, reservation, occupancy)) in world
        .query::<(&Actor, Option<&Reservation>, Option<&Occupancy>)>()
        .iter()
    {
        let claimed = match (reservation, occupancy) {
            (Some(r), Some(o)) => {
                return Err(InvariantViolation::DoubleHold {
                    actor: actor.id,
                    first: r.room,
                    second: o.room,
                })
            }
            (Some(r), None) => {
                let state = registry.state(r.room);
                if !matches!(state, Some(RoomState::Reserved { by, .. }) if by == actor.id) {
                    return Err(InvariantViolation::Mismatch {
                        actor: actor.id,
                        room: r.room,
                        state,
                    });
                }
                Some(r.room)
            }
            (None, Some(o)) => {
                if registry.state(o.room) != Some(RoomState::Occupied { by: actor.id }) {
                    return Err(InvariantViolation::Mismatch {
                        actor: actor.id,
                        room: o.room,
                        state: registry.state(o.room),
                    });
                }
                Some(o.room)
            }
            (None, None) => None,
        };
        claims.insert(actor.id, claimed);
    }

    for (actor, room) in held {
        match claims.get(&actor) {
            None => return Err(InvariantViolation::Orphaned { room, actor }),
            Some(Some(claimed)) if *claimed == room => {}
            Some(_) => {
                return Err(InvariantViolation::Mismatch {
                    actor,
                    room,
                    state: registry.state(room),
                })
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Lifecycle, Phase};
    use threshold_logic::geometry::Vec3;
    use threshold_logic::grid::{Grid, GridSpec};
    use threshold_logic::population::Label;
    use threshold_logic::zone::ZoneLayout;

    fn registry() -> RoomRegistry {
        let grid = Grid::new(&GridSpec::default()).unwrap();
        RoomRegistry::build(&grid, &ZoneLayout::new(&grid, 4))
    }

    fn actor(id: u32) -> (Actor, Lifecycle) {
        (
            Actor {
                id: ActorId(id),
                label: Label::Main,
                bias: 0.0,
            },
            Lifecycle::new(Phase::Moving, 0.0),
        )
    }

    #[test]
    fn test_consistent_state_passes() {
        let mut world = World::new();
        let mut reg = registry();
        let (a, l) = actor(1);
        world.spawn((a, l, Occupancy::new(RoomId(2), 0.0, 5.0)));
        reg.occupy(RoomId(2), ActorId(1));
        world.spawn(actor(2));

        assert_eq!(check_invariants(&world, &reg, 0.0), Ok(()));
    }

    #[test]
    fn test_orphaned_room_detected() {
        let world = World::new();
        let mut reg = registry();
        reg.occupy(RoomId(0), ActorId(9));
        assert_eq!(
            check_invariants(&world, &reg, 0.0),
            Err(InvariantViolation::Orphaned {
                room: RoomId(0),
                actor: ActorId(9)
            })
        );
    }

    #[test]
    fn test_double_hold_detected() {
        let mut world = World::new();
        let mut reg = registry();
        world.spawn(actor(1));
        reg.occupy(RoomId(0), ActorId(1));
        reg.occupy(RoomId(1), ActorId(1));
        assert!(matches!(
            check_invariants(&world, &reg, 0.0),
            Err(InvariantViolation::DoubleHold { .. })
        ));
    }

    #[test]
    fn test_stale_reservation_component_detected() {
        let mut world = World::new();
        let reg = registry();
        let (a, l) = actor(1);
        world.spawn((
            a,
            l,
            Reservation {
                room: RoomId(4),
                target: Vec3::ZERO,
                expires_at: 1.0,
            },
        ));
        assert!(matches!(
            check_invariants(&world, &reg, 0.0),
            Err(InvariantViolation::Mismatch { room: RoomId(4), .. })
        ));
    }
}
