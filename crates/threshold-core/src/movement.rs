//! Movement service - the boundary to whatever actually moves actors.
//!
//! The landscape only needs to issue move orders, ask whether an actor has
//! arrived, watch its velocity for stalls, and cancel or warp. Hosts with a
//! real navigation system implement [`MovementService`] over it; headless
//! runs and tests use [`StraightLineMover`].

use std::collections::{HashMap, HashSet};
use threshold_logic::geometry::Vec3;

use crate::components::ActorId;

pub trait MovementService {
    /// Start tracking an actor at `position` moving at `speed`.
    fn register(&mut self, actor: ActorId, position: Vec3, speed: f32);

    fn unregister(&mut self, actor: ActorId);

    /// Order a move. `false` means the destination is unreachable.
    fn issue_move(&mut self, actor: ActorId, target: Vec3) -> bool;

    fn is_path_pending(&self, actor: ActorId) -> bool;

    /// Distance left on the current path; zero when there is none.
    fn remaining_distance(&self, actor: ActorId) -> f32;

    fn velocity(&self, actor: ActorId) -> Vec3;

    fn position(&self, actor: ActorId) -> Option<Vec3>;

    /// Instant relocation; drops any current path.
    fn warp(&mut self, actor: ActorId, position: Vec3);

    fn cancel_path(&mut self, actor: ActorId);

    /// Advance internal motion. Host-driven services leave this empty.
    fn advance(&mut self, _delta_seconds: f32) {}
}

/// Arrived = no path computation pending, path exhausted, and standing
/// within `eps` of `target`.
pub fn has_arrived(movement: &dyn MovementService, actor: ActorId, target: Vec3, eps: f32) -> bool {
    !movement.is_path_pending(actor)
        && movement.remaining_distance(actor) <= eps
        && movement
            .position(actor)
            .is_some_and(|p| p.planar_distance(&target) <= eps)
}

#[derive(Debug, Clone)]
struct MoverState {
    position: Vec3,
    destination: Option<Vec3>,
    speed: f32,
    velocity: Vec3,
    pending_ticks: u32,
    blocked: bool,
    orders: u32,
}

/// Constant-speed straight-line mover.
///
/// Supports the failure modes the landscape must survive: actors can be
/// blocked in place (velocity stays zero) and destinations can be marked
/// unreachable (`issue_move` fails).
#[derive(Debug, Clone, Default)]
pub struct StraightLineMover {
    actors: HashMap<ActorId, MoverState>,
    /// Ticks a fresh order spends "computing" before motion starts.
    path_delay: u32,
    unreachable: Vec<Vec3>,
    blocked: HashSet<ActorId>,
}

impl StraightLineMover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_delay(mut self, ticks: u32) -> Self {
        self.path_delay = ticks;
        self
    }

    /// Freeze an actor in place; its orders stay active but never progress.
    pub fn set_blocked(&mut self, actor: ActorId, blocked: bool) {
        if blocked {
            self.blocked.insert(actor);
        } else {
            self.blocked.remove(&actor);
        }
        if let Some(state) = self.actors.get_mut(&actor) {
            state.blocked = blocked;
        }
    }

    /// Refuse future move orders to (anywhere within 0.01 of) `target`.
    pub fn mark_unreachable(&mut self, target: Vec3) {
        self.unreachable.push(target);
    }

    /// Number of move orders accepted for an actor.
    pub fn orders_issued(&self, actor: ActorId) -> u32 {
        self.actors.get(&actor).map_or(0, |s| s.orders)
    }

    pub fn destination(&self, actor: ActorId) -> Option<Vec3> {
        self.actors.get(&actor).and_then(|s| s.destination)
    }

    pub fn tracked(&self) -> usize {
        self.actors.len()
    }
}

impl MovementService for StraightLineMover {
    fn register(&mut self, actor: ActorId, position: Vec3, speed: f32) {
        self.actors.insert(
            actor,
            MoverState {
                position,
                destination: None,
                speed,
                velocity: Vec3::ZERO,
                pending_ticks: 0,
                blocked: self.blocked.contains(&actor),
                orders: 0,
            },
        );
    }

    fn unregister(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
    }

    fn issue_move(&mut self, actor: ActorId, target: Vec3) -> bool {
        if self
            .unreachable
            .iter()
            .any(|u| u.planar_distance(&target) < 0.01)
        {
            return false;
        }
        match self.actors.get_mut(&actor) {
            Some(state) => {
                state.destination = Some(target);
                state.pending_ticks = self.path_delay;
                state.orders += 1;
                true
            }
            None => false,
        }
    }

    fn is_path_pending(&self, actor: ActorId) -> bool {
        self.actors
            .get(&actor)
            .is_some_and(|s| s.pending_ticks > 0)
    }

    fn remaining_distance(&self, actor: ActorId) -> f32 {
        self.actors
            .get(&actor)
            .and_then(|s| s.destination.map(|d| s.position.planar_distance(&d)))
            .unwrap_or(0.0)
    }

    fn velocity(&self, actor: ActorId) -> Vec3 {
        self.actors.get(&actor).map_or(Vec3::ZERO, |s| s.velocity)
    }

    fn position(&self, actor: ActorId) -> Option<Vec3> {
        self.actors.get(&actor).map(|s| s.position)
    }

    fn warp(&mut self, actor: ActorId, position: Vec3) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.position = position;
            state.destination = None;
            state.velocity = Vec3::ZERO;
            state.pending_ticks = 0;
        }
    }

    fn cancel_path(&mut self, actor: ActorId) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.destination = None;
            state.velocity = Vec3::ZERO;
            state.pending_ticks = 0;
        }
    }

    fn advance(&mut self, delta_seconds: f32) {
        for state in self.actors.values_mut() {
            if state.pending_ticks > 0 {
                state.pending_ticks -= 1;
                state.velocity = Vec3::ZERO;
                continue;
            }
            let Some(destination) = state.destination else {
                state.velocity = Vec3::ZERO;
                continue;
            };
            if state.blocked || delta_seconds <= 0.0 {
                state.velocity = Vec3::ZERO;
                continue;
            }

            let before = state.position;
            let (next, arrived) = before.step_towards(destination, state.speed * delta_seconds);
            state.position = next;
            state.velocity = (next - before) * (1.0 / delta_seconds);
            if arrived {
                state.destination = None;
            }
        }
    }
}
