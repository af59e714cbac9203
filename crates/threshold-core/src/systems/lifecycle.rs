//! Lifecycle system - drives every actor through Moving → Resting → Leaving.
//!
//! - **Moving**: no room held. Chasing a reservation toward a room center, or
//!   wandering random road cells while polling for a room whenever the
//!   actor's cooldown allows.
//! - **Resting**: parked in a room until the hold timer runs out.
//! - **Leaving**: walking to the road next to the vacated room; on arrival
//!   (or egress timeout) back to Moving with an immediate request.
//!
//! Every failure path (denied request, expired reservation, lost arrival,
//! stall, unreachable target) ends with the actor Moving, holding nothing,
//! and a short retry delay on its [`Cooldown`].

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::Rng;
use threshold_logic::config::{ActorConfig, SimConfig};
use threshold_logic::geometry::Vec3;
use threshold_logic::grid::{Cell, Grid};

use crate::components::*;
use crate::lease::{LeaseError, ReserveRequest};
use crate::movement::{has_arrived, MovementService};
use crate::presentation::PresentationSink;
use crate::registry::{RoomId, RoomRegistry, RoomSlot};
use crate::stats::SimStats;
use crate::zones::ZoneMap;

/// Everything a lifecycle step may read or touch besides the ECS world.
pub struct TickContext<'a> {
    pub now: f64,
    pub grid: &'a Grid,
    pub config: &'a SimConfig,
    pub zones: &'a ZoneMap,
    pub registry: &'a mut RoomRegistry,
    pub movement: &'a mut dyn MovementService,
    pub sink: &'a mut dyn PresentationSink,
    pub rng: &'a mut StdRng,
    pub stats: &'a mut SimStats,
}

/// Rest duration, uniform in `[hold_min, hold_max]`.
pub fn draw_hold(actors: &ActorConfig, rng: &mut impl Rng) -> f32 {
    if actors.hold_max > actors.hold_min {
        rng.gen_range(actors.hold_min..=actors.hold_max)
    } else {
        actors.hold_min
    }
}

/// Time out stale reservations and clear the matching actor orders.
///
/// Runs before [`lifecycle_system`] so no actor ever acts on a reservation
/// the registry has already dropped.
pub fn reservation_expiry_system(world: &mut World, ctx: &mut TickContext) {
    let expired = ctx
        .registry
        .expire_reservations(ctx.now, ctx.config.lease.release_margin);
    if expired.is_empty() {
        return;
    }
    ctx.stats.reservations_expired += expired.len() as u64;

    let holders: Vec<(Entity, ActorId, RoomId)> = world
        .query::<(&Actor, &Reservation)>()
        .iter()
        .filter(|(_, (actor, res))| {
            expired
                .iter()
                .any(|e| e.actor == actor.id && e.room == res.room)
        })
        .map(|(entity, (actor, res))| (entity, actor.id, res.room))
        .collect();

    for (entity, id, room) in holders {
        log::debug!("{} reservation on {} timed out", id, room);
        let _ = world.remove_one::<Reservation>(entity);
        ctx.movement.cancel_path(id);
        retry_later(world, entity, ctx);
    }
}

/// Advance every actor one step, in actor id order.
pub fn lifecycle_system(world: &mut World, ctx: &mut TickContext) {
    let mut actors: Vec<(Entity, ActorId, Phase)> = world
        .query::<(&Actor, &Lifecycle)>()
        .iter()
        .map(|(entity, (actor, lifecycle))| (entity, actor.id, lifecycle.phase))
        .collect();
    actors.sort_by_key(|(_, id, _)| *id);

    for (entity, id, phase) in actors {
        match phase {
            Phase::Moving => tick_moving(world, entity, id, ctx),
            Phase::Resting => tick_resting(world, entity, id, ctx),
            Phase::Leaving => tick_leaving(world, entity, id, ctx),
        }
    }
}

/// Interrupt an actor: a resting actor leaves its room immediately, a
/// reservation holder drops its reservation. Returns whether anything was
/// interrupted.
pub fn force_leave(world: &mut World, entity: Entity, id: ActorId, ctx: &mut TickContext) -> bool {
    if let Some(occupancy) = read::<Occupancy>(world, entity) {
        log::info!("{} forced out of {}", id, occupancy.room);
        ctx.stats.forced_leaves += 1;
        begin_leave(world, entity, id, occupancy.room, ctx);
        return true;
    }

    if let Some(reservation) = read::<Reservation>(world, entity) {
        log::info!("{} reservation on {} cancelled", id, reservation.room);
        ctx.stats.forced_leaves += 1;
        ctx.registry.cancel_reservation(reservation.room, id);
        let _ = world.remove_one::<Reservation>(entity);
        ctx.movement.cancel_path(id);
        defer_requests(
            world,
            entity,
            ctx.now + ctx.config.lease.personal_cooldown as f64,
        );
        return true;
    }

    false
}

fn tick_moving(world: &mut World, entity: Entity, id: ActorId, ctx: &mut TickContext) {
    if let Some(reservation) = read::<Reservation>(world, entity) {
        chase(world, entity, id, reservation, ctx);
        return;
    }

    if !is_cooling(world, entity, ctx.now) && request_room(world, entity, id, ctx) {
        return;
    }

    match read::<Wander>(world, entity) {
        Some(wander) => {
            let arrived = has_arrived(
                &*ctx.movement,
                id,
                wander.target,
                ctx.config.actors.arrive_eps,
            );
            if wander.should_retarget(arrived, ctx.now) {
                start_wander(world, entity, id, ctx);
            } else if !arrived && stalled(world, entity, id, ctx) {
                log::debug!("{} stalled while wandering", id);
                ctx.stats.stuck_recoveries += 1;
                ctx.movement.cancel_path(id);
                let _ = world.remove_one::<Wander>(entity);
            }
        }
        None => start_wander(world, entity, id, ctx),
    }
}

fn chase(
    world: &mut World,
    entity: Entity,
    id: ActorId,
    reservation: Reservation,
    ctx: &mut TickContext,
) {
    let arrived = has_arrived(
        &*ctx.movement,
        id,
        reservation.target,
        ctx.config.actors.arrive_eps,
    );

    if arrived {
        let confirmed = ctx.registry.confirm_arrival(
            reservation.room,
            id,
            ctx.now,
            ctx.config.lease.contention_cooldown,
        );
        match confirmed {
            Ok(()) => begin_rest(world, entity, id, reservation.room, ctx),
            Err(err) => {
                log::debug!("{} arrival failed: {}", id, err);
                match err {
                    LeaseError::Contended { .. } => ctx.stats.arrivals_contended += 1,
                    _ => ctx.stats.arrivals_lost += 1,
                }
                let _ = world.remove_one::<Reservation>(entity);
                retry_later(world, entity, ctx);
                start_wander(world, entity, id, ctx);
            }
        }
        return;
    }

    if stalled(world, entity, id, ctx) {
        log::debug!("{} stalled on the way to {}", id, reservation.room);
        ctx.stats.stuck_recoveries += 1;
        ctx.registry.cancel_reservation(reservation.room, id);
        let _ = world.remove_one::<Reservation>(entity);
        ctx.movement.cancel_path(id);
        retry_later(world, entity, ctx);
    }
}

/// Ask the registry for a room and head for it. Returns `true` when the
/// actor now holds a reservation and a live move order.
fn request_room(world: &mut World, entity: Entity, id: ActorId, ctx: &mut TickContext) -> bool {
    let Some(actor) = read::<Actor>(world, entity) else {
        return false;
    };
    let Some(origin) = ctx.movement.position(id) else {
        return false;
    };

    // The room just vacated is skipped by the first request only.
    let excluding = world
        .get::<&mut Lifecycle>(entity)
        .ok()
        .and_then(|mut lifecycle| lifecycle.last_room.take());

    let request = ReserveRequest {
        requester: id,
        origin,
        speed: ctx.config.actors.speed,
        buffer: ctx.config.lease.reservation_buffer,
        excluding,
        now: ctx.now,
    };
    let zones = ctx.zones;
    let eligible = |slot: &RoomSlot| zones.admits(slot.zone, actor.label);

    let Some(grant) = ctx
        .registry
        .try_reserve(&request, &eligible, &mut *ctx.rng)
    else {
        ctx.stats.reservations_denied += 1;
        retry_later(world, entity, ctx);
        return false;
    };
    ctx.stats.reservations_granted += 1;

    if !ctx.movement.issue_move(id, grant.position) {
        log::warn!("{} cannot reach {}, releasing it", id, grant.room);
        ctx.registry.cancel_reservation(grant.room, id);
        ctx.stats.move_failures += 1;
        retry_later(world, entity, ctx);
        return false;
    }

    log::debug!(
        "{} reserved {} until {:.2}",
        id,
        grant.room,
        grant.expires_at
    );
    let _ = world.insert_one(
        entity,
        Reservation {
            room: grant.room,
            target: grant.position,
            expires_at: grant.expires_at,
        },
    );
    let _ = world.remove_one::<Wander>(entity);
    reset_stall(world, entity);
    true
}

fn start_wander(world: &mut World, entity: Entity, id: ActorId, ctx: &mut TickContext) {
    let from = ctx
        .movement
        .position(id)
        .and_then(|p| ctx.grid.cell_at(p));
    let Some(from) = from else {
        log::warn!("{} is off the grid and cannot wander", id);
        let _ = world.remove_one::<Wander>(entity);
        return;
    };

    let retarget_at = ctx.now + ctx.config.actors.wander_interval as f64;
    match order_road_move(id, from, ctx) {
        Some((target, fallback)) => {
            let _ = world.insert_one(
                entity,
                Wander {
                    target,
                    retarget_at,
                    fallback,
                },
            );
        }
        None => {
            let _ = world.remove_one::<Wander>(entity);
        }
    }
    reset_stall(world, entity);
}

/// Order a move to a random road cell near `from`, trying up to
/// `max_move_attempts` targets. If none can be reached the actor is stepped
/// straight onto the nearest road cell; the returned flag marks that case.
fn order_road_move(id: ActorId, from: Cell, ctx: &mut TickContext) -> Option<(Vec3, bool)> {
    let config = ctx.config;
    for _ in 0..config.actors.max_move_attempts {
        let Some(cell) = ctx
            .grid
            .random_road_near(from, config.actors.wander_radius, &mut *ctx.rng)
        else {
            break;
        };
        let target = ctx.grid.cell_center(cell);
        if ctx.movement.issue_move(id, target) {
            return Some((target, false));
        }
        ctx.stats.move_failures += 1;
    }

    let road = if ctx.grid.is_road(from) {
        Ok(from)
    } else {
        ctx.grid.nearest_road_cell(from)
    };
    match road {
        Ok(cell) => {
            let target = ctx.grid.cell_center(cell);
            log::warn!(
                "{} found no reachable road target near {}, stepping to {}",
                id,
                from,
                cell
            );
            ctx.movement.warp(id, target);
            Some((target, true))
        }
        Err(err) => {
            log::warn!("{} is stranded: {}", id, err);
            None
        }
    }
}

fn begin_rest(world: &mut World, entity: Entity, id: ActorId, room: RoomId, ctx: &mut TickContext) {
    let hold = draw_hold(&ctx.config.actors, &mut *ctx.rng);
    ctx.movement.cancel_path(id);
    if let Some(center) = ctx.registry.position(room) {
        ctx.movement.warp(id, center);
    }

    let _ = world.remove_one::<Reservation>(entity);
    let _ = world.remove_one::<Wander>(entity);
    let _ = world.remove_one::<Egress>(entity);
    let _ = world.insert_one(entity, Occupancy::new(room, ctx.now, hold));
    if let Ok(mut lifecycle) = world.get::<&mut Lifecycle>(entity) {
        lifecycle.enter(Phase::Resting, ctx.now);
    }
    reset_stall(world, entity);

    ctx.sink.set_occupancy_visual(id, true);
    log::debug!("{} resting in {} for {:.1}s", id, room, hold);
}

fn tick_resting(world: &mut World, entity: Entity, id: ActorId, ctx: &mut TickContext) {
    let Some(occupancy) = read::<Occupancy>(world, entity) else {
        log::warn!("{} was resting without a room", id);
        if let Ok(mut lifecycle) = world.get::<&mut Lifecycle>(entity) {
            lifecycle.enter(Phase::Moving, ctx.now);
        }
        return;
    };

    if occupancy.is_complete(ctx.now) {
        ctx.stats.rests_completed += 1;
        begin_leave(world, entity, id, occupancy.room, ctx);
    }
}

fn begin_leave(world: &mut World, entity: Entity, id: ActorId, room: RoomId, ctx: &mut TickContext) {
    let config = ctx.config;
    ctx.registry
        .vacate(room, id, ctx.now, config.lease.vacate_grace);
    let _ = world.remove_one::<Occupancy>(entity);
    if let Ok(mut lifecycle) = world.get::<&mut Lifecycle>(entity) {
        lifecycle.last_room = Some(room);
        lifecycle.enter(Phase::Leaving, ctx.now);
    }
    defer_requests(
        world,
        entity,
        ctx.now + config.lease.personal_cooldown as f64,
    );
    reset_stall(world, entity);
    ctx.sink.set_occupancy_visual(id, false);

    let exit = ctx
        .registry
        .slot(room)
        .map(|slot| ctx.grid.nearest_road_cell(slot.cell));
    match exit {
        Some(Ok(cell)) => {
            let target = ctx.grid.cell_center(cell);
            let deadline = if ctx.movement.issue_move(id, target) {
                ctx.now + config.actors.egress_timeout as f64
            } else {
                log::warn!("{} cannot walk out of {}, stepping to {}", id, room, cell);
                ctx.stats.move_failures += 1;
                ctx.movement.warp(id, target);
                ctx.now
            };
            let _ = world.insert_one(entity, Egress { target, deadline });
        }
        Some(Err(err)) => log::warn!("{} has no way out of {}: {}", id, room, err),
        None => log::warn!("{} left unknown {}", id, room),
    }
    log::debug!("{} left {}", id, room);
}

fn tick_leaving(world: &mut World, entity: Entity, id: ActorId, ctx: &mut TickContext) {
    if let Some(egress) = read::<Egress>(world, entity) {
        let arrived = has_arrived(
            &*ctx.movement,
            id,
            egress.target,
            ctx.config.actors.arrive_eps,
        );
        if !arrived {
            if ctx.now < egress.deadline {
                if !stalled(world, entity, id, ctx) {
                    return;
                }
                log::debug!("{} stalled walking out", id);
                ctx.stats.stuck_recoveries += 1;
            }
            ctx.movement.cancel_path(id);
        }
    }
    finish_leave(world, entity, id, ctx);
}

fn finish_leave(world: &mut World, entity: Entity, id: ActorId, ctx: &mut TickContext) {
    let _ = world.remove_one::<Egress>(entity);
    if let Ok(mut lifecycle) = world.get::<&mut Lifecycle>(entity) {
        lifecycle.enter(Phase::Moving, ctx.now);
    }
    if is_cooling(world, entity, ctx.now) || !request_room(world, entity, id, ctx) {
        start_wander(world, entity, id, ctx);
    }
}

/// Feed the actor's stall watch; `true` once it has been still too long.
fn stalled(world: &World, entity: Entity, id: ActorId, ctx: &TickContext) -> bool {
    let still = ctx.movement.velocity(id).planar_length() < ctx.config.actors.stall_speed;
    world
        .get::<&mut StallWatch>(entity)
        .map(|mut watch| watch.observe(still, ctx.now, ctx.config.actors.stall_threshold))
        .unwrap_or(false)
}

fn reset_stall(world: &World, entity: Entity) {
    if let Ok(mut watch) = world.get::<&mut StallWatch>(entity) {
        watch.reset();
    }
}

fn is_cooling(world: &World, entity: Entity, now: f64) -> bool {
    read::<Cooldown>(world, entity).is_some_and(|c| c.is_active(now))
}

fn retry_later(world: &World, entity: Entity, ctx: &TickContext) {
    defer_requests(
        world,
        entity,
        ctx.now + ctx.config.lease.retry_delay as f64,
    );
}

fn defer_requests(world: &World, entity: Entity, until: f64) {
    if let Ok(mut cooldown) = world.get::<&mut Cooldown>(entity) {
        cooldown.extend_to(until);
    }
}

fn read<T: hecs::Component + Copy>(world: &World, entity: Entity) -> Option<T> {
    world.get::<&T>(entity).ok().map(|c| *c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::StraightLineMover;
    use crate::presentation::{RecordingSink, VisualEvent};
    use crate::registry::RoomState;
    use rand::SeedableRng;
    use threshold_logic::grid::GridSpec;
    use threshold_logic::population::Label;

    /// 3×3 grid with a single room at (1, 1).
    fn one_room_config() -> SimConfig {
        SimConfig {
            grid: GridSpec {
                width: 3,
                height: 3,
                room_indices: vec![1],
            },
            ..Default::default()
        }
    }

    struct Fixture {
        world: World,
        grid: Grid,
        config: SimConfig,
        zones: ZoneMap,
        registry: RoomRegistry,
        mover: StraightLineMover,
        sink: RecordingSink,
        rng: StdRng,
        stats: SimStats,
        now: f64,
    }

    impl Fixture {
        fn new(config: SimConfig) -> Self {
            let grid = Grid::new(&config.grid).unwrap();
            let zones = ZoneMap::new(&grid, config.zones);
            let registry = RoomRegistry::build(&grid, zones.layout());
            Self {
                world: World::new(),
                grid,
                zones,
                registry,
                mover: StraightLineMover::new(),
                sink: RecordingSink::new(),
                rng: StdRng::seed_from_u64(7),
                stats: SimStats::default(),
                now: 0.0,
                config,
            }
        }

        fn spawn(&mut self, id: u32, cell: Cell) -> Entity {
            let actor = ActorId(id);
            self.mover
                .register(actor, self.grid.cell_center(cell), self.config.actors.speed);
            self.world.spawn((
                Actor {
                    id: actor,
                    label: Label::Main,
                    bias: 0.5,
                },
                Lifecycle::new(Phase::Moving, self.now),
                Mood::default(),
                StallWatch::default(),
                Cooldown::default(),
            ))
        }

        fn ctx(&mut self) -> TickContext<'_> {
            TickContext {
                now: self.now,
                grid: &self.grid,
                config: &self.config,
                zones: &self.zones,
                registry: &mut self.registry,
                movement: &mut self.mover,
                sink: &mut self.sink,
                rng: &mut self.rng,
                stats: &mut self.stats,
            }
        }

        fn tick(&mut self, dt: f32) {
            self.now += dt as f64;
            self.mover.advance(dt);
            let mut world = std::mem::take(&mut self.world);
            let mut ctx = self.ctx();
            reservation_expiry_system(&mut world, &mut ctx);
            lifecycle_system(&mut world, &mut ctx);
            self.world = world;
        }

        fn phase(&self, entity: Entity) -> Phase {
            self.world.get::<&Lifecycle>(entity).unwrap().phase
        }
    }

    #[test]
    fn test_reserve_then_rest_on_arrival() {
        let mut fx = Fixture::new(one_room_config());
        let e = fx.spawn(1, Cell::new(0, 0));
        let room = RoomId(0);

        fx.tick(0.1);
        assert!(fx.world.get::<&Reservation>(e).is_ok());
        assert!(matches!(
            fx.registry.state(room),
            Some(RoomState::Reserved { by: ActorId(1), .. })
        ));

        for _ in 0..20 {
            fx.tick(0.1);
        }
        assert_eq!(fx.phase(e), Phase::Resting);
        assert_eq!(
            fx.registry.state(room),
            Some(RoomState::Occupied { by: ActorId(1) })
        );
        assert!(fx.world.get::<&Reservation>(e).is_err());
        assert_eq!(fx.mover.position(ActorId(1)), fx.registry.position(room));
        assert!(fx.sink.events.contains(&VisualEvent::Occupancy {
            actor: ActorId(1),
            in_room: true
        }));
    }

    #[test]
    fn test_rest_then_leave_with_cooldowns() {
        let mut fx = Fixture::new(one_room_config());
        let e = fx.spawn(1, Cell::new(0, 0));
        let room = RoomId(0);

        let mut guard = 0;
        while fx.phase(e) != Phase::Leaving && guard < 200 {
            fx.tick(0.1);
            guard += 1;
        }
        assert_eq!(fx.phase(e), Phase::Leaving);
        assert_eq!(fx.stats.rests_completed, 1);
        assert_eq!(fx.registry.state(room), Some(RoomState::Free));
        // Vacate grace keeps the room back briefly.
        assert!(!fx.registry.is_free(room, fx.now));

        let lifecycle = *fx.world.get::<&Lifecycle>(e).unwrap();
        assert_eq!(lifecycle.last_room, Some(room));
        let cooldown = *fx.world.get::<&Cooldown>(e).unwrap();
        assert!(cooldown.until >= fx.now + 1.4);

        let egress = *fx.world.get::<&Egress>(e).unwrap();
        assert_eq!(egress.target, fx.grid.cell_center(Cell::new(2, 1)));
    }

    #[test]
    fn test_expired_reservation_clears_actor() {
        let mut config = one_room_config();
        config.actors.stall_threshold = 100.0;
        let mut fx = Fixture::new(config);
        let e = fx.spawn(1, Cell::new(0, 0));
        fx.mover.set_blocked(ActorId(1), true);

        fx.tick(0.1);
        let reservation = *fx.world.get::<&Reservation>(e).unwrap();

        while fx.now + 0.15 < reservation.expires_at {
            fx.tick(0.1);
            assert!(fx.world.get::<&Reservation>(e).is_ok());
        }
        fx.tick(0.1);
        fx.tick(0.1);
        assert!(fx.world.get::<&Reservation>(e).is_err());
        assert_eq!(fx.stats.reservations_expired, 1);
        assert_eq!(fx.phase(e), Phase::Moving);
    }

    #[test]
    fn test_force_leave_cancels_reservation() {
        let mut fx = Fixture::new(one_room_config());
        let e = fx.spawn(1, Cell::new(0, 0));
        fx.tick(0.1);

        let mut world = std::mem::take(&mut fx.world);
        let mut ctx = fx.ctx();
        assert!(force_leave(&mut world, e, ActorId(1), &mut ctx));
        assert!(!force_leave(&mut world, e, ActorId(1), &mut ctx));
        fx.world = world;

        assert!(fx.world.get::<&Reservation>(e).is_err());
        assert_eq!(fx.registry.state(RoomId(0)), Some(RoomState::Free));
        assert_eq!(fx.stats.forced_leaves, 1);
    }

    #[test]
    fn test_unreachable_room_is_released() {
        let mut fx = Fixture::new(one_room_config());
        let e = fx.spawn(1, Cell::new(0, 0));
        let center = fx.grid.cell_center(Cell::new(1, 1));
        fx.mover.mark_unreachable(center);

        fx.tick(0.1);
        assert!(fx.world.get::<&Reservation>(e).is_err());
        assert_eq!(fx.registry.state(RoomId(0)), Some(RoomState::Free));
        assert_eq!(fx.stats.move_failures, 1);
        // Wandering instead.
        assert!(fx.world.get::<&Wander>(e).is_ok());
    }

    #[test]
    fn test_arrival_at_taken_room_cools_it_and_wanders() {
        let mut fx = Fixture::new(one_room_config());
        let e = fx.spawn(1, Cell::new(0, 0));
        let room = RoomId(0);

        fx.tick(0.1);
        assert!(fx.world.get::<&Reservation>(e).is_ok());
        // Someone else slips in before the actor gets there.
        fx.registry.occupy(room, ActorId(9));

        let mut guard = 0;
        while fx.stats.arrivals_contended == 0 && guard < 40 {
            fx.tick(0.1);
            guard += 1;
        }
        assert_eq!(fx.stats.arrivals_contended, 1);
        assert_eq!(fx.phase(e), Phase::Moving);
        assert!(fx.world.get::<&Reservation>(e).is_err());
        assert!(fx.world.get::<&Occupancy>(e).is_err());
        assert!(fx.world.get::<&Wander>(e).is_ok());
        // Incumbent stays, room held back.
        assert_eq!(
            fx.registry.state(room),
            Some(RoomState::Occupied { by: ActorId(9) })
        );
        assert!(fx.registry.slot(room).unwrap().is_cooling(fx.now));
    }

    #[test]
    fn test_stalled_wander_picks_new_target() {
        let mut fx = Fixture::new(one_room_config());
        fx.registry.occupy(RoomId(0), ActorId(9));
        let e = fx.spawn(1, Cell::new(0, 0));
        fx.mover.set_blocked(ActorId(1), true);

        fx.tick(0.1);
        assert!(fx.world.get::<&Wander>(e).is_ok());
        assert_eq!(fx.stats.reservations_denied, 1);

        let mut guard = 0;
        while fx.stats.stuck_recoveries == 0 && guard < 30 {
            fx.tick(0.1);
            guard += 1;
        }
        assert_eq!(fx.stats.stuck_recoveries, 1);
        assert!(fx.world.get::<&Wander>(e).is_err());
        let orders = fx.mover.orders_issued(ActorId(1));

        fx.tick(0.1);
        assert!(fx.world.get::<&Wander>(e).is_ok());
        assert_eq!(fx.mover.orders_issued(ActorId(1)), orders + 1);
        assert_eq!(fx.phase(e), Phase::Moving);
    }
}
