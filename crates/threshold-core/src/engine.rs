//! Simulation engine - main entry point for running the landscape

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use threshold_logic::config::SimConfig;
use threshold_logic::geometry::Vec3;
use threshold_logic::grid::{Cell, Grid};
use threshold_logic::population::Label;
use threshold_logic::satisfaction::SatisfactionState;
use threshold_logic::zone::ZoneMember;

use crate::components::*;
use crate::error::SimError;
use crate::invariants::check_invariants;
use crate::movement::{MovementService, StraightLineMover};
use crate::presentation::{NullSink, PresentationSink};
use crate::registry::{RoomCounts, RoomId, RoomRegistry};
use crate::snapshot::{ActorView, RoomView, SimSnapshot};
use crate::stats::SimStats;
use crate::systems::*;
use crate::zones::ZoneMap;

/// Main simulation engine
///
/// Owns the grid, the room registry, the zones, the ECS world, the RNG and
/// the clock, plus the movement service and presentation sink it drives.
pub struct SimulationEngine<M = StraightLineMover, P = NullSink>
where
    M: MovementService,
    P: PresentationSink,
{
    /// ECS world containing all actors
    pub world: World,
    config: SimConfig,
    grid: Grid,
    registry: RoomRegistry,
    zones: ZoneMap,
    movement: M,
    sink: P,
    rng: StdRng,
    stats: SimStats,
    /// Actor id to entity
    actors: HashMap<ActorId, Entity>,
    next_actor: u32,
    /// Simulation time in seconds since construction
    sim_time: f64,
    time_scale: f32,
}

impl SimulationEngine<StraightLineMover, NullSink> {
    /// Engine with the straight-line mover and no presentation.
    pub fn headless(config: SimConfig) -> Result<Self, SimError> {
        Self::new(config, StraightLineMover::new(), NullSink)
    }
}

impl<M, P> SimulationEngine<M, P>
where
    M: MovementService,
    P: PresentationSink,
{
    /// Validate the configuration and build an empty landscape.
    pub fn new(config: SimConfig, movement: M, sink: P) -> Result<Self, SimError> {
        config.validate()?;
        let grid = Grid::new(&config.grid)?;
        let zones = ZoneMap::new(&grid, config.zones);
        let registry = RoomRegistry::build(&grid, zones.layout());
        log::info!(
            "landscape {}x{}: {} rooms, {} zones",
            grid.width(),
            grid.height(),
            registry.len(),
            zones.zones().len()
        );

        Ok(Self {
            world: World::new(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            grid,
            registry,
            zones,
            movement,
            sink,
            stats: SimStats::default(),
            actors: HashMap::new(),
            next_actor: 0,
            sim_time: 0.0,
            time_scale: 1.0,
        })
    }

    /// Remove every actor and return every room to Free. Counters restart.
    pub fn clear(&mut self) {
        for (id, _) in self.actors.drain() {
            self.movement.unregister(id);
        }
        self.world.clear();
        self.registry.reset();
        self.zones.reset();
        self.stats = SimStats::default();
    }

    /// Roll every cell against the population ratios and spawn actors.
    /// Returns how many were spawned.
    pub fn populate(&mut self) -> usize {
        let cells: Vec<Cell> = self.grid.cells().collect();
        let mut spawned = 0;
        for cell in cells {
            let Some(label) = self.config.population.roll(&mut self.rng) else {
                continue;
            };
            match self.spawn_actor(label, cell) {
                Ok(_) => spawned += 1,
                Err(err) => {
                    log::warn!("skipping actor at {}: {}", cell, err);
                    self.stats.spawn_failures += 1;
                }
            }
        }
        log::info!(
            "populated {} actors ({} resting, target ratio {:.2})",
            spawned,
            self.registry.counts(self.sim_time).occupied,
            self.config.population.target_ratio()
        );
        spawned
    }

    /// Clear and repopulate. Returns the new actor count.
    pub fn reset(&mut self) -> usize {
        self.clear();
        self.populate()
    }

    /// Spawn an actor on `cell` with a bias drawn from the population
    /// config. On a room cell it starts Resting in that room; on a road
    /// cell it starts Moving.
    pub fn spawn_actor(&mut self, label: Label, cell: Cell) -> Result<ActorId, SimError> {
        let bias = self.config.population.draw_bias(label, &mut self.rng);
        self.spawn_actor_with_bias(label, bias, cell)
    }

    pub fn spawn_actor_with_bias(
        &mut self,
        label: Label,
        bias: f32,
        cell: Cell,
    ) -> Result<ActorId, SimError> {
        if !self.grid.contains(cell) {
            return Err(SimError::SpawnOutOfGrid(cell));
        }
        let room = self.registry.room_at(cell);
        if let Some(room) = room {
            if self.registry.state(room).and_then(|s| s.holder()).is_some() {
                return Err(SimError::CellTaken(cell));
            }
            if !self.registry.is_free(room, self.sim_time) {
                return Err(SimError::RoomCooling(cell));
            }
        }

        let id = ActorId(self.next_actor);
        self.next_actor += 1;
        let now = self.sim_time;
        let actor = Actor {
            id,
            label,
            bias: bias.clamp(0.0, 1.0),
        };

        let entity = match room {
            Some(room) => {
                self.registry.occupy(room, id);
                let hold = draw_hold(&self.config.actors, &mut self.rng);
                self.sink.set_occupancy_visual(id, true);
                self.world.spawn((
                    actor,
                    Lifecycle::new(Phase::Resting, now),
                    Occupancy::new(room, now, hold),
                    Mood::default(),
                    StallWatch::default(),
                    Cooldown::default(),
                ))
            }
            None => self.world.spawn((
                actor,
                Lifecycle::new(Phase::Moving, now),
                Mood::default(),
                StallWatch::default(),
                Cooldown::default(),
            )),
        };

        self.movement
            .register(id, self.grid.cell_center(cell), self.config.actors.speed);
        self.actors.insert(id, entity);
        Ok(id)
    }

    /// Remove an actor, releasing anything it holds.
    pub fn despawn_actor(&mut self, id: ActorId) -> Result<(), SimError> {
        let entity = self.actors.remove(&id).ok_or(SimError::UnknownActor(id))?;
        let released =
            self.registry
                .release_actor(id, self.sim_time, self.config.lease.vacate_grace);
        if !released.is_empty() {
            self.sink.set_occupancy_visual(id, false);
        }
        self.movement.unregister(id);
        let _ = self.world.despawn(entity);
        log::debug!("{} despawned, released {:?}", id, released);
        Ok(())
    }

    /// Force an actor out of its room (or drop its reservation) now,
    /// bypassing the hold timer. Returns whether anything was interrupted.
    pub fn force_leave(&mut self, id: ActorId) -> Result<bool, SimError> {
        let entity = *self.actors.get(&id).ok_or(SimError::UnknownActor(id))?;
        let mut ctx = TickContext {
            now: self.sim_time,
            grid: &self.grid,
            config: &self.config,
            zones: &self.zones,
            registry: &mut self.registry,
            movement: &mut self.movement,
            sink: &mut self.sink,
            rng: &mut self.rng,
            stats: &mut self.stats,
        };
        Ok(force_leave(&mut self.world, entity, id, &mut ctx))
    }

    /// Update the simulation by delta_seconds
    pub fn advance(&mut self, delta_seconds: f32) {
        let dt = (delta_seconds * self.time_scale).max(0.0);
        self.sim_time += dt as f64;
        let now = self.sim_time;

        // Movement first so arrival checks see this tick's positions
        self.movement.advance(dt);

        let mut ctx = TickContext {
            now,
            grid: &self.grid,
            config: &self.config,
            zones: &self.zones,
            registry: &mut self.registry,
            movement: &mut self.movement,
            sink: &mut self.sink,
            rng: &mut self.rng,
            stats: &mut self.stats,
        };
        reservation_expiry_system(&mut self.world, &mut ctx);

        // Zones (throttled)
        if self.zones.is_due(now) {
            let world = &self.world;
            let actors = &self.actors;
            let closed = self.zones.recompute(&self.registry, now, |id| {
                let entity = actors.get(&id)?;
                let actor = world.get::<&Actor>(*entity).ok()?;
                Some(ZoneMember {
                    label: actor.label,
                    bias: actor.bias,
                })
            });
            self.stats.zones_closed += closed.len() as u64;
        }

        let mut ctx = TickContext {
            now,
            grid: &self.grid,
            config: &self.config,
            zones: &self.zones,
            registry: &mut self.registry,
            movement: &mut self.movement,
            sink: &mut self.sink,
            rng: &mut self.rng,
            stats: &mut self.stats,
        };
        lifecycle_system(&mut self.world, &mut ctx);

        mood_system(
            &mut self.world,
            &self.grid,
            &self.config.satisfaction,
            &self.movement,
            &mut self.sink,
        );
    }

    /// Verify registry/component consistency.
    pub fn check_invariants(&self) -> Result<(), SimError> {
        check_invariants(&self.world, &self.registry, self.sim_time)?;
        Ok(())
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Get current simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn counts(&self) -> RoomCounts {
        self.registry.counts(self.sim_time)
    }

    pub fn movement(&self) -> &M {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut M {
        &mut self.movement
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut P {
        &mut self.sink
    }

    /// Count actors in simulation
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// All actor ids, ascending
    pub fn actor_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = self.actors.keys().copied().collect();
        ids.sort();
        ids
    }

    fn component<T: hecs::Component + Copy>(&self, id: ActorId) -> Option<T> {
        let entity = self.actors.get(&id)?;
        self.world.get::<&T>(*entity).ok().map(|c| *c)
    }

    pub fn actor(&self, id: ActorId) -> Option<Actor> {
        self.component::<Actor>(id)
    }

    pub fn phase(&self, id: ActorId) -> Option<Phase> {
        self.component::<Lifecycle>(id).map(|l| l.phase)
    }

    pub fn mood(&self, id: ActorId) -> Option<SatisfactionState> {
        self.component::<Mood>(id).map(|m| m.0)
    }

    /// Room the actor is resting in, if any.
    pub fn held_room(&self, id: ActorId) -> Option<RoomId> {
        self.component::<Occupancy>(id).map(|o| o.room)
    }

    /// Room the actor has reserved and is heading to, if any.
    pub fn reserved_room(&self, id: ActorId) -> Option<RoomId> {
        self.component::<Reservation>(id).map(|r| r.room)
    }

    pub fn reservation(&self, id: ActorId) -> Option<Reservation> {
        self.component::<Reservation>(id)
    }

    pub fn cooldown_until(&self, id: ActorId) -> Option<f64> {
        self.component::<Cooldown>(id).map(|c| c.until)
    }

    pub fn position(&self, id: ActorId) -> Option<Vec3> {
        self.movement.position(id)
    }

    /// Rolled-up view of rooms, actors, zones and counters.
    pub fn snapshot(&self) -> SimSnapshot {
        let now = self.sim_time;
        let rooms = self
            .registry
            .iter()
            .map(|slot| RoomView {
                id: slot.id,
                cell: slot.cell,
                zone: slot.zone,
                state: slot.state,
                cooling: slot.is_cooling(now),
            })
            .collect();

        let actors = self
            .actor_ids()
            .into_iter()
            .filter_map(|id| {
                let actor = self.actor(id)?;
                let position = self.position(id);
                Some(ActorView {
                    id,
                    label: actor.label,
                    bias: actor.bias,
                    phase: self.phase(id)?,
                    position,
                    cell: position.and_then(|p| self.grid.cell_at(p)),
                    room: self.held_room(id),
                    reserved: self.reserved_room(id),
                    mood: self.mood(id).unwrap_or_default(),
                })
            })
            .collect();

        SimSnapshot {
            time: now,
            counts: self.counts(),
            rooms,
            actors,
            zones: self.zones.zones().to_vec(),
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation() {
        let engine = SimulationEngine::headless(SimConfig::default()).unwrap();
        assert_eq!(engine.actor_count(), 0);
        assert_eq!(engine.sim_time(), 0.0);
        assert_eq!(engine.counts().total, 144);
        assert_eq!(engine.zones().zones().len(), 25);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SimConfig::default();
        config.population.empty_ratio = 0.9;
        config.population.main_ratio = 0.5;
        assert!(matches!(
            SimulationEngine::headless(config),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_populate_from_ratios() {
        let mut engine = SimulationEngine::headless(SimConfig::default()).unwrap();
        let spawned = engine.reset();

        assert_eq!(spawned, engine.actor_count());
        assert!(spawned > 0 && spawned < 400);
        let resting = engine
            .actor_ids()
            .into_iter()
            .filter(|id| engine.phase(*id) == Some(Phase::Resting))
            .count();
        assert_eq!(resting, engine.counts().occupied);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn test_spawn_errors() {
        let mut engine = SimulationEngine::headless(SimConfig::default()).unwrap();
        assert!(matches!(
            engine.spawn_actor(Label::Main, Cell::new(-1, 3)),
            Err(SimError::SpawnOutOfGrid(_))
        ));
        engine.spawn_actor(Label::Main, Cell::new(1, 1)).unwrap();
        assert!(matches!(
            engine.spawn_actor(Label::Target, Cell::new(1, 1)),
            Err(SimError::CellTaken(_))
        ));
        // A vacated room is briefly held back.
        let resting = engine.spawn_actor(Label::Main, Cell::new(1, 2)).unwrap();
        assert!(engine.force_leave(resting).unwrap());
        assert!(matches!(
            engine.spawn_actor(Label::Target, Cell::new(1, 2)),
            Err(SimError::RoomCooling(_))
        ));
        // Roads hold any number of actors.
        engine.spawn_actor(Label::Main, Cell::new(0, 0)).unwrap();
        engine.spawn_actor(Label::Main, Cell::new(0, 0)).unwrap();
        assert_eq!(engine.actor_count(), 4);
    }

    #[test]
    fn test_time_scale() {
        let mut engine = SimulationEngine::headless(SimConfig::default()).unwrap();
        engine.set_time_scale(2.0);
        engine.advance(0.5);
        assert!((engine.sim_time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_despawn_releases_room() {
        let mut engine = SimulationEngine::headless(SimConfig::default()).unwrap();
        let id = engine.spawn_actor(Label::Main, Cell::new(1, 1)).unwrap();
        assert_eq!(engine.counts().occupied, 1);

        engine.despawn_actor(id).unwrap();
        assert_eq!(engine.counts().occupied, 0);
        assert!(matches!(
            engine.despawn_actor(id),
            Err(SimError::UnknownActor(_))
        ));
        assert_eq!(engine.movement().tracked(), 0);
    }
}
