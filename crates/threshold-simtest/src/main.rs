//! Threshold Headless Simulation Harness
//!
//! Drives the landscape engine through the leasing scenarios and a long
//! randomized run, checking the registry invariants after every tick.
//! Runs entirely in-process with the straight-line mover.
//!
//! Usage:
//!   cargo run -p threshold-simtest
//!   cargo run -p threshold-simtest -- --verbose
//!   cargo run -p threshold-simtest -- --ticks 5000 --seed 9 --config landscape.json --json

use rand::rngs::StdRng;
use rand::SeedableRng;
use threshold_core::lease::ReserveRequest;
use threshold_core::prelude::*;
use threshold_core::registry::RoomSlot;
use threshold_logic::config::SimConfig;
use threshold_logic::grid::{Cell, Grid, GridSpec};
use threshold_logic::population::Label;
use threshold_logic::satisfaction::{
    NeighborTally, SatisfactionBand, SatisfactionRule, SatisfactionState, ZeroNeighborPolicy,
};
use threshold_logic::schelling::{SchellingBoard, SchellingConfig};
use threshold_logic::zone::ZoneLayout;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DT: f32 = 0.1;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Options {
    verbose: bool,
    json: bool,
    ticks: usize,
    seed: Option<u64>,
    config: Option<String>,
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_options() -> Options {
    let args: Vec<String> = std::env::args().collect();
    Options {
        verbose: args.iter().any(|a| a == "--verbose"),
        json: args.iter().any(|a| a == "--json"),
        ticks: flag_value(&args, "--ticks")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000),
        seed: flag_value(&args, "--seed").and_then(|v| v.parse().ok()),
        config: flag_value(&args, "--config"),
    }
}

fn load_config(opts: &Options) -> Result<SimConfig, String> {
    let mut config = match &opts.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path, e))?;
            SimConfig::from_json(&json).map_err(|e| format!("{}: {}", path, e))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = opts.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let opts = parse_options();
    let config = match load_config(&opts) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {}", err);
            std::process::exit(2);
        }
    };

    println!("=== Threshold Landscape Harness ===\n");
    info!(seed = config.seed, ticks = opts.ticks, "harness starting");

    let mut results = Vec::new();

    // 1. Satisfaction bands
    results.extend(validate_satisfaction(opts.verbose));

    // 2. Reservation atomicity on the bare registry
    results.extend(validate_reservation_atomicity(opts.verbose));

    // 3. Two actors, one room
    results.extend(validate_turn_taking(opts.verbose));

    // 4. Timeouts and stalls
    results.extend(validate_failure_paths(opts.verbose));

    // 5. Re-initialization
    results.extend(validate_reinit(&config, opts.verbose));

    // 6. Zone closure
    results.extend(validate_zones(opts.verbose));

    // 7. Classic Schelling board
    results.extend(validate_schelling(config.seed, opts.verbose));

    // 8. Long randomized run
    results.extend(validate_long_run(&config, &opts));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || opts.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// 3×3 grid whose only room is (1, 1).
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

fn headless(config: SimConfig) -> Result<SimulationEngine, String> {
    SimulationEngine::headless(config).map_err(|e| e.to_string())
}

/// Advance until `done` holds, checking invariants after each tick.
fn run_until(
    engine: &mut SimulationEngine,
    max_ticks: usize,
    mut done: impl FnMut(&SimulationEngine) -> bool,
) -> Result<bool, String> {
    for _ in 0..max_ticks {
        engine.advance(DT);
        engine.check_invariants().map_err(|e| e.to_string())?;
        if done(engine) {
            return Ok(true);
        }
    }
    Ok(false)
}

// ── 1. Satisfaction ─────────────────────────────────────────────────────

fn validate_satisfaction(verbose: bool) -> Vec<TestResult> {
    println!("--- Satisfaction ---");
    let mut results = Vec::new();

    let rule = SatisfactionRule::new(SatisfactionBand::new(0.2, 0.8), ZeroNeighborPolicy::Neutral);
    let cases = [
        (1, 10, SatisfactionState::Unsatisfied),
        (5, 10, SatisfactionState::Satisfied),
        (9, 10, SatisfactionState::Unsatisfied),
    ];
    for (same, occupied, expected) in cases {
        let got = rule.evaluate(NeighborTally { same, occupied });
        results.push(TestResult::check(
            &format!("band_{}_of_{}", same, occupied),
            got == expected,
            format!("{:?}, expected {:?}", got, expected),
        ));
    }

    for policy in [ZeroNeighborPolicy::Neutral, ZeroNeighborPolicy::Satisfied] {
        let rule = SatisfactionRule::new(SatisfactionBand::at_least(0.5), policy);
        let states: Vec<_> = (0..20)
            .map(|_| rule.evaluate(NeighborTally::count(&Label::Main, [None::<Label>; 8])))
            .collect();
        let stable = states.windows(2).all(|w| w[0] == w[1]);
        results.push(TestResult::check(
            &format!("zero_neighbors_{:?}", policy).to_lowercase(),
            stable && states[0].is_content(),
            format!("{:?} on every evaluation", states[0]),
        ));
    }

    if verbose {
        println!("  {} band cases, 2 zero-neighbor policies", cases.len());
    }
    results
}

// ── 2. Reservation atomicity ────────────────────────────────────────────

fn validate_reservation_atomicity(verbose: bool) -> Vec<TestResult> {
    println!("--- Reservation Atomicity ---");
    let mut results = Vec::new();

    let grid = match Grid::new(&one_room_config().grid) {
        Ok(grid) => grid,
        Err(e) => {
            results.push(TestResult::check("registry_grid", false, e.to_string()));
            return results;
        }
    };
    let mut registry = RoomRegistry::build(&grid, &ZoneLayout::new(&grid, 4));
    let mut rng = StdRng::seed_from_u64(11);
    let anywhere = |_: &RoomSlot| true;

    let grants: Vec<_> = (0..8)
        .map(|i| {
            let request = ReserveRequest {
                requester: ActorId(i),
                origin: grid.cell_center(Cell::new(0, 0)),
                speed: 3.5,
                buffer: 2.0,
                excluding: None,
                now: 0.0,
            };
            registry.try_reserve(&request, &anywhere, &mut rng)
        })
        .collect();
    let winners = grants.iter().filter(|g| g.is_some()).count();
    results.push(TestResult::check(
        "same_instant_single_winner",
        winners == 1,
        format!("{} of 8 simultaneous requests granted", winners),
    ));

    let counts = registry.counts(0.0);
    results.push(TestResult::check(
        "counts_conserved",
        counts.vacant + counts.reserved + counts.occupied == counts.total && counts.reserved == 1,
        format!("{:?}", counts),
    ));

    let expired = registry.expire_reservations(100.0, 0.0);
    results.push(TestResult::check(
        "reservation_expires",
        expired.len() == 1 && registry.counts(100.0).reserved == 0,
        format!("{} expired", expired.len()),
    ));

    if verbose {
        println!("  registry of {} room(s)", registry.len());
    }
    results
}

// ── 3. Turn taking ──────────────────────────────────────────────────────

fn validate_turn_taking(verbose: bool) -> Vec<TestResult> {
    println!("--- Two Actors, One Room ---");
    let mut results = Vec::new();

    let outcome = (|| -> Result<(bool, bool, bool), String> {
        let mut engine = headless(one_room_config())?;
        let a = engine
            .spawn_actor(Label::Main, Cell::new(0, 0))
            .map_err(|e| e.to_string())?;
        let b = engine
            .spawn_actor(Label::Main, Cell::new(2, 2))
            .map_err(|e| e.to_string())?;
        let room = RoomId(0);

        engine.advance(DT);
        let holders: Vec<_> = [a, b]
            .into_iter()
            .filter(|id| engine.reserved_room(*id) == Some(room))
            .collect();
        let single = holders.len() == 1;
        let Some(&winner) = holders.first() else {
            return Ok((false, false, false));
        };
        let loser = if winner == a { b } else { a };

        let mut loser_intruded = false;
        let winner_rested = run_until(&mut engine, 20, |e| e.held_room(winner) == Some(room))?
            && run_until(&mut engine, 100, |e| {
                loser_intruded |= e.held_room(loser) == Some(room);
                e.phase(winner) == Some(Phase::Leaving)
            })?;
        let loser_rests = run_until(&mut engine, 60, |e| e.held_room(loser) == Some(room))?;
        if verbose {
            println!(
                "  winner {} / loser {}, finished at t={:.1}s",
                winner,
                loser,
                engine.sim_time()
            );
        }
        Ok((single, winner_rested && !loser_intruded, loser_rests))
    })();

    match outcome {
        Ok((single, exclusive, loser_rests)) => {
            results.push(TestResult::check(
                "exactly_one_reserves",
                single,
                "one reservation after the first tick",
            ));
            results.push(TestResult::check(
                "winner_rests_alone",
                exclusive,
                "loser never held the room during the winner's rest",
            ));
            results.push(TestResult::check(
                "loser_gets_next_turn",
                loser_rests,
                "loser rests after hold + grace",
            ));
        }
        Err(e) => results.push(TestResult::check("turn_taking", false, e)),
    }
    results
}

// ── 4. Failure paths ────────────────────────────────────────────────────

fn validate_failure_paths(verbose: bool) -> Vec<TestResult> {
    println!("--- Timeouts and Stalls ---");
    let mut results = Vec::new();

    // Timeout: a blocked actor with a generous stall threshold.
    let timeout = (|| -> Result<(bool, f64), String> {
        let mut config = one_room_config();
        config.actors.stall_threshold = 100.0;
        let mut engine = headless(config)?;
        let id = engine
            .spawn_actor(Label::Main, Cell::new(0, 0))
            .map_err(|e| e.to_string())?;
        engine.movement_mut().set_blocked(id, true);
        let freed = run_until(&mut engine, 100, |e| e.stats().reservations_expired == 1)?;
        Ok((freed && engine.counts().reserved == 0, engine.sim_time()))
    })();
    match timeout {
        Ok((freed, at)) => results.push(TestResult::check(
            "reservation_times_out",
            freed,
            format!("room freed at t={:.1}s", at),
        )),
        Err(e) => results.push(TestResult::check("reservation_times_out", false, e)),
    }

    // Stall: recovered within one tick after the threshold.
    let stall = (|| -> Result<(bool, bool), String> {
        let mut engine = headless(one_room_config())?;
        let id = engine
            .spawn_actor(Label::Main, Cell::new(0, 0))
            .map_err(|e| e.to_string())?;
        engine.movement_mut().set_blocked(id, true);
        engine.advance(DT);
        for _ in 0..9 {
            engine.advance(DT);
        }
        let held_before = engine.reserved_room(id).is_some();
        for _ in 0..4 {
            engine.advance(DT);
        }
        let recovered = engine.stats().stuck_recoveries == 1 && engine.reserved_room(id).is_none();
        engine.check_invariants().map_err(|e| e.to_string())?;
        Ok((held_before, recovered))
    })();
    match stall {
        Ok((held_before, recovered)) => results.push(TestResult::check(
            "stall_recovery",
            held_before && recovered,
            "reservation released one tick past the stall threshold",
        )),
        Err(e) => results.push(TestResult::check("stall_recovery", false, e)),
    }

    if verbose {
        println!("  checked timeout and stall recovery on a 3×3 grid");
    }
    results
}

// ── 5. Re-initialization ────────────────────────────────────────────────

fn validate_reinit(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Re-initialization ---");
    let mut results = Vec::new();

    let mut engine = match headless(config.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(TestResult::check("reinit_engine", false, e));
            return results;
        }
    };
    engine.reset();
    for _ in 0..200 {
        engine.advance(1.0 / 30.0);
    }

    engine.clear();
    let cleared = engine.counts();
    results.push(TestResult::check(
        "clear_frees_every_room",
        cleared.available == cleared.total && engine.actor_count() == 0,
        format!("{}/{} available", cleared.available, cleared.total),
    ));

    let spawned = engine.reset();
    let counts = engine.counts();
    let clean = engine.check_invariants().is_ok();
    results.push(TestResult::check(
        "reset_leaves_no_stale_reservations",
        counts.reserved == 0 && clean,
        format!("{} actors, {} occupied", spawned, counts.occupied),
    ));

    if verbose {
        println!("  {} rooms, {} actors after reset", counts.total, spawned);
    }
    results
}

// ── 6. Zones ────────────────────────────────────────────────────────────

fn validate_zones(verbose: bool) -> Vec<TestResult> {
    println!("--- Zones ---");
    let mut results = Vec::new();

    let outcome = (|| -> Result<(bool, bool), String> {
        let mut engine = headless(SimConfig::default())?;
        engine
            .spawn_actor_with_bias(Label::Main, 0.9, Cell::new(1, 1))
            .map_err(|e| e.to_string())?;
        engine
            .spawn_actor_with_bias(Label::Target, 0.0, Cell::new(1, 2))
            .map_err(|e| e.to_string())?;
        engine.advance(DT);
        let closed = engine.zones().zone(0).is_some_and(|z| z.closed)
            && !engine.zones().admits(0, Label::Target);

        let mut targets = Vec::new();
        for x in [0, 3, 6, 9] {
            targets.push(
                engine
                    .spawn_actor(Label::Target, Cell::new(x, 0))
                    .map_err(|e| e.to_string())?,
            );
        }
        let mut respected = true;
        for _ in 0..300 {
            engine.advance(DT);
            for id in &targets {
                for room in [engine.reserved_room(*id), engine.held_room(*id)]
                    .into_iter()
                    .flatten()
                {
                    respected &= engine.registry().slot(room).map(|s| s.zone) != Some(0);
                }
            }
        }
        if verbose {
            println!("  {} zones, {} closed", engine.zones().zones().len(), engine.stats().zones_closed);
        }
        Ok((closed, respected))
    })();

    match outcome {
        Ok((closed, respected)) => {
            results.push(TestResult::check("biased_zone_closes", closed, "zone 0 latched closed"));
            results.push(TestResult::check(
                "closed_zone_refuses_targets",
                respected,
                "no Target reservation inside zone 0",
            ));
        }
        Err(e) => results.push(TestResult::check("zones", false, e)),
    }
    results
}

// ── 7. Schelling board ──────────────────────────────────────────────────

fn validate_schelling(seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Schelling Board ---");
    let mut results = Vec::new();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut board = SchellingBoard::populate(SchellingConfig::default(), &mut rng);
    let occupied = board.occupied_count();
    let start = board.segregation_rate();
    for _ in 0..30 {
        board.run_round(&mut rng);
    }
    let end = board.segregation_rate();

    results.push(TestResult::check(
        "rounds_conserve_agents",
        board.occupied_count() == occupied,
        format!("{} agents", occupied),
    ));
    results.push(TestResult::check(
        "segregation_rises",
        end > start,
        format!("{:.3} -> {:.3}", start, end),
    ));

    if verbose {
        let tail: Vec<String> = board
            .history()
            .iter()
            .rev()
            .take(5)
            .map(|r| format!("{:.3}", r))
            .collect();
        println!("  last rates: {}", tail.join(", "));
    }
    results
}

// ── 8. Long randomized run ──────────────────────────────────────────────

fn validate_long_run(config: &SimConfig, opts: &Options) -> Vec<TestResult> {
    println!("--- Long Run (seed {}, {} ticks) ---", config.seed, opts.ticks);
    let mut results = Vec::new();

    let mut engine = match headless(config.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(TestResult::check("long_run_engine", false, e));
            return results;
        }
    };
    let spawned = engine.reset();

    let mut violation = None;
    for tick in 0..opts.ticks {
        engine.advance(1.0 / 30.0);
        if let Err(err) = engine.check_invariants() {
            violation = Some(format!("tick {}: {}", tick, err));
            break;
        }
    }

    results.push(TestResult::check(
        "invariants_every_tick",
        violation.is_none(),
        violation.unwrap_or_else(|| format!("{} actors, {} ticks clean", spawned, opts.ticks)),
    ));

    let stats = *engine.stats();
    results.push(TestResult::check(
        "rooms_turn_over",
        spawned == 0 || stats.rests_completed > 0,
        format!(
            "{} granted, {} rests, {} failed attempts",
            stats.reservations_granted,
            stats.rests_completed,
            stats.failed_attempts()
        ),
    ));

    if opts.verbose {
        match serde_json::to_string(&stats) {
            Ok(json) => println!("  stats: {}", json),
            Err(e) => println!("  stats unavailable: {}", e),
        }
    }

    let snapshot = engine.snapshot();
    if opts.verbose {
        println!(
            "  {:.0}% resting at t={:.1}s",
            snapshot.resting_share() * 100.0,
            snapshot.time
        );
    }

    if opts.json {
        match snapshot.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => results.push(TestResult::check("snapshot_json", false, e.to_string())),
        }
    }
    results
}
