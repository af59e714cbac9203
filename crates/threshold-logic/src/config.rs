//! Simulation configuration.
//!
//! Everything the landscape needs is read once at initialization and treated
//! as constant for the run. Defaults are the tuned installation values
//! (20×20 grid, 60% empty, five-second rests). Configuration can be supplied
//! as JSON; any missing field falls back to its default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{Grid, GridError, GridSpec};
use crate::population::{Label, PopulationConfig};
use crate::satisfaction::{SatisfactionBand, SatisfactionRule, ZeroNeighborPolicy};
use crate::zone::ZoneRule;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("invalid population ratios (empty {empty}, main {main})")]
    InvalidPopulation { empty: f32, main: f32 },
    #[error("invalid satisfaction band for {label}: [{lower}, {upper}]")]
    InvalidBand {
        label: &'static str,
        lower: f32,
        upper: f32,
    },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("hold duration range is inverted: [{min}, {max}]")]
    InvalidHoldRange { min: f32, max: f32 },
    #[error("zone size must be at least 1, got {0}")]
    InvalidZoneSize(i32),
}

/// Per-actor movement and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Distance at which a destination counts as reached.
    pub arrive_eps: f32,
    /// Seconds between wander re-targets.
    pub wander_interval: f32,
    /// Radius for picking random road targets.
    pub wander_radius: f32,
    /// Rest duration range, in seconds.
    pub hold_min: f32,
    pub hold_max: f32,
    /// Seconds at near-zero speed before a path is abandoned.
    pub stall_threshold: f32,
    /// Speed below which an actor counts as stalled.
    pub stall_speed: f32,
    /// Move orders tried before falling back to a local step.
    pub max_move_attempts: u32,
    /// Upper bound on the egress walk after vacating a room.
    pub egress_timeout: f32,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            speed: 3.5,
            arrive_eps: 0.05,
            wander_interval: 2.0,
            wander_radius: 8.0,
            hold_min: 5.0,
            hold_max: 5.0,
            stall_threshold: 1.0,
            stall_speed: 0.05,
            max_move_attempts: 3,
            egress_timeout: 4.0,
        }
    }
}

/// Reservation, grace and cooldown windows (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaseConfig {
    /// Added to estimated travel time to form a reservation deadline.
    pub reservation_buffer: f32,
    /// Cooldown applied to a room whose reservation expired.
    pub release_margin: f32,
    /// Cooldown applied to a room after its occupant leaves.
    pub vacate_grace: f32,
    /// Cooldown applied to a room found occupied on arrival.
    pub contention_cooldown: f32,
    /// Window after leaving a room during which the actor may not reserve.
    pub personal_cooldown: f32,
    /// Delay before retrying after any failed reservation attempt.
    pub retry_delay: f32,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            reservation_buffer: 2.0,
            release_margin: 0.0,
            vacate_grace: 0.4,
            contention_cooldown: 3.0,
            personal_cooldown: 1.5,
            retry_delay: 0.5,
        }
    }
}

/// Per-label satisfaction bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatisfactionConfig {
    pub main_band: SatisfactionBand,
    pub target_band: SatisfactionBand,
    pub zero_neighbors: ZeroNeighborPolicy,
}

impl Default for SatisfactionConfig {
    fn default() -> Self {
        Self {
            main_band: SatisfactionBand::default(),
            target_band: SatisfactionBand::default(),
            zero_neighbors: ZeroNeighborPolicy::Neutral,
        }
    }
}

impl SatisfactionConfig {
    pub fn rule_for(&self, label: Label) -> SatisfactionRule {
        let band = match label {
            Label::Main => self.main_band,
            Label::Target => self.target_band,
        };
        SatisfactionRule::new(band, self.zero_neighbors)
    }
}

/// Complete landscape configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed; identical seeds give identical runs.
    pub seed: u64,
    pub grid: GridSpec,
    pub population: PopulationConfig,
    pub actors: ActorConfig,
    pub lease: LeaseConfig,
    pub satisfaction: SatisfactionConfig,
    pub zones: ZoneRule,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            grid: GridSpec::default(),
            population: PopulationConfig::default(),
            actors: ActorConfig::default(),
            lease: LeaseConfig::default(),
            satisfaction: SatisfactionConfig::default(),
            zones: ZoneRule::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every section, including building the grid once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Grid::new(&self.grid)?;

        let pop = &self.population;
        if !pop.is_valid() {
            return Err(ConfigError::InvalidPopulation {
                empty: pop.empty_ratio,
                main: pop.main_ratio,
            });
        }

        for (label, band) in [
            (Label::Main, self.satisfaction.main_band),
            (Label::Target, self.satisfaction.target_band),
        ] {
            if !band.is_valid() {
                return Err(ConfigError::InvalidBand {
                    label: label.name(),
                    lower: band.lower,
                    upper: band.upper,
                });
            }
        }

        let a = &self.actors;
        positive("actors.speed", a.speed)?;
        positive("actors.arrive_eps", a.arrive_eps)?;
        positive("actors.wander_interval", a.wander_interval)?;
        positive("actors.wander_radius", a.wander_radius)?;
        positive("actors.stall_threshold", a.stall_threshold)?;
        positive("actors.egress_timeout", a.egress_timeout)?;
        non_negative("actors.hold_min", a.hold_min)?;
        positive("actors.stall_speed", a.stall_speed)?;
        if a.hold_max < a.hold_min {
            return Err(ConfigError::InvalidHoldRange {
                min: a.hold_min,
                max: a.hold_max,
            });
        }

        let l = &self.lease;
        non_negative("lease.reservation_buffer", l.reservation_buffer)?;
        non_negative("lease.release_margin", l.release_margin)?;
        non_negative("lease.vacate_grace", l.vacate_grace)?;
        non_negative("lease.contention_cooldown", l.contention_cooldown)?;
        non_negative("lease.personal_cooldown", l.personal_cooldown)?;
        positive("lease.retry_delay", l.retry_delay)?;

        if self.zones.zone_size < 1 {
            return Err(ConfigError::InvalidZoneSize(self.zones.zone_size));
        }
        positive("zones.recompute_interval", self.zones.recompute_interval)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
