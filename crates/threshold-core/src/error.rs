//! Engine-level errors.

use thiserror::Error;
use threshold_logic::config::ConfigError;
use threshold_logic::grid::{Cell, GridError};

use crate::components::ActorId;
use crate::invariants::InvariantViolation;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("no such actor: {0}")]
    UnknownActor(ActorId),
    #[error("cannot spawn outside the grid at {0}")]
    SpawnOutOfGrid(Cell),
    #[error("room at {0} is already held")]
    CellTaken(Cell),
    #[error("room at {0} is cooling down and not available yet")]
    RoomCooling(Cell),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}
