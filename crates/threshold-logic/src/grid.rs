//! Grid/cell model - road vs. room classification and world mapping.
//!
//! A cell is a room when BOTH of its coordinates appear in the room index
//! set. The default set `{1,2,4,5,7,8,11,12,14,15,17,18}` yields 2×2 room
//! blocks separated by single road lanes, so every room cell touches at least
//! one road cell along an axis.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::geometry::Vec3;

/// Room index set used when no configuration overrides it.
pub const DEFAULT_ROOM_INDICES: [i32; 12] = [1, 2, 4, 5, 7, 8, 11, 12, 14, 15, 17, 18];

/// Height at which actors stand above the ground plane.
pub const CELL_HEIGHT: f32 = 0.5;

/// Integer grid coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chebyshev distance (king moves).
    pub fn chebyshev(&self, other: &Cell) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Static classification of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Road,
    Room,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid { width: i32, height: i32 },
    #[error("grid has no room cells")]
    NoRoomCells,
    #[error("grid has no road cells")]
    NoRoadCells,
    #[error("cell {cell} is outside the {width}x{height} grid")]
    OutOfBounds { cell: Cell, width: i32, height: i32 },
    #[error("room cell {cell} has no adjacent road cell")]
    NoAdjacentRoad { cell: Cell },
}

/// Serializable description of a grid layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub width: i32,
    pub height: i32,
    pub room_indices: Vec<i32>,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            room_indices: DEFAULT_ROOM_INDICES.to_vec(),
        }
    }
}

/// Immutable, validated grid layout.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    room_axis: BTreeSet<i32>,
}

impl Grid {
    /// Build and validate a grid.
    ///
    /// Fails if the grid is empty, has no rooms or no roads, or if any room
    /// cell lacks an axis-aligned road neighbor (egress would be impossible).
    pub fn new(spec: &GridSpec) -> Result<Self, GridError> {
        if spec.width <= 0 || spec.height <= 0 {
            return Err(GridError::EmptyGrid {
                width: spec.width,
                height: spec.height,
            });
        }

        let grid = Self {
            width: spec.width,
            height: spec.height,
            room_axis: spec.room_indices.iter().copied().collect(),
        };

        let rooms = grid.room_cells();
        if rooms.is_empty() {
            return Err(GridError::NoRoomCells);
        }
        if grid.road_cells().is_empty() {
            return Err(GridError::NoRoadCells);
        }
        for cell in rooms {
            grid.nearest_road_cell(cell)?;
        }

        Ok(grid)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.z >= 0 && cell.z < self.height
    }

    /// Classify a cell from the index set alone (bounds are not checked).
    pub fn classify(&self, cell: Cell) -> CellKind {
        if self.room_axis.contains(&cell.x) && self.room_axis.contains(&cell.z) {
            CellKind::Room
        } else {
            CellKind::Road
        }
    }

    pub fn is_room(&self, cell: Cell) -> bool {
        self.classify(cell) == CellKind::Room
    }

    pub fn is_road(&self, cell: Cell) -> bool {
        self.classify(cell) == CellKind::Road
    }

    /// World-space center of a cell.
    pub fn cell_center(&self, cell: Cell) -> Vec3 {
        Vec3::new(cell.x as f32, CELL_HEIGHT, -(cell.z as f32))
    }

    /// Cell under a world position, if it lies inside the grid.
    pub fn cell_at(&self, position: Vec3) -> Option<Cell> {
        let cell = Cell::new(position.x.round() as i32, (-position.z).round() as i32);
        self.contains(cell).then_some(cell)
    }

    /// First in-grid road cell among the +x, −x, +z, −z neighbors.
    pub fn nearest_road_cell(&self, cell: Cell) -> Result<Cell, GridError> {
        const AXES: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        AXES.iter()
            .map(|(dx, dz)| Cell::new(cell.x + dx, cell.z + dz))
            .find(|c| self.contains(*c) && self.is_road(*c))
            .ok_or(GridError::NoAdjacentRoad { cell })
    }

    /// Moore neighborhood (radius 1), clipped at the grid boundary.
    pub fn moore_neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dz| (dx, dz)))
            .filter(|&(dx, dz)| dx != 0 || dz != 0)
            .map(move |(dx, dz)| Cell::new(cell.x + dx, cell.z + dz))
            .filter(move |c| self.contains(*c))
    }

    /// Every cell, x-major.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |z| Cell::new(x, z)))
    }

    pub fn room_cells(&self) -> Vec<Cell> {
        self.cells().filter(|c| self.is_room(*c)).collect()
    }

    pub fn road_cells(&self) -> Vec<Cell> {
        self.cells().filter(|c| self.is_road(*c)).collect()
    }

    /// Random road cell within `radius` (world units) of `from`, excluding
    /// `from` itself. `None` when no road cell lies in range.
    pub fn random_road_near(&self, from: Cell, radius: f32, rng: &mut impl Rng) -> Option<Cell> {
        // Scan window never extends past the grid.
        let reach = radius.max(0.0).min(self.width.max(self.height) as f32).ceil() as i32;
        let radius_sq = radius * radius;
        let mut candidates = Vec::new();
        let xs = (from.x - reach).max(0)..=(from.x + reach).min(self.width - 1);
        let zs = (from.z - reach).max(0)..=(from.z + reach).min(self.height - 1);
        for x in xs {
            for z in zs.clone() {
                let cell = Cell::new(x, z);
                if cell == from || !self.is_road(cell) {
                    continue;
                }
                let dx = (x - from.x) as f32;
                let dz = (z - from.z) as f32;
                if dx * dx + dz * dz <= radius_sq {
                    candidates.push(cell);
                }
            }
        }
        candidates.choose(rng).copied()
    }
}
