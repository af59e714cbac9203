//! Classic round-based Schelling board.
//!
//! Every cell is empty or holds one occupant. A round collects all
//! unsatisfied occupants first, then moves each one to a uniformly random
//! empty cell where it *would* be content. Moves happen in collection order,
//! so later movers see the board as earlier movers left it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use crate::grid::Cell;
use crate::population::Label;
use crate::satisfaction::{
    NeighborTally, SatisfactionBand, SatisfactionRule, SatisfactionState, ZeroNeighborPolicy,
};

/// Rounds of segregation history kept for plotting.
pub const HISTORY_CAPACITY: usize = 300;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("cell {0} is outside the board")]
    OutOfBounds(Cell),
    #[error("cell {0} is already occupied")]
    Occupied(Cell),
    #[error("cell {0} is empty")]
    Empty(Cell),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchellingConfig {
    pub width: i32,
    pub height: i32,
    pub empty_ratio: f32,
    pub main_ratio: f32,
    pub main_band: SatisfactionBand,
    pub target_band: SatisfactionBand,
    pub zero_neighbors: ZeroNeighborPolicy,
}

impl Default for SchellingConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            empty_ratio: 0.3,
            main_ratio: 0.35,
            main_band: SatisfactionBand::at_least(0.5),
            target_band: SatisfactionBand::at_least(0.5),
            zero_neighbors: ZeroNeighborPolicy::Neutral,
        }
    }
}

impl SchellingConfig {
    fn rule_for(&self, label: Label) -> SatisfactionRule {
        let band = match label {
            Label::Main => self.main_band,
            Label::Target => self.target_band,
        };
        SatisfactionRule::new(band, self.zero_neighbors)
    }
}

/// Outcome of a single round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub unsatisfied: usize,
    pub moved: usize,
    pub stuck: usize,
    pub segregation_rate: f32,
}

#[derive(Debug, Clone)]
pub struct SchellingBoard {
    config: SchellingConfig,
    cells: Vec<Option<Label>>,
    history: VecDeque<f32>,
}

impl SchellingBoard {
    /// Empty board.
    pub fn new(config: SchellingConfig) -> Self {
        let size = (config.width.max(0) * config.height.max(0)) as usize;
        Self {
            config,
            cells: vec![None; size],
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Board populated by one roll per cell.
    pub fn populate(config: SchellingConfig, rng: &mut impl Rng) -> Self {
        let mut board = Self::new(config);
        for slot in board.cells.iter_mut() {
            let r: f32 = rng.gen();
            *slot = if r < config.empty_ratio {
                None
            } else if r < config.empty_ratio + config.main_ratio {
                Some(Label::Main)
            } else {
                Some(Label::Target)
            };
        }
        board
    }

    pub fn config(&self) -> &SchellingConfig {
        &self.config
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.config.width && cell.z >= 0 && cell.z < self.config.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.contains(cell)
            .then(|| (cell.x * self.config.height + cell.z) as usize)
    }

    pub fn get(&self, cell: Cell) -> Option<Label> {
        self.index(cell).and_then(|i| self.cells[i])
    }

    pub fn set(&mut self, cell: Cell, occupant: Option<Label>) -> Result<(), BoardError> {
        let i = self.index(cell).ok_or(BoardError::OutOfBounds(cell))?;
        self.cells[i] = occupant;
        Ok(())
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn history(&self) -> &VecDeque<f32> {
        &self.history
    }

    fn cells(&self) -> impl Iterator<Item = Cell> {
        let (w, h) = (self.config.width, self.config.height);
        (0..w).flat_map(move |x| (0..h).map(move |z| Cell::new(x, z)))
    }

    fn tally(&self, label: Label, cell: Cell) -> NeighborTally {
        let neighbors = (-1..=1)
            .flat_map(|dx| (-1..=1).map(move |dz| (dx, dz)))
            .filter(|&(dx, dz)| dx != 0 || dz != 0)
            .map(|(dx, dz)| self.get(Cell::new(cell.x + dx, cell.z + dz)));
        NeighborTally::count(&label, neighbors)
    }

    /// Satisfaction of the occupant at `cell`, `None` for empty cells.
    pub fn state(&self, cell: Cell) -> Option<SatisfactionState> {
        let label = self.get(cell)?;
        Some(self.config.rule_for(label).evaluate(self.tally(label, cell)))
    }

    pub fn is_satisfied(&self, cell: Cell) -> bool {
        self.state(cell).is_some_and(|s| s.is_content())
    }

    /// Would an occupant of `label` be content at `cell`, ignoring whoever
    /// currently stands there.
    pub fn would_be_satisfied(&self, label: Label, cell: Cell) -> bool {
        self.config
            .rule_for(label)
            .evaluate(self.tally(label, cell))
            .is_content()
    }

    /// Mean same-label ratio over occupants that have any neighbors.
    pub fn segregation_rate(&self) -> f32 {
        let (sum, count) = self
            .cells()
            .filter_map(|cell| self.get(cell).map(|label| self.tally(label, cell)))
            .filter_map(|tally| tally.ratio())
            .fold((0.0f32, 0usize), |(s, n), r| (s + r, n + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    /// Run one relocation round and append its segregation rate to history.
    pub fn run_round(&mut self, rng: &mut impl Rng) -> RoundReport {
        let unsatisfied: Vec<Cell> = self
            .cells()
            .filter(|c| self.get(*c).is_some() && !self.is_satisfied(*c))
            .collect();

        let mut report = RoundReport {
            unsatisfied: unsatisfied.len(),
            ..Default::default()
        };

        for from in unsatisfied {
            let Some(label) = self.get(from) else {
                continue;
            };
            let candidates: Vec<Cell> = self
                .cells()
                .filter(|c| self.get(*c).is_none() && self.would_be_satisfied(label, *c))
                .collect();
            match candidates.choose(rng) {
                Some(&to) => {
                    self.relocate(from, to, label);
                    report.moved += 1;
                }
                None => report.stuck += 1,
            }
        }

        report.segregation_rate = self.segregation_rate();
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(report.segregation_rate);
        report
    }

    /// Drag-and-drop relocation to an empty in-board cell.
    pub fn manual_move(&mut self, from: Cell, to: Cell) -> Result<(), BoardError> {
        if !self.contains(from) {
            return Err(BoardError::OutOfBounds(from));
        }
        if !self.contains(to) {
            return Err(BoardError::OutOfBounds(to));
        }
        let label = self.get(from).ok_or(BoardError::Empty(from))?;
        if self.get(to).is_some() {
            return Err(BoardError::Occupied(to));
        }
        self.relocate(from, to, label);
        Ok(())
    }

    fn relocate(&mut self, from: Cell, to: Cell, label: Label) {
        if let (Some(a), Some(b)) = (self.index(from), self.index(to)) {
            self.cells[a] = None;
            self.cells[b] = Some(label);
        }
    }
}
