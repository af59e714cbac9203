//! Zones - square blocks of cells that can close to a class of actors.
//!
//! Each zone tracks the average bias of its Main occupants and the density of
//! Target occupants (per zone cell). Once both exceed their thresholds the
//! zone latches closed and stops admitting the restricted label until the
//! landscape is re-initialized.

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Grid};
use crate::population::Label;

/// Closure rule shared by every zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneRule {
    pub enabled: bool,
    /// Side length of a zone, in cells.
    pub zone_size: i32,
    pub bias_threshold: f32,
    pub density_threshold: f32,
    /// Label that a closed zone refuses.
    pub restricted_label: Label,
    /// Seconds between statistic recomputes.
    pub recompute_interval: f32,
}

impl Default for ZoneRule {
    fn default() -> Self {
        Self {
            enabled: true,
            zone_size: 4,
            bias_threshold: 0.6,
            density_threshold: 0.05,
            restricted_label: Label::Target,
            recompute_interval: 1.0,
        }
    }
}

/// One zone member as seen by the statistics pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneMember {
    pub label: Label,
    pub bias: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    pub cell_count: u32,
    pub closed: bool,
    pub avg_bias_main: f32,
    pub target_density: f32,
}

impl Zone {
    pub fn new(id: u32, cell_count: u32) -> Self {
        Self {
            id,
            cell_count,
            closed: false,
            avg_bias_main: 0.0,
            target_density: 0.0,
        }
    }

    pub fn update_stats(&mut self, members: impl IntoIterator<Item = ZoneMember>) {
        let mut bias_sum = 0.0;
        let mut main_count = 0u32;
        let mut target_count = 0u32;
        for member in members {
            match member.label {
                Label::Main => {
                    bias_sum += member.bias;
                    main_count += 1;
                }
                Label::Target => target_count += 1,
            }
        }

        self.avg_bias_main = if main_count > 0 {
            bias_sum / main_count as f32
        } else {
            0.0
        };
        self.target_density = if self.cell_count > 0 {
            target_count as f32 / self.cell_count as f32
        } else {
            0.0
        };
    }

    /// Latch the zone closed if the rule is met. Returns `true` only on the
    /// call that actually closes it.
    pub fn try_close(&mut self, rule: &ZoneRule) -> bool {
        if self.closed {
            return false;
        }
        if self.avg_bias_main > rule.bias_threshold
            && self.target_density > rule.density_threshold
        {
            self.closed = true;
            return true;
        }
        false
    }

    pub fn admits(&self, label: Label, rule: &ZoneRule) -> bool {
        !(rule.enabled && self.closed && label == rule.restricted_label)
    }
}

/// Static assignment of cells to zones.
#[derive(Debug, Clone)]
pub struct ZoneLayout {
    zone_size: i32,
    columns: i32,
    rows: i32,
    cell_counts: Vec<u32>,
}

impl ZoneLayout {
    pub fn new(grid: &Grid, zone_size: i32) -> Self {
        let zone_size = zone_size.max(1);
        let columns = (grid.width() + zone_size - 1) / zone_size;
        let rows = (grid.height() + zone_size - 1) / zone_size;
        let mut layout = Self {
            zone_size,
            columns,
            rows,
            cell_counts: vec![0; (columns * rows) as usize],
        };
        for cell in grid.cells() {
            let zone = layout.zone_of(cell) as usize;
            layout.cell_counts[zone] += 1;
        }
        layout
    }

    pub fn zone_count(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    pub fn zone_of(&self, cell: Cell) -> u32 {
        let col = (cell.x / self.zone_size).clamp(0, self.columns - 1);
        let row = (cell.z / self.zone_size).clamp(0, self.rows - 1);
        (row * self.columns + col) as u32
    }

    /// Fresh, open zones for this layout.
    pub fn build_zones(&self) -> Vec<Zone> {
        self.cell_counts
            .iter()
            .enumerate()
            .map(|(id, count)| Zone::new(id as u32, *count))
            .collect()
    }
}
