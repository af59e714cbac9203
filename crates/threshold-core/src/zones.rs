//! Zone map - live zone statistics driven by room occupants.

use threshold_logic::grid::Grid;
use threshold_logic::population::Label;
use threshold_logic::zone::{Zone, ZoneLayout, ZoneMember, ZoneRule};

use crate::components::ActorId;
use crate::registry::{RoomRegistry, RoomState};

#[derive(Debug, Clone)]
pub struct ZoneMap {
    layout: ZoneLayout,
    zones: Vec<Zone>,
    rule: ZoneRule,
    next_update: f64,
}

impl ZoneMap {
    pub fn new(grid: &Grid, rule: ZoneRule) -> Self {
        let layout = ZoneLayout::new(grid, rule.zone_size);
        let zones = layout.build_zones();
        Self {
            layout,
            zones,
            rule,
            next_update: 0.0,
        }
    }

    pub fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    pub fn rule(&self) -> &ZoneRule {
        &self.rule
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, id: u32) -> Option<&Zone> {
        self.zones.get(id as usize)
    }

    /// Whether rooms in `zone` may be reserved by an actor with `label`.
    pub fn admits(&self, zone: u32, label: Label) -> bool {
        self.zone(zone)
            .map_or(true, |z| z.admits(label, &self.rule))
    }

    pub fn is_due(&self, now: f64) -> bool {
        now >= self.next_update
    }

    /// Recompute every zone from current room occupants and latch any that
    /// meet the closure rule. Returns the ids of zones closed by this call.
    pub fn recompute<F>(&mut self, registry: &RoomRegistry, now: f64, member: F) -> Vec<u32>
    where
        F: Fn(ActorId) -> Option<ZoneMember>,
    {
        let mut members: Vec<Vec<ZoneMember>> = vec![Vec::new(); self.zones.len()];
        for slot in registry.iter() {
            if let RoomState::Occupied { by } = slot.state {
                if let (Some(list), Some(m)) = (members.get_mut(slot.zone as usize), member(by)) {
                    list.push(m);
                }
            }
        }

        let mut closed = Vec::new();
        for (zone, list) in self.zones.iter_mut().zip(members) {
            zone.update_stats(list);
            if self.rule.enabled && zone.try_close(&self.rule) {
                log::info!(
                    "zone {} closed to {} (avg main bias {:.2}, target density {:.3})",
                    zone.id,
                    self.rule.restricted_label.name(),
                    zone.avg_bias_main,
                    zone.target_density
                );
                closed.push(zone.id);
            }
        }

        self.next_update = now + self.rule.recompute_interval as f64;
        closed
    }

    /// Reopen every zone and recompute on the next tick.
    pub fn reset(&mut self) {
        self.zones = self.layout.build_zones();
        self.next_update = 0.0;
    }
}
