//! Mood system - satisfaction of every placed actor from its neighbors

use hecs::{Entity, World};
use std::collections::HashMap;
use threshold_logic::config::SatisfactionConfig;
use threshold_logic::grid::{Cell, Grid};
use threshold_logic::population::Label;
use threshold_logic::satisfaction::NeighborTally;

use crate::components::{Actor, ActorId, Mood};
use crate::movement::MovementService;
use crate::presentation::PresentationSink;

/// Classify each actor against the actors in its Moore neighborhood (and
/// any others sharing its cell). The sink only hears about changes.
pub fn mood_system(
    world: &mut World,
    grid: &Grid,
    satisfaction: &SatisfactionConfig,
    movement: &dyn MovementService,
    sink: &mut dyn PresentationSink,
) {
    let placed: Vec<(Entity, ActorId, Label, Cell)> = world
        .query::<&Actor>()
        .iter()
        .filter_map(|(entity, actor)| {
            let cell = movement.position(actor.id).and_then(|p| grid.cell_at(p))?;
            Some((entity, actor.id, actor.label, cell))
        })
        .collect();

    let mut by_cell: HashMap<Cell, Vec<(ActorId, Label)>> = HashMap::new();
    for (_, id, label, cell) in &placed {
        by_cell.entry(*cell).or_default().push((*id, *label));
    }

    for (entity, id, label, cell) in placed {
        let around = grid
            .moore_neighbors(cell)
            .flat_map(|c| by_cell.get(&c).into_iter().flatten());
        let sharing = by_cell
            .get(&cell)
            .into_iter()
            .flatten()
            .filter(|(other, _)| *other != id);
        let tally = NeighborTally::count(&label, around.chain(sharing).map(|(_, l)| Some(*l)));
        let state = satisfaction.rule_for(label).evaluate(tally);

        if let Ok(mut mood) = world.get::<&mut Mood>(entity) {
            if mood.0 != state {
                mood.0 = state;
                sink.set_satisfaction_visual(id, state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::StraightLineMover;
    use crate::presentation::{RecordingSink, VisualEvent};
    use threshold_logic::grid::GridSpec;
    use threshold_logic::satisfaction::SatisfactionState;

    fn place(
        world: &mut World,
        mover: &mut StraightLineMover,
        grid: &Grid,
        id: u32,
        label: Label,
        cell: Cell,
    ) -> Entity {
        mover.register(ActorId(id), grid.cell_center(cell), 1.0);
        world.spawn((
            Actor {
                id: ActorId(id),
                label,
                bias: 0.0,
            },
            Mood::default(),
        ))
    }

    #[test]
    fn test_mood_from_neighbors() {
        let grid = Grid::new(&GridSpec::default()).unwrap();
        let mut world = World::new();
        let mut mover = StraightLineMover::new();
        let mut sink = RecordingSink::new();

        let center = place(&mut world, &mut mover, &grid, 1, Label::Main, Cell::new(5, 5));
        place(&mut world, &mut mover, &grid, 2, Label::Main, Cell::new(6, 5));
        place(&mut world, &mut mover, &grid, 3, Label::Target, Cell::new(5, 6));
        let loner = place(&mut world, &mut mover, &grid, 4, Label::Main, Cell::new(15, 15));

        mood_system(
            &mut world,
            &grid,
            &SatisfactionConfig::default(),
            &mover,
            &mut sink,
        );

        // One same, one other: 0.5 sits inside the default band.
        assert_eq!(
            world.get::<&Mood>(center).unwrap().0,
            SatisfactionState::Satisfied
        );
        // No neighbors at all: neutral, which is also the starting mood.
        assert_eq!(
            world.get::<&Mood>(loner).unwrap().0,
            SatisfactionState::Neutral
        );
        assert_eq!(sink.events_for(ActorId(4)).count(), 0);
        assert!(sink.events.contains(&VisualEvent::Satisfaction {
            actor: ActorId(1),
            state: SatisfactionState::Satisfied
        }));

        // Re-running with nothing changed is silent.
        let before = sink.events.len();
        mood_system(
            &mut world,
            &grid,
            &SatisfactionConfig::default(),
            &mover,
            &mut sink,
        );
        assert_eq!(sink.events.len(), before);
    }
}
