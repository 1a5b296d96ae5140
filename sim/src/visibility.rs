//! Per-house sight propagation (fog of war).

use crate::config::ScenarioRules;
use crate::coord::CellIndex;
use crate::grid::CellGrid;
use crate::house::{HouseId, HouseRoster};
use crate::radius::MAX_RADIUS;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// A cell became explored for a house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRevealed {
    pub cell: CellIndex,
    pub house: HouseId,
}

/// Reveals since the renderer last drained them.
#[derive(Resource, Debug, Clone, Default)]
pub struct RevealLog {
    events: Vec<CellRevealed>,
}

impl RevealLog {
    pub fn push(&mut self, event: CellRevealed) {
        self.events.push(event);
    }

    pub fn take(&mut self) -> Vec<CellRevealed> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Reveal everything `house` can see from `cell` with the given range.
///
/// Computer houses only get sight updates when allied vision is shared.
/// Returns the number of newly explored cells.
pub fn sight_from(
    world: &mut World,
    house: HouseId,
    cell: CellIndex,
    range: usize,
    incremental: bool,
) -> usize {
    let Some(is_human) = world
        .get_resource::<HouseRoster>()
        .and_then(|roster| roster.get(house))
        .map(|h| h.is_human)
    else {
        return 0;
    };
    let shared = world
        .get_resource::<ScenarioRules>()
        .is_some_and(|rules| rules.share_ally_visibility);
    if !is_human && !shared {
        return 0;
    }

    if !world.contains_resource::<CellGrid>() {
        return 0;
    }
    world.resource_scope(|world, mut grid: Mut<CellGrid>| {
        let mut log = world.get_resource_or_insert_with(RevealLog::default);
        reveal(&mut grid, &mut log, house, cell, range, incremental)
    })
}

/// Core of `sight_from`, without the house checks.
///
/// With `incremental` only the two outermost rings are walked, which is
/// enough when the viewer moved a single cell since its last update.
pub fn reveal(
    grid: &mut CellGrid,
    log: &mut RevealLog,
    house: HouseId,
    origin: CellIndex,
    range: usize,
    incremental: bool,
) -> usize {
    if range == 0 || range > MAX_RADIUS || !grid.in_bounds(origin) {
        return 0;
    }

    let deltas = if incremental {
        grid.radius().incremental(range)
    } else {
        grid.radius().offsets(range)
    };
    let (origin_x, _) = grid.cell_xy(origin);
    let candidates: Vec<CellIndex> = deltas
        .iter()
        .filter_map(|&delta| grid.offset_raw(origin, delta))
        // Raw deltas can wrap onto a neighbouring row.
        .filter(|&c| grid.cell_xy(c).0.abs_diff(origin_x) <= range)
        .filter(|&c| grid.cell_distance(origin, c) <= range as u32)
        .collect();

    let bit = house.bit();
    let mut revealed = 0;
    for target in candidates {
        let Some(c) = grid.cell_mut(target) else {
            continue;
        };
        if c.mapped & bit != 0 {
            continue;
        }
        c.mapped |= bit;
        c.visible |= bit;
        grid.mark_dirty(target);
        log.push(CellRevealed {
            cell: target,
            house,
        });
        revealed += 1;
    }
    revealed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::house::House;
    use crate::radius::RING_COUNT;

    fn setup(width: usize, height: usize) -> (World, HouseId, HouseId) {
        let mut world = World::new();
        world.insert_resource(CellGrid::new(width, height));
        world.insert_resource(ScenarioRules::default());
        let mut roster = HouseRoster::default();
        let human = roster.add(House::new("GDI", true)).unwrap();
        let ai = roster.add(House::new("Nod", false)).unwrap();
        world.insert_resource(roster);
        (world, human, ai)
    }

    #[test]
    fn test_range_limits() {
        let (mut world, human, _) = setup(32, 32);
        let centre = CellIndex(16 * 32 + 16);
        assert_eq!(sight_from(&mut world, human, centre, 0, false), 0);
        assert_eq!(sight_from(&mut world, human, centre, 11, false), 0);

        let revealed = sight_from(&mut world, human, centre, 10, false);
        assert!(revealed >= 1);
        let grid = world.resource::<CellGrid>();
        assert!(grid.cell(centre).unwrap().is_mapped(human));
        assert!(grid.cell(centre).unwrap().is_visible(human));
    }

    #[test]
    fn test_full_disk_count_and_no_repeat() {
        let (mut world, human, _) = setup(32, 32);
        let centre = CellIndex(16 * 32 + 16);
        assert_eq!(sight_from(&mut world, human, centre, 3, false), RING_COUNT[3]);
        assert_eq!(sight_from(&mut world, human, centre, 3, false), 0);
        assert_eq!(world.resource_mut::<RevealLog>().take().len(), RING_COUNT[3]);
    }

    #[test]
    fn test_incremental_covers_new_edge() {
        let (mut world, human, _) = setup(32, 32);
        let start = CellIndex(16 * 32 + 16);
        sight_from(&mut world, human, start, 4, false);

        // One step east; only the far edge is new.
        let moved = CellIndex(16 * 32 + 17);
        let revealed = sight_from(&mut world, human, moved, 4, true);
        assert!(revealed > 0);

        let grid = world.resource::<CellGrid>();
        let mut full = RevealLog::default();
        let mut copy = grid.clone();
        assert_eq!(reveal(&mut copy, &mut full, human, moved, 4, false), 0);
    }

    #[test]
    fn test_no_row_wrap() {
        let (mut world, human, _) = setup(20, 20);
        let origin = CellIndex(10 * 20);
        sight_from(&mut world, human, origin, 3, false);
        let grid = world.resource::<CellGrid>();
        for (i, c) in grid.cells().iter().enumerate() {
            if c.is_mapped(human) {
                let (x, _) = grid.cell_xy(CellIndex(i));
                assert!(x <= 3, "cell {i} wrapped");
            }
        }
    }

    #[test]
    fn test_computer_house_needs_shared_vision() {
        let (mut world, _, ai) = setup(16, 16);
        let cell = CellIndex(8 * 16 + 8);
        assert_eq!(sight_from(&mut world, ai, cell, 2, false), 0);

        world.resource_mut::<ScenarioRules>().share_ally_visibility = true;
        assert_eq!(sight_from(&mut world, ai, cell, 2, false), RING_COUNT[2]);
    }

    #[test]
    fn test_unknown_house_and_off_map_origin() {
        let (mut world, human, _) = setup(16, 16);
        assert_eq!(sight_from(&mut world, HouseId(7), CellIndex(0), 2, false), 0);

        world.resource_mut::<CellGrid>().set_bounds(2, 2, 10, 10);
        assert_eq!(sight_from(&mut world, human, CellIndex(0), 2, false), 0);
        assert_eq!(sight_from(&mut world, human, CellIndex(3 * 16 + 3), 1, false), 9);
    }

    #[test]
    fn test_no_grid_reveals_nothing() {
        let (mut world, human, _) = setup(4, 4);
        world.remove_resource::<CellGrid>();
        assert_eq!(sight_from(&mut world, human, CellIndex(5), 2, false), 0);
        assert!(world.get_resource::<RevealLog>().map_or(true, |log| log.is_empty()));
    }
}
