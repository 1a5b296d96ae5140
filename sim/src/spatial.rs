//! Spatial queries over the cell grid.
//!
//! Lookups go through the grid's occupier chains rather than scanning every
//! object, so each query touches a handful of cells. Airborne objects are
//! the exception: they are not grid indexed and are checked separately.

use crate::components::{Airborne, Cloaked, Lifecycle, ObjectKind, Owner};
use crate::coord::{CellIndex, Coord};
use crate::grid::CellGrid;
use crate::house::{HouseId, HouseRoster};
use crate::occupancy::occupiers;
use bevy_ecs::prelude::*;

/// Region edge length in cells.
pub const REGION_SIZE: usize = 4;

/// Farthest an object's reference point may be from the query coordinate
/// (a quarter cell, in leptons).
pub const CLOSE_DISTANCE: u32 = 0x40;

/// Candidates gathered by `nearby_clear_cell` before it stops looking.
const NEARBY_CANDIDATES: usize = 10;

/// Regions per row, including a one-region margin on each side.
pub fn region_columns(width: usize) -> usize {
    width.div_ceil(REGION_SIZE) + 2
}

/// Coarse region containing `cell`, for per-house threat tracking.
pub fn cell_region(grid: &CellGrid, cell: CellIndex) -> usize {
    let (x, y) = grid.cell_xy(cell);
    (x / REGION_SIZE + 1) + (y / REGION_SIZE + 1) * region_columns(grid.width())
}

/// Threat `house` assigns to `cell`'s region. A visible cell in a quiet
/// region still reports 1.
pub fn cell_threat(grid: &CellGrid, roster: &HouseRoster, cell: CellIndex, house: HouseId) -> i32 {
    let region = cell_region(grid, cell);
    let threat = roster.get(house).map_or(0, |h| h.threat_value(region));
    if threat == 0 && grid.cell(cell).is_some_and(|c| c.is_visible(house)) {
        1
    } else {
        threat
    }
}

fn hidden_from(world: &World, entity: Entity, viewer: Option<HouseId>) -> bool {
    if world.get::<Cloaked>(entity).is_none() {
        return false;
    }
    let owner = world.get::<Owner>(entity).map(|o| o.0);
    owner.is_none() || owner != viewer
}

/// Nearest object to `coord` within `CLOSE_DISTANCE`.
///
/// Grid objects in the 3x3 block around `coord` are measured from their
/// coordinate, except buildings which are measured from the centre of each
/// cell they occupy. Cloaked objects are skipped unless `viewer` owns them.
pub fn closest_object(world: &mut World, coord: Coord, viewer: Option<HouseId>) -> Option<Entity> {
    let flyers: Vec<(Entity, Coord)> = world
        .query::<(Entity, &Coord, &Airborne, Option<&Lifecycle>)>()
        .iter(world)
        .filter(|(_, _, _, life)| life.map_or(true, |l| l.is_live()))
        .map(|(e, c, air, _)| (e, Coord::new(c.x, c.y - air.altitude)))
        .collect();

    let world: &World = world;
    let grid = world.get_resource::<CellGrid>()?;
    let mut best: Option<(u32, Entity)> = None;
    let mut consider = |distance: u32, entity: Entity| {
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, entity));
        }
    };

    if let Some((cx, cy)) = coord.cell_xy() {
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let (x, y) = (cx as i64 + dx, cy as i64 + dy);
                if x < 0 || y < 0 {
                    continue;
                }
                let Some(cell) = grid.xy_cell(x as usize, y as usize) else {
                    continue;
                };
                if !grid.in_bounds(cell) {
                    continue;
                }
                for entity in occupiers(world, grid, cell) {
                    if hidden_from(world, entity, viewer) {
                        continue;
                    }
                    let distance = if world.get::<ObjectKind>(entity) == Some(&ObjectKind::Building) {
                        let d = coord.distance(grid.cell_coord(cell));
                        if d > CLOSE_DISTANCE {
                            continue;
                        }
                        d
                    } else {
                        match world.get::<Coord>(entity) {
                            Some(c) => coord.distance(*c),
                            None => continue,
                        }
                    };
                    consider(distance, entity);
                }
            }
        }
    }

    for (entity, lifted) in flyers {
        if !hidden_from(world, entity, viewer) {
            consider(coord.distance(lifted), entity);
        }
    }

    best.filter(|(d, _)| *d <= CLOSE_DISTANCE).map(|(_, e)| e)
}

/// A clear cell near `cell`, searched in growing square rings.
///
/// The first ring containing any clear cell supplies up to
/// `NEARBY_CANDIDATES` options; `frame` picks among them so every peer
/// makes the same choice on the same frame.
pub fn nearby_clear_cell(grid: &CellGrid, cell: CellIndex, frame: u64) -> Option<CellIndex> {
    if cell.0 >= grid.len() {
        return None;
    }
    let (cx, cy) = grid.cell_xy(cell);
    let (cx, cy) = (cx as i64, cy as i64);
    let bounds = grid.bounds();
    let max_ring = grid.width().max(grid.height()) as i64;

    let mut found = Vec::with_capacity(NEARBY_CANDIDATES);
    for ring in 0..=max_ring {
        for (x, y) in ring_perimeter(cx, cy, ring) {
            if found.len() >= NEARBY_CANDIDATES {
                break;
            }
            if x < 0 || y < 0 || !bounds.contains(x as usize, y as usize) {
                continue;
            }
            if let Some(candidate) = grid.xy_cell(x as usize, y as usize) {
                if grid.is_clear_to_move(candidate) {
                    found.push(candidate);
                }
            }
        }
        if !found.is_empty() {
            return Some(found[(frame % found.len() as u64) as usize]);
        }
    }
    None
}

/// Cells on the edge of the square of radius `ring` around `(cx, cy)`,
/// each listed once: top row, bottom row, then the two sides.
fn ring_perimeter(cx: i64, cy: i64, ring: i64) -> Vec<(i64, i64)> {
    if ring == 0 {
        return vec![(cx, cy)];
    }
    let mut cells = Vec::with_capacity((ring * 8) as usize);
    for x in cx - ring..=cx + ring {
        cells.push((x, cy - ring));
    }
    for x in cx - ring..=cx + ring {
        cells.push((x, cy + ring));
    }
    for y in cy - ring + 1..cy + ring {
        cells.push((cx - ring, y));
        cells.push((cx + ring, y));
    }
    cells
}
