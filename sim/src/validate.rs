//! Consistency checks and repair for the grid.
//!
//! `validate` is a debugging aid: it stops at the first problem and only
//! reports it. `clean` is the one repair path, and only for overlapper
//! slots, which can be left pointing at objects that were removed without
//! being picked up first.

use crate::components::Lifecycle;
use crate::coord::{CellIndex, Coord};
use crate::grid::{CellGrid, OVERLAPPER_SLOTS};
use crate::occupancy::occupiers;
use crate::terrain::LandType;
use bevy_ecs::prelude::*;
use thiserror::Error;
use tracing::warn;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Why an object reference in a cell is not acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFault {
    /// The handle no longer names a map object.
    Missing,
    Inactive,
    InLimbo,
    /// Its coordinate does not decode to a cell on the grid.
    OffMap,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("cell {cell}: template {template} not in catalog")]
    Template { cell: CellIndex, template: u16 },

    #[error("cell {cell}: icon {icon} not in template {template}")]
    Icon { cell: CellIndex, template: u16, icon: u8 },

    #[error("cell {cell}: overlay {overlay} out of range")]
    Overlay { cell: CellIndex, overlay: u8 },

    #[error("cell {cell}: smudge {smudge} out of range")]
    Smudge { cell: CellIndex, smudge: u8 },

    #[error("cell {cell}: land {found:?} should be {expected:?}")]
    Land {
        cell: CellIndex,
        found: LandType,
        expected: LandType,
    },

    #[error("cell {cell}: occupier {entity:?} is {fault:?}")]
    Occupier {
        cell: CellIndex,
        entity: Entity,
        fault: ObjectFault,
    },

    #[error("cell {cell}: overlapper slot {slot} ({entity:?}) is {fault:?}")]
    Overlapper {
        cell: CellIndex,
        slot: usize,
        entity: Entity,
        fault: ObjectFault,
    },
}

/// What `clean` removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub cleared: Vec<(CellIndex, usize, Entity)>,
}

fn object_fault(world: &World, grid: &CellGrid, entity: Entity) -> Option<ObjectFault> {
    let Some(life) = world.get::<Lifecycle>(entity) else {
        return Some(ObjectFault::Missing);
    };
    if !life.active {
        return Some(ObjectFault::Inactive);
    }
    if life.in_limbo {
        return Some(ObjectFault::InLimbo);
    }
    match world.get::<Coord>(entity) {
        Some(coord) if grid.coord_cell(*coord).is_some() => None,
        _ => Some(ObjectFault::OffMap),
    }
}

fn check_cell(world: &World, grid: &CellGrid, index: usize) -> Option<Violation> {
    let cell = CellIndex(index);
    let c = grid.cell(cell)?;

    if let Some(template) = c.template {
        match grid.catalog().get(template) {
            None => {
                return Some(Violation::Template {
                    cell,
                    template: template.0,
                })
            }
            Some(def) if !def.has_icon(c.icon) => {
                return Some(Violation::Icon {
                    cell,
                    template: template.0,
                    icon: c.icon,
                })
            }
            Some(_) => {}
        }
    }
    if !c.overlay.is_valid() {
        return Some(Violation::Overlay {
            cell,
            overlay: c.overlay.0,
        });
    }
    if !c.smudge.is_valid() {
        return Some(Violation::Smudge {
            cell,
            smudge: c.smudge.0,
        });
    }
    let expected = grid.expected_land(c);
    if c.land != expected {
        return Some(Violation::Land {
            cell,
            found: c.land,
            expected,
        });
    }

    for entity in occupiers(world, grid, cell) {
        if let Some(fault) = object_fault(world, grid, entity) {
            return Some(Violation::Occupier { cell, entity, fault });
        }
    }
    for (slot, entity) in c.overlappers.iter().enumerate() {
        let Some(entity) = *entity else {
            continue;
        };
        if let Some(fault) = object_fault(world, grid, entity) {
            return Some(Violation::Overlapper {
                cell,
                slot,
                entity,
                fault,
            });
        }
    }
    None
}

/// First problem found, scanning cells in index order.
#[cfg(not(feature = "parallel"))]
pub fn first_violation(world: &World) -> Option<Violation> {
    let grid = world.get_resource::<CellGrid>()?;
    (0..grid.len()).find_map(|i| check_cell(world, grid, i))
}

/// First problem found, scanning cells in index order.
#[cfg(feature = "parallel")]
pub fn first_violation(world: &World) -> Option<Violation> {
    let grid = world.get_resource::<CellGrid>()?;
    (0..grid.len())
        .into_par_iter()
        .find_map_first(|i| check_cell(world, grid, i))
}

/// Whether every cell passes its consistency checks.
pub fn validate(world: &World) -> bool {
    match first_violation(world) {
        Some(violation) => {
            warn!(%violation, "grid validation failed");
            false
        }
        None => true,
    }
}

/// Empty overlapper slots that point at missing, inactive or limbo objects.
/// Occupier chains are left alone.
pub fn clean(world: &mut World) -> CleanReport {
    let mut report = CleanReport::default();
    if !world.contains_resource::<CellGrid>() {
        return report;
    }
    world.resource_scope(|world, mut grid: Mut<CellGrid>| {
        for index in 0..grid.len() {
            let cell = CellIndex(index);
            for slot in 0..OVERLAPPER_SLOTS {
                let Some(entity) = grid.cell(cell).and_then(|c| c.overlappers[slot]) else {
                    continue;
                };
                let fault = object_fault(world, &grid, entity);
                if matches!(
                    fault,
                    Some(ObjectFault::Missing | ObjectFault::Inactive | ObjectFault::InLimbo)
                ) {
                    warn!(cell = index, slot, ?entity, ?fault, "clearing stale overlapper");
                    if let Some(c) = grid.cell_mut(cell) {
                        c.overlappers[slot] = None;
                    }
                    grid.mark_dirty(cell);
                    report.cleared.push((cell, slot, entity));
                }
            }
        }
    });
    report
}
