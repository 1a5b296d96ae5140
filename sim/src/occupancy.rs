//! Occupier and overlapper bookkeeping.
//!
//! A cell's occupier chain is a singly linked list: the cell holds the
//! head, and each object's `NextOccupier` holds its successor for that
//! cell. Overlappers are cosmetic and live in three fixed slots per cell.
//!
//! Every operation is a no-op for an entity without a `Footprint`, which
//! covers despawned handles. Offsets that fall off the grid are skipped.

use crate::components::{Footprint, Locomotion, NextOccupier};
use crate::coord::CellIndex;
use crate::error::{MapError, Result};
use crate::grid::CellGrid;
use crate::terrain::{OverlayId, SmudgeId, TemplateId};
use bevy_ecs::prelude::*;
use tracing::debug;

/// Follow a chain from `head`. Stops early if a link loops back.
pub fn walk_chain(head: Option<Entity>, next_of: impl Fn(Entity) -> Option<Entity>) -> Vec<Entity> {
    let mut chain = Vec::new();
    let mut cursor = head;
    while let Some(entity) = cursor {
        if chain.contains(&entity) {
            break;
        }
        chain.push(entity);
        cursor = next_of(entity);
    }
    chain
}

/// Objects in `cell`'s occupier chain, head first.
pub fn occupiers(world: &World, grid: &CellGrid, cell: CellIndex) -> Vec<Entity> {
    let head = grid.cell(cell).and_then(|c| c.occupier);
    walk_chain(head, |e| {
        world
            .get::<NextOccupier>(e)
            .and_then(|n| n.next(cell))
            .flatten()
    })
}

/// Put an object on the map: occupy its logical footprint and overlap its
/// cosmetic one.
pub fn place_down(world: &mut World, cell: CellIndex, object: Entity) {
    let Some(footprint) = world.get::<Footprint>(object).cloned() else {
        return;
    };
    if !world.contains_resource::<CellGrid>() {
        return;
    }
    world.resource_scope(|world, mut grid: Mut<CellGrid>| {
        for &offset in footprint.occupy.iter() {
            if let Some(target) = grid.offset_cell(cell, offset) {
                occupy_down(world, &mut grid, target, object);
                grid.recalc_attributes(target);
                grid.mark_dirty(target);
            }
        }
        overlap_cells_down(&mut grid, cell, &footprint, object);
    });
}

/// Exact inverse of `place_down`.
pub fn pick_up(world: &mut World, cell: CellIndex, object: Entity) {
    let Some(footprint) = world.get::<Footprint>(object).cloned() else {
        return;
    };
    if !world.contains_resource::<CellGrid>() {
        return;
    }
    world.resource_scope(|world, mut grid: Mut<CellGrid>| {
        for &offset in footprint.occupy.iter() {
            if let Some(target) = grid.offset_cell(cell, offset) {
                occupy_up(world, &mut grid, target, object);
                grid.recalc_attributes(target);
                grid.mark_dirty(target);
            }
        }
        overlap_cells_up(&mut grid, cell, &footprint, object);
    });
}

/// Add only the cosmetic footprint.
pub fn overlap_down(world: &mut World, cell: CellIndex, object: Entity) {
    let Some(footprint) = world.get::<Footprint>(object).cloned() else {
        return;
    };
    if !world.contains_resource::<CellGrid>() {
        return;
    }
    world.resource_scope(|_, mut grid: Mut<CellGrid>| {
        overlap_cells_down(&mut grid, cell, &footprint, object);
    });
}

/// Remove only the cosmetic footprint.
pub fn overlap_up(world: &mut World, cell: CellIndex, object: Entity) {
    let Some(footprint) = world.get::<Footprint>(object).cloned() else {
        return;
    };
    if !world.contains_resource::<CellGrid>() {
        return;
    }
    world.resource_scope(|_, mut grid: Mut<CellGrid>| {
        overlap_cells_up(&mut grid, cell, &footprint, object);
    });
}

fn occupy_down(world: &mut World, grid: &mut CellGrid, cell: CellIndex, object: Entity) {
    if occupiers(world, grid, cell).contains(&object) {
        return;
    }
    let Some(head) = grid.cell(cell).map(|c| c.occupier) else {
        return;
    };
    let Some(mut links) = world.get_mut::<NextOccupier>(object) else {
        return;
    };
    links.set(cell, head);
    if let Some(c) = grid.cell_mut(cell) {
        c.occupier = Some(object);
    }
}

fn occupy_up(world: &mut World, grid: &mut CellGrid, cell: CellIndex, object: Entity) {
    let Some(next) = world.get::<NextOccupier>(object).and_then(|n| n.next(cell)) else {
        return;
    };
    let chain = occupiers(world, grid, cell);
    match chain.iter().position(|&e| e == object) {
        Some(0) => {
            if let Some(c) = grid.cell_mut(cell) {
                c.occupier = next;
            }
        }
        Some(pos) => {
            if let Some(mut prev) = world.get_mut::<NextOccupier>(chain[pos - 1]) {
                prev.set(cell, next);
            }
        }
        None => {}
    }
    if let Some(mut links) = world.get_mut::<NextOccupier>(object) {
        links.remove(cell);
    }
}

fn overlap_cells_down(grid: &mut CellGrid, cell: CellIndex, footprint: &Footprint, object: Entity) {
    for &offset in footprint.overlap.iter() {
        let Some(target) = grid.offset_cell(cell, offset) else {
            continue;
        };
        if let Some(c) = grid.cell_mut(target) {
            if !c.overlappers.contains(&Some(object)) {
                // Fill the last free slot; a full cell drops the overlap.
                if let Some(slot) = c.overlappers.iter_mut().rev().find(|s| s.is_none()) {
                    *slot = Some(object);
                }
            }
        }
        grid.mark_dirty(target);
    }
}

fn overlap_cells_up(grid: &mut CellGrid, cell: CellIndex, footprint: &Footprint, object: Entity) {
    for &offset in footprint.overlap.iter() {
        let Some(target) = grid.offset_cell(cell, offset) else {
            continue;
        };
        if let Some(c) = grid.cell_mut(target) {
            if let Some(slot) = c.overlappers.iter_mut().find(|s| **s == Some(object)) {
                *slot = None;
            }
        }
        grid.mark_dirty(target);
    }
}

/// Lay a terrain template with its top-left icon at `cell`.
///
/// Each covered cell is tried first: its occupiers are lifted out, the new
/// tile is swapped in, and every lifted object must still be able to stand
/// there. The old tile and occupiers go back regardless. Only when every
/// cell passes is the template written, clearing overlays and smudges under
/// it. On error nothing has changed.
pub fn place_template(world: &mut World, cell: CellIndex, template: TemplateId) -> Result<()> {
    if !world.contains_resource::<CellGrid>() {
        return Err(MapError::NotAllocated);
    }
    world.resource_scope(|world, mut grid: Mut<CellGrid>| {
        place_template_in(world, &mut grid, cell, template)
    })
}

fn place_template_in(
    world: &World,
    grid: &mut CellGrid,
    cell: CellIndex,
    template: TemplateId,
) -> Result<()> {
    let def = grid
        .catalog()
        .get(template)
        .cloned()
        .ok_or(MapError::UnknownTemplate(template.0))?;
    let blocked = |at: CellIndex, reason: String| MapError::PlacementBlocked {
        template: template.0,
        cell: at,
        reason,
    };

    let (x0, y0) = grid.cell_xy(cell);
    let mut covered = Vec::with_capacity(def.icon_count());
    for dy in 0..def.height as usize {
        for dx in 0..def.width as usize {
            let icon = (dy * def.width as usize + dx) as u8;
            if !def.has_icon(icon) {
                continue;
            }
            let target = grid
                .xy_cell(x0 + dx, y0 + dy)
                .filter(|&c| grid.in_bounds(c))
                .ok_or_else(|| blocked(cell, format!("icon {icon} falls off the map")))?;
            covered.push((target, icon));
        }
    }

    for &(target, icon) in &covered {
        let lifted = occupiers(world, grid, target);
        if lifted.is_empty() {
            continue;
        }
        let Some(original) = grid.cell(target).cloned() else {
            continue;
        };

        if let Some(c) = grid.cell_mut(target) {
            c.occupier = None;
            c.template = Some(template);
            c.icon = icon;
            c.overlay = OverlayId::NONE;
        }
        grid.recalc_attributes(target);
        let land = grid.cell(target).map(|c| c.land).unwrap_or_default();
        let stuck = lifted.iter().copied().find(|&e| {
            let locomotion = world.get::<Locomotion>(e).copied().unwrap_or_default();
            !locomotion.can_enter(land)
        });

        if let Some(c) = grid.cell_mut(target) {
            c.occupier = original.occupier;
            c.template = original.template;
            c.icon = original.icon;
            c.overlay = original.overlay;
        }
        grid.recalc_attributes(target);

        if let Some(entity) = stuck {
            debug!(?entity, cell = target.0, "template placement blocked");
            return Err(blocked(target, format!("{entity:?} cannot stand on {land:?}")));
        }
    }

    for (target, icon) in covered {
        if let Some(c) = grid.cell_mut(target) {
            c.template = Some(template);
            c.icon = icon;
            c.overlay = OverlayId::NONE;
            c.overlay_data = 0;
            c.smudge = SmudgeId::NONE;
            c.smudge_data = 0;
        }
        grid.recalc_attributes(target);
        grid.mark_dirty(target);
    }
    Ok(())
}
