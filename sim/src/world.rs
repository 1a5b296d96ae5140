//! Map snapshot types.
//!
//! `MapSnapshot` is a serializable view of the grid for renderers and
//! tooling. Only cells that differ from a blank cell are listed.

use crate::components::{Airborne, Lifecycle, ObjectKind};
use crate::coord::{CellIndex, Coord};
use crate::grid::{Cell, CellGrid, MapBounds};
use crate::terrain::LandType;
use crate::visibility::CellRevealed;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of one non-blank cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub index: usize,
    pub x: usize,
    pub y: usize,
    pub template: Option<u16>,
    pub icon: u8,
    pub overlay: Option<u8>,
    pub overlay_data: u8,
    pub smudge: Option<u8>,
    pub land: LandType,
    pub occupied: bool,
    pub overlappers: u8,
    pub mapped: u32,
    pub visible: u32,
}

impl CellSnapshot {
    fn from_cell(index: usize, x: usize, y: usize, cell: &Cell) -> Self {
        Self {
            index,
            x,
            y,
            template: cell.template.map(|t| t.0),
            icon: cell.icon,
            overlay: (!cell.overlay.is_none()).then_some(cell.overlay.0),
            overlay_data: cell.overlay_data,
            smudge: (!cell.smudge.is_none()).then_some(cell.smudge.0),
            land: cell.land,
            occupied: cell.occupier.is_some(),
            overlappers: cell.overlappers.iter().filter(|o| o.is_some()).count() as u8,
            mapped: cell.mapped,
            visible: cell.visible,
        }
    }
}

/// Snapshot of a map object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub id: u32,
    pub kind: ObjectKind,
    pub x: i32,
    pub y: i32,
    pub altitude: i32,
}

/// Complete map state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Simulation frame the snapshot was taken on.
    pub frame: u64,
    pub width: usize,
    pub height: usize,
    pub bounds: MapBounds,
    /// Cells that differ from a blank cell.
    pub cells: Vec<CellSnapshot>,
    /// Live objects.
    pub objects: Vec<ObjectSnapshot>,
    /// Reveals since the last snapshot.
    pub revealed: Vec<CellRevealed>,
    /// Cells redrawn since the last snapshot.
    pub dirty: Vec<usize>,
    /// Cells currently holding Tiberium.
    pub tiberium_cells: usize,
}

impl MapSnapshot {
    /// Create a snapshot from the ECS world. Revealed and dirty lists are
    /// left empty for the caller to fill from their drains.
    pub fn from_world(world: &mut World, frame: u64) -> Self {
        let mut objects = Vec::new();
        let mut query = world.query::<(Entity, &ObjectKind, &Coord, &Lifecycle, Option<&Airborne>)>();
        for (entity, kind, coord, life, air) in query.iter(world) {
            if !life.is_live() {
                continue;
            }
            objects.push(ObjectSnapshot {
                id: entity.index(),
                kind: *kind,
                x: coord.x,
                y: coord.y,
                altitude: air.map_or(0, |a| a.altitude),
            });
        }

        let Some(grid) = world.get_resource::<CellGrid>() else {
            return Self {
                frame,
                objects,
                ..Default::default()
            };
        };

        let blank = Cell::default();
        let mut cells = Vec::new();
        let mut tiberium_cells = 0;
        for (index, cell) in grid.cells().iter().enumerate() {
            if cell.is_tiberium() {
                tiberium_cells += 1;
            }
            if *cell != blank {
                let (x, y) = grid.cell_xy(CellIndex(index));
                cells.push(CellSnapshot::from_cell(index, x, y, cell));
            }
        }

        Self {
            frame,
            width: grid.width(),
            height: grid.height(),
            bounds: grid.bounds(),
            cells,
            objects,
            revealed: Vec::new(),
            dirty: Vec::new(),
            tiberium_cells,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
