//! The cell grid.
//!
//! Cells are stored row-major in a single allocation sized once per
//! scenario. A separate playable rectangle (`MapBounds`) decides what counts
//! as "on the map"; the border outside it is allocated but inert.

use crate::components::Locomotion;
use crate::coord::{dragon_distance, CellIndex, CellOffset, Coord, Facing};
use crate::error::{MapError, Result};
use crate::house::HouseId;
use crate::radius::RadiusTable;
use crate::random::SyncRandom;
use crate::terrain::{LandType, OverlayId, OverlayType, SmudgeId, TemplateCatalog, TemplateId};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Overlapper slots per cell.
pub const OVERLAPPER_SLOTS: usize = 3;

/// Highest Tiberium density.
pub const MAX_TIBERIUM_DENSITY: u8 = 11;

/// Credits per density step when valuing a field.
pub const TIBERIUM_STEP: u32 = 25;

/// Density assigned from the number of adjacent Tiberium cells when a map
/// is first settled.
const TIBERIUM_ADJUST: [u8; 9] = [0, 1, 3, 4, 6, 7, 8, 10, 11];

/// Attempts made by `place_random_crate` before giving up.
const CRATE_ATTEMPTS: usize = 100;

/// One grid slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub template: Option<TemplateId>,
    pub icon: u8,
    pub overlay: OverlayId,
    /// Tiberium density for Tiberium overlays, free-form otherwise.
    pub overlay_data: u8,
    pub smudge: SmudgeId,
    pub smudge_data: u8,
    /// Derived by `CellGrid::recalc_attributes`.
    pub land: LandType,
    pub owner: Option<HouseId>,
    /// Head of this cell's occupier chain. The rest of the chain lives in
    /// each object's `NextOccupier` component.
    pub occupier: Option<Entity>,
    pub overlappers: [Option<Entity>; OVERLAPPER_SLOTS],
    /// Explored bits, one per house.
    pub mapped: u32,
    /// Currently visible bits, one per house.
    pub visible: u32,
    pub has_waypoint: bool,
    pub has_trigger: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            template: None,
            icon: 0,
            overlay: OverlayId::NONE,
            overlay_data: 0,
            smudge: SmudgeId::NONE,
            smudge_data: 0,
            land: LandType::Clear,
            owner: None,
            occupier: None,
            overlappers: [None; OVERLAPPER_SLOTS],
            mapped: 0,
            visible: 0,
            has_waypoint: false,
            has_trigger: false,
        }
    }
}

impl Cell {
    pub fn is_mapped(&self, house: HouseId) -> bool {
        self.mapped & house.bit() != 0
    }

    pub fn is_visible(&self, house: HouseId) -> bool {
        self.visible & house.bit() != 0
    }

    pub fn is_tiberium(&self) -> bool {
        self.land == LandType::Tiberium
    }
}

/// Playable rectangle in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapBounds {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl MapBounds {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// The cell array plus everything derived from its dimensions.
#[derive(Resource, Debug, Clone)]
pub struct CellGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    bounds: MapBounds,
    radius: RadiusTable,
    catalog: TemplateCatalog,
    dirty: Vec<CellIndex>,
    dirty_flags: Vec<bool>,
    /// Credit value of all Tiberium as of the last `overpass`.
    total_value: u32,
}

impl Default for CellGrid {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl CellGrid {
    /// Create a grid of default cells covering the whole allocation.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_catalog(width, height, TemplateCatalog::standard())
    }

    pub fn with_catalog(width: usize, height: usize, catalog: TemplateCatalog) -> Self {
        let total = width * height;
        Self {
            width,
            height,
            cells: vec![Cell::default(); total],
            bounds: MapBounds {
                x: 0,
                y: 0,
                width,
                height,
            },
            radius: RadiusTable::new(width),
            catalog,
            dirty: Vec::new(),
            dirty_flags: vec![false; total],
            total_value: 0,
        }
    }

    /// Reallocate for a new scenario. All cells are reset and the playable
    /// rectangle becomes the whole allocation.
    pub fn alloc(&mut self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidDimensions { width, height });
        }
        let catalog = std::mem::take(&mut self.catalog);
        *self = Self::with_catalog(width, height, catalog);
        info!(width, height, "allocated cell grid");
        Ok(())
    }

    /// Reset every cell to its default state without reallocating.
    pub fn init_clear(&mut self) {
        self.cells.fill(Cell::default());
        self.dirty.clear();
        self.dirty_flags.fill(false);
        self.total_value = 0;
        debug!(cells = self.cells.len(), "cleared cell grid");
    }

    pub fn set_bounds(&mut self, x: usize, y: usize, width: usize, height: usize) {
        self.bounds = MapBounds {
            x,
            y,
            width,
            height,
        };
    }

    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total allocated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, cell: CellIndex) -> Option<&Cell> {
        self.cells.get(cell.0)
    }

    pub fn cell_mut(&mut self, cell: CellIndex) -> Option<&mut Cell> {
        self.cells.get_mut(cell.0)
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn radius(&self) -> &RadiusTable {
        &self.radius
    }

    pub fn total_value(&self) -> u32 {
        self.total_value
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    pub fn xy_cell(&self, x: usize, y: usize) -> Option<CellIndex> {
        (x < self.width && y < self.height).then(|| CellIndex(y * self.width + x))
    }

    pub fn cell_xy(&self, cell: CellIndex) -> (usize, usize) {
        if self.width == 0 {
            return (0, 0);
        }
        (cell.0 % self.width, cell.0 / self.width)
    }

    pub fn coord_cell(&self, coord: Coord) -> Option<CellIndex> {
        coord.cell_xy().and_then(|(x, y)| self.xy_cell(x, y))
    }

    pub fn cell_coord(&self, cell: CellIndex) -> Coord {
        let (x, y) = self.cell_xy(cell);
        Coord::cell_center(x, y)
    }

    /// Inside the allocation and inside the playable rectangle.
    pub fn in_bounds(&self, cell: CellIndex) -> bool {
        if cell.0 >= self.cells.len() {
            return false;
        }
        let (x, y) = self.cell_xy(cell);
        self.bounds.contains(x, y)
    }

    /// Approximate distance in cells: `max(dx, dy) + min(dx, dy) / 2`.
    pub fn cell_distance(&self, a: CellIndex, b: CellIndex) -> u32 {
        let (ax, ay) = self.cell_xy(a);
        let (bx, by) = self.cell_xy(b);
        dragon_distance(ax.abs_diff(bx) as u32, ay.abs_diff(by) as u32)
    }

    /// Apply a footprint offset, rejecting results off the allocation
    /// (including row wrap).
    pub fn offset_cell(&self, cell: CellIndex, offset: CellOffset) -> Option<CellIndex> {
        let (x, y) = self.cell_xy(cell);
        let nx = x as i64 + offset.dx as i64;
        let ny = y as i64 + offset.dy as i64;
        if nx < 0 || ny < 0 {
            return None;
        }
        self.xy_cell(nx as usize, ny as usize)
    }

    /// Raw index arithmetic; only the allocation range is checked.
    pub fn offset_raw(&self, cell: CellIndex, delta: isize) -> Option<CellIndex> {
        let target = cell.0 as isize + delta;
        (target >= 0 && (target as usize) < self.cells.len()).then(|| CellIndex(target as usize))
    }

    pub fn adjacent(&self, cell: CellIndex, facing: Facing) -> Option<CellIndex> {
        let (dx, dy) = facing.delta();
        self.offset_cell(cell, CellOffset::new(dx as i16, dy as i16))
    }

    // ========================================================================
    // Derived attributes
    // ========================================================================

    /// Land type implied by a cell's overlay and template.
    pub fn expected_land(&self, cell: &Cell) -> LandType {
        if let Some(kind) = cell.overlay.kind() {
            if kind.land() != LandType::Clear {
                return kind.land();
            }
        }
        match cell.template.and_then(|t| self.catalog.get(t)) {
            Some(def) => def.land_for(cell.icon),
            None => LandType::Clear,
        }
    }

    pub fn recalc_attributes(&mut self, cell: CellIndex) {
        let Some(current) = self.cells.get(cell.0) else {
            return;
        };
        let land = self.expected_land(current);
        self.cells[cell.0].land = land;
    }

    pub fn recalc_all(&mut self) {
        for i in 0..self.cells.len() {
            self.recalc_attributes(CellIndex(i));
        }
    }

    /// Queue a cell for redraw. Repeated marks before `take_dirty` collapse.
    pub fn mark_dirty(&mut self, cell: CellIndex) {
        if let Some(flag) = self.dirty_flags.get_mut(cell.0) {
            if !*flag {
                *flag = true;
                self.dirty.push(cell);
            }
        }
    }

    /// Drain the redraw queue in the order cells were first marked.
    pub fn take_dirty(&mut self) -> Vec<CellIndex> {
        for cell in &self.dirty {
            self.dirty_flags[cell.0] = false;
        }
        std::mem::take(&mut self.dirty)
    }

    pub fn is_bridge(&self, cell: &Cell) -> bool {
        cell.template
            .and_then(|t| self.catalog.get(t))
            .is_some_and(|def| def.bridge)
    }

    /// Free of objects, walls and owned building bibs, on buildable land.
    pub fn is_generally_clear(&self, cell: CellIndex) -> bool {
        let Some(c) = self.cells.get(cell.0) else {
            return false;
        };
        if c.occupier.is_some() {
            return false;
        }
        if c.smudge.is_bib() && c.owner.is_some() {
            return false;
        }
        if let Some(kind) = c.overlay.kind() {
            if kind == OverlayType::FlagSpot || kind.is_wall() {
                return false;
            }
        }
        c.land.is_buildable()
    }

    /// A tracked vehicle could drive in right now.
    pub fn is_clear_to_move(&self, cell: CellIndex) -> bool {
        self.cells
            .get(cell.0)
            .is_some_and(|c| c.occupier.is_none() && Locomotion::Track.can_enter(c.land))
    }

    // ========================================================================
    // Overlays
    // ========================================================================

    /// Set a cell's overlay and refresh its land.
    pub fn set_overlay(&mut self, cell: CellIndex, overlay: impl Into<OverlayId>, data: u8) {
        let Some(c) = self.cells.get_mut(cell.0) else {
            return;
        };
        c.overlay = overlay.into();
        c.overlay_data = data;
        self.recalc_attributes(cell);
        self.mark_dirty(cell);
    }

    /// Settle freshly loaded Tiberium inside the playable rectangle: each
    /// field's variant is re-rolled and its density is set from how many
    /// neighbours also hold Tiberium. Rewritten cells are queued for redraw.
    /// Returns (and records) the total credit value.
    pub fn overpass(&mut self, rng: &mut SyncRandom) -> u32 {
        let b = self.bounds;
        let mut total = 0;
        for y in b.y..b.y + b.height {
            for x in b.x..b.x + b.width {
                let Some(cell) = self.xy_cell(x, y) else {
                    continue;
                };
                let i = cell.0;
                if !self.cells[i].overlay.is_tiberium() {
                    continue;
                }
                let variant = rng.pick(
                    OverlayType::Tiberium1 as i32,
                    OverlayType::Tiberium12 as i32,
                );
                let overlay = OverlayId(variant as u8);

                let neighbours = Facing::ALL
                    .iter()
                    .filter_map(|&f| self.adjacent(cell, f))
                    .filter(|&adj| self.cells[adj.0].overlay.is_tiberium())
                    .count();
                let density = TIBERIUM_ADJUST[neighbours];

                let c = &mut self.cells[i];
                if c.overlay != overlay || c.overlay_data != density {
                    c.overlay = overlay;
                    c.overlay_data = density;
                    self.mark_dirty(cell);
                }
                total += (density as u32 + 1) * TIBERIUM_STEP;
            }
        }
        self.total_value = total;
        debug!(total, "settled tiberium");
        total
    }

    /// Drop a wood crate on a random generally clear, overlay-free cell.
    pub fn place_random_crate(&mut self, rng: &mut SyncRandom) -> Option<CellIndex> {
        let b = self.bounds;
        if b.width == 0 || b.height == 0 {
            return None;
        }
        for _ in 0..CRATE_ATTEMPTS {
            let x = rng.pick(b.x as i32, (b.x + b.width - 1) as i32) as usize;
            let y = rng.pick(b.y as i32, (b.y + b.height - 1) as i32) as usize;
            let Some(cell) = self.xy_cell(x, y) else {
                continue;
            };
            if self.is_generally_clear(cell) && self.cells[cell.0].overlay.is_none() {
                self.set_overlay(cell, OverlayType::WoodCrate, 0);
                return Some(cell);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xy_round_trip() {
        let grid = CellGrid::new(13, 7);
        for y in 0..7 {
            for x in 0..13 {
                let cell = grid.xy_cell(x, y).unwrap();
                assert_eq!(grid.cell_xy(cell), (x, y));
            }
        }
        assert_eq!(grid.xy_cell(13, 0), None);
    }

    #[test]
    fn test_cell_distance_example() {
        let grid = CellGrid::new(10, 10);
        let a = grid.xy_cell(0, 0).unwrap();
        let b = grid.xy_cell(3, 4).unwrap();
        assert_eq!(grid.cell_distance(a, b), 5);
        assert_eq!(grid.cell_distance(b, a), 5);
        assert_eq!(grid.cell_distance(a, a), 0);
    }

    #[test]
    fn test_in_bounds_rejects_border() {
        let mut grid = CellGrid::new(10, 10);
        grid.set_bounds(2, 2, 5, 5);
        assert!(grid.in_bounds(grid.xy_cell(2, 2).unwrap()));
        assert!(grid.in_bounds(grid.xy_cell(6, 6).unwrap()));
        assert!(!grid.in_bounds(grid.xy_cell(7, 2).unwrap()));
        assert!(!grid.in_bounds(grid.xy_cell(1, 3).unwrap()));
        assert!(!grid.in_bounds(CellIndex(100)));
    }

    #[test]
    fn test_offset_cell_rejects_wrap() {
        let grid = CellGrid::new(4, 4);
        let right_edge = grid.xy_cell(3, 1).unwrap();
        assert_eq!(grid.offset_cell(right_edge, CellOffset::new(1, 0)), None);
        assert_eq!(grid.offset_raw(right_edge, 1), Some(CellIndex(8)));
        assert_eq!(grid.adjacent(CellIndex(0), Facing::North), None);
        assert_eq!(grid.adjacent(CellIndex(0), Facing::SouthEast), Some(CellIndex(5)));
    }

    #[test]
    fn test_alloc_rejects_zero() {
        let mut grid = CellGrid::default();
        assert!(matches!(
            grid.alloc(0, 5),
            Err(MapError::InvalidDimensions { .. })
        ));
        grid.alloc(8, 8).unwrap();
        assert_eq!(grid.len(), 64);
        assert_eq!(grid.radius().width(), 8);
    }

    #[test]
    fn test_recalc_prefers_overlay_land() {
        let mut grid = CellGrid::new(4, 4);
        let water = grid.catalog().find("W1").unwrap();
        let cell = CellIndex(5);
        grid.cell_mut(cell).unwrap().template = Some(water);
        grid.recalc_attributes(cell);
        assert_eq!(grid.cell(cell).unwrap().land, LandType::Water);

        grid.set_overlay(cell, OverlayType::Tiberium3, 2);
        assert_eq!(grid.cell(cell).unwrap().land, LandType::Tiberium);

        // Crates don't change the land type.
        grid.set_overlay(cell, OverlayType::WoodCrate, 0);
        assert_eq!(grid.cell(cell).unwrap().land, LandType::Water);
    }

    #[test]
    fn test_dirty_list_deduplicates() {
        let mut grid = CellGrid::new(4, 4);
        grid.mark_dirty(CellIndex(3));
        grid.mark_dirty(CellIndex(1));
        grid.mark_dirty(CellIndex(3));
        grid.mark_dirty(CellIndex(99));
        assert_eq!(grid.take_dirty(), vec![CellIndex(3), CellIndex(1)]);
        assert!(grid.take_dirty().is_empty());
        grid.mark_dirty(CellIndex(3));
        assert_eq!(grid.take_dirty(), vec![CellIndex(3)]);
    }

    #[test]
    fn test_overpass_density_from_neighbours() {
        let mut grid = CellGrid::new(5, 5);
        let mut rng = SyncRandom::new(3);
        // Plus shape: centre has four Tiberium neighbours, arms have one.
        for (x, y) in [(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)] {
            let cell = grid.xy_cell(x, y).unwrap();
            grid.set_overlay(cell, OverlayType::Tiberium1, 0);
        }
        let total = grid.overpass(&mut rng);

        let centre = grid.cell(grid.xy_cell(2, 2).unwrap()).unwrap();
        assert_eq!(centre.overlay_data, 6);
        assert!(centre.overlay.is_tiberium());
        let arm = grid.cell(grid.xy_cell(1, 2).unwrap()).unwrap();
        // Arm (1,2) touches the centre plus diagonals (2,1) and (2,3).
        assert_eq!(arm.overlay_data, 4);
        assert_eq!(total, grid.total_value());
        assert_eq!(total, (6 + 1) * 25 + 4 * (4 + 1) * 25);
    }

    #[test]
    fn test_overpass_skips_border_and_queues_redraw() {
        let mut grid = CellGrid::new(6, 6);
        grid.set_bounds(1, 1, 4, 4);
        let inside = grid.xy_cell(2, 2).unwrap();
        let border = grid.xy_cell(0, 0).unwrap();
        grid.set_overlay(inside, OverlayType::Tiberium1, 9);
        grid.set_overlay(border, OverlayType::Tiberium1, 9);
        grid.take_dirty();

        let total = grid.overpass(&mut SyncRandom::new(8));

        assert_eq!(total, 25);
        assert_eq!(grid.cell(inside).unwrap().overlay_data, 0);
        assert_eq!(grid.cell(border).unwrap().overlay_data, 9);
        assert_eq!(grid.take_dirty(), vec![inside]);
    }

    #[test]
    fn test_random_crate_lands_on_clear_cell() {
        let mut grid = CellGrid::new(8, 8);
        let mut rng = SyncRandom::new(17);
        let cell = grid.place_random_crate(&mut rng).unwrap();
        let c = grid.cell(cell).unwrap();
        assert_eq!(c.overlay.kind(), Some(OverlayType::WoodCrate));
        assert!(grid.in_bounds(cell));
    }

    #[test]
    fn test_random_crate_gives_up_on_blocked_map() {
        let mut grid = CellGrid::new(4, 4);
        for i in 0..16 {
            grid.set_overlay(CellIndex(i), OverlayType::Brick, 0);
        }
        let mut rng = SyncRandom::new(17);
        assert_eq!(grid.place_random_crate(&mut rng), None);
    }
}
