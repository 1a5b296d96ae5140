//! Public API for the map core.
//!
//! `MapWorld` owns the ECS world (object arena plus grid, houses and both
//! random generators as resources) and the schedule that runs the per-frame
//! systems. Collaborators such as renderers, AI and scenario loaders go
//! through it rather than touching resources directly.
//!
//! ## Fixed Timestep
//!
//! `logic_step` advances exactly one simulation frame. `step(dt)` accumulates
//! wall-clock time and runs as many fixed frames as fit, so the outcome does
//! not depend on the caller's frame rate.

use crate::components::ObjectBundle;
use crate::config::{MapConfig, ScenarioConfig, ScenarioRules};
use crate::coord::{CellIndex, Coord};
use crate::error::Result;
use crate::grid::CellGrid;
use crate::house::{House, HouseId, HouseRoster};
use crate::occupancy;
use crate::persist::{self, Checksum, LoadReport};
use crate::random::{CosmeticRandom, SyncRandom};
use crate::spatial;
use crate::systems::*;
use crate::terrain::TemplateId;
use crate::validate::{self, CleanReport, Violation};
use crate::visibility::{self, CellRevealed, RevealLog};
use crate::world::MapSnapshot;
use bevy_ecs::prelude::*;
use std::path::Path;
use tracing::info;

/// The main map container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Allocating and clearing the grid
/// - Placing and lifting objects and terrain
/// - Sight, growth and spatial queries
/// - Loading, saving and checking map data
pub struct MapWorld {
    world: World,
    schedule: Schedule,
    frame: u64,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl MapWorld {
    /// Create a map with the default configuration.
    pub fn new() -> Self {
        let config = ScenarioConfig::default();
        let grid = CellGrid::new(config.map.width, config.map.height);
        Self::build(config, grid)
    }

    /// Create a map from a scenario configuration.
    pub fn with_config(config: ScenarioConfig) -> Result<Self> {
        config.map.validate()?;
        let mut grid = CellGrid::default();
        grid.alloc(config.map.width, config.map.height)?;
        if let Some((x, y, w, h)) = config.map.bounds {
            grid.set_bounds(x, y, w, h);
        }
        Ok(Self::build(config, grid))
    }

    /// Create a map from a TOML scenario file.
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(ScenarioConfig::load(path)?)
    }

    fn build(config: ScenarioConfig, grid: CellGrid) -> Self {
        let mut world = World::new();

        world.insert_resource(grid);
        world.insert_resource(SyncRandom::new(config.map.sync_seed));
        world.insert_resource(CosmeticRandom::new(config.map.cosmetic_seed));
        world.insert_resource(TiberiumGrowth::new(config.map.scan_batch));
        world.insert_resource(HouseRoster::default());
        world.insert_resource(RevealLog::default());
        world.insert_resource(Checksum::default());
        world.insert_resource(config.rules);
        world.insert_resource(config.map);

        let mut schedule = Schedule::default();
        schedule.add_systems(tiberium_growth_system);

        Self {
            world,
            schedule,
            frame: 0,
            time_accumulator: 0.0,
        }
    }

    // ========================================================================
    // Grid lifecycle
    // ========================================================================

    /// Reallocate the grid for a new scenario and restart growth.
    pub fn alloc(&mut self, width: usize, height: usize) -> Result<()> {
        self.world.resource_mut::<CellGrid>().alloc(width, height)?;
        self.world.resource_mut::<TiberiumGrowth>().reset();
        self.world.resource_mut::<RevealLog>().take();
        Ok(())
    }

    /// Reset every cell and the growth scheduler.
    pub fn init_clear(&mut self) {
        self.world.resource_mut::<CellGrid>().init_clear();
        self.world.resource_mut::<TiberiumGrowth>().reset();
        self.world.resource_mut::<RevealLog>().take();
    }

    pub fn set_bounds(&mut self, x: usize, y: usize, width: usize, height: usize) {
        self.world
            .resource_mut::<CellGrid>()
            .set_bounds(x, y, width, height);
    }

    pub fn add_house(&mut self, house: House) -> Option<HouseId> {
        self.world.resource_mut::<HouseRoster>().add(house)
    }

    pub fn houses_mut(&mut self) -> Mut<'_, HouseRoster> {
        self.world.resource_mut::<HouseRoster>()
    }

    pub fn rules_mut(&mut self) -> Mut<'_, ScenarioRules> {
        self.world.resource_mut::<ScenarioRules>()
    }

    // ========================================================================
    // Objects and terrain
    // ========================================================================

    /// Add an object to the arena. It is not on the grid until placed.
    pub fn spawn_object(&mut self, bundle: ObjectBundle) -> Entity {
        self.world.spawn(bundle).id()
    }

    pub fn place_down(&mut self, cell: CellIndex, object: Entity) {
        occupancy::place_down(&mut self.world, cell, object);
    }

    pub fn pick_up(&mut self, cell: CellIndex, object: Entity) {
        occupancy::pick_up(&mut self.world, cell, object);
    }

    pub fn overlap_down(&mut self, cell: CellIndex, object: Entity) {
        occupancy::overlap_down(&mut self.world, cell, object);
    }

    pub fn overlap_up(&mut self, cell: CellIndex, object: Entity) {
        occupancy::overlap_up(&mut self.world, cell, object);
    }

    pub fn place_template(&mut self, cell: CellIndex, template: TemplateId) -> Result<()> {
        occupancy::place_template(&mut self.world, cell, template)
    }

    /// Settle freshly loaded Tiberium and return the field value.
    pub fn overpass(&mut self) -> u32 {
        self.world
            .resource_scope(|world, mut grid: Mut<CellGrid>| {
                let mut rng = world.resource_mut::<SyncRandom>();
                grid.overpass(&mut rng)
            })
    }

    pub fn place_random_crate(&mut self) -> Option<CellIndex> {
        self.world
            .resource_scope(|world, mut grid: Mut<CellGrid>| {
                let mut rng = world.resource_mut::<SyncRandom>();
                grid.place_random_crate(&mut rng)
            })
    }

    /// A random playable cell for ambient effects. Never affects game state.
    pub fn ambient_effect_cell(&mut self) -> Option<CellIndex> {
        self.world
            .resource_scope(|world, mut cosmetic: Mut<CosmeticRandom>| {
                cosmetic.ambient_cell(world.resource::<CellGrid>())
            })
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    pub fn sight_from(&mut self, house: HouseId, cell: CellIndex, range: usize, incremental: bool) -> usize {
        visibility::sight_from(&mut self.world, house, cell, range, incremental)
    }

    /// Run one simulation frame.
    pub fn logic_step(&mut self) {
        self.schedule.run(&mut self.world);
        self.frame += 1;
    }

    /// Step the simulation forward by `dt` seconds of real time.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self
            .world
            .get_resource::<MapConfig>()
            .map(|c| c.fixed_timestep)
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or(MapConfig::DEFAULT_TIMESTEP);

        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.logic_step();
            self.time_accumulator -= fixed_dt;
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn grid(&self) -> &CellGrid {
        self.world.resource::<CellGrid>()
    }

    pub fn in_bounds(&self, cell: CellIndex) -> bool {
        self.grid().in_bounds(cell)
    }

    pub fn cell_distance(&self, a: CellIndex, b: CellIndex) -> u32 {
        self.grid().cell_distance(a, b)
    }

    pub fn cell_region(&self, cell: CellIndex) -> usize {
        spatial::cell_region(self.grid(), cell)
    }

    pub fn cell_threat(&self, cell: CellIndex, house: HouseId) -> i32 {
        spatial::cell_threat(self.grid(), self.world.resource::<HouseRoster>(), cell, house)
    }

    pub fn closest_object(&mut self, coord: Coord, viewer: Option<HouseId>) -> Option<Entity> {
        spatial::closest_object(&mut self.world, coord, viewer)
    }

    /// Clear cell near `cell`, chosen by the current frame.
    pub fn nearby_clear_cell(&self, cell: CellIndex) -> Option<CellIndex> {
        spatial::nearby_clear_cell(self.grid(), cell, self.frame)
    }

    // ========================================================================
    // Persistence and validation
    // ========================================================================

    /// Load templates from a binary map file, folding it into the checksum.
    pub fn read_binary(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let report = self
            .world
            .resource_scope(|world, mut grid: Mut<CellGrid>| {
                let mut checksum = world.resource_mut::<Checksum>();
                persist::read_binary(&mut grid, path, &mut checksum)
            })?;
        self.world.resource_mut::<TiberiumGrowth>().reset();
        Ok(report)
    }

    pub fn write_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        persist::write_binary(self.grid(), path)
    }

    pub fn checksum(&self) -> u32 {
        self.world.resource::<Checksum>().0
    }

    pub fn validate(&self) -> bool {
        validate::validate(&self.world)
    }

    pub fn first_violation(&self) -> Option<Violation> {
        validate::first_violation(&self.world)
    }

    pub fn clean(&mut self) -> CleanReport {
        let report = validate::clean(&mut self.world);
        if !report.cleared.is_empty() {
            info!(cleared = report.cleared.len(), "cleaned overlapper slots");
        }
        report
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Drain cells newly explored since the last call.
    pub fn take_revealed(&mut self) -> Vec<CellRevealed> {
        self.world.resource_mut::<RevealLog>().take()
    }

    /// Drain cells needing a redraw since the last call.
    pub fn take_dirty(&mut self) -> Vec<CellIndex> {
        self.world.resource_mut::<CellGrid>().take_dirty()
    }

    /// Snapshot the map, draining the reveal and redraw queues into it.
    pub fn snapshot(&mut self) -> MapSnapshot {
        let mut snapshot = MapSnapshot::from_world(&mut self.world, self.frame);
        snapshot.revealed = self.take_revealed();
        snapshot.dirty = self.take_dirty().into_iter().map(|c| c.0).collect();
        snapshot
    }

    pub fn snapshot_json(&mut self) -> Result<String> {
        snapshot_to_json_string(&self.snapshot())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for MapWorld {
    fn default() -> Self {
        Self::new()
    }
}
