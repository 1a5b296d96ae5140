//! Tiberium growth and spread.
//!
//! The grid is swept a fixed number of cells per tick. Candidates seen
//! during a sweep are sampled into two small pools; when the sweep wraps,
//! a handful of pool entries grow denser or seed a neighbour, and the pools
//! are emptied. Every random draw goes through `SyncRandom` so all peers
//! stay in step.

use crate::components::{NextOccupier, ObjectKind, TiberiumSpawn};
use crate::config::ScenarioRules;
use crate::coord::{CellIndex, Facing};
use crate::grid::{CellGrid, MAX_TIBERIUM_DENSITY};
use crate::occupancy::walk_chain;
use crate::random::SyncRandom;
use crate::reservoir::ReservoirSample;
use crate::terrain::{LandType, OverlayId, OverlayType};
use bevy_ecs::prelude::*;
use tracing::debug;

/// Candidate pool capacity.
pub const POOL_SIZE: usize = 30;

/// Cells visited per tick unless configured otherwise.
pub const DEFAULT_SCAN_BATCH: usize = 30;

/// Fields denser than this can seed their neighbours.
pub const SPREAD_THRESHOLD: u8 = 6;

/// Pool entries added for a cell under a spawn feature.
const SPAWN_WEIGHT: usize = 3;

/// Density of a freshly seeded field.
const SEED_DENSITY: u8 = 1;

/// Walks the grid a bounded number of cells per call, alternating
/// direction on each full sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalScanner {
    pub cursor: usize,
    pub forward: bool,
    pub budget: usize,
}

impl IncrementalScanner {
    pub fn new(budget: usize) -> Self {
        Self {
            cursor: 0,
            forward: true,
            budget: budget.max(1),
        }
    }

    /// Cells to visit this step and whether the sweep completed.
    pub fn next_batch(&mut self, total: usize) -> (Vec<CellIndex>, bool) {
        let end = (self.cursor + self.budget).min(total);
        let cells = (self.cursor..end)
            .map(|i| CellIndex(if self.forward { i } else { total - 1 - i }))
            .collect();

        self.cursor += self.budget;
        let swept = self.cursor >= total;
        if swept {
            self.cursor = 0;
            self.forward = !self.forward;
        }
        (cells, swept)
    }
}

impl Default for IncrementalScanner {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_BATCH)
    }
}

/// Scheduler state for the growth pass.
#[derive(Resource, Debug, Clone, Default)]
pub struct TiberiumGrowth {
    pub scanner: IncrementalScanner,
    pub growth: ReservoirSample<CellIndex, POOL_SIZE>,
    pub spread: ReservoirSample<CellIndex, POOL_SIZE>,
}

impl TiberiumGrowth {
    pub fn new(scan_batch: usize) -> Self {
        Self {
            scanner: IncrementalScanner::new(scan_batch),
            ..Default::default()
        }
    }

    /// Restart from the first cell with empty pools.
    pub fn reset(&mut self) {
        self.scanner = IncrementalScanner::new(self.scanner.budget);
        self.growth.clear();
        self.spread.clear();
    }
}

/// System that advances Tiberium growth by one tick.
pub fn tiberium_growth_system(
    mut grid: ResMut<CellGrid>,
    mut state: ResMut<TiberiumGrowth>,
    mut rng: ResMut<SyncRandom>,
    rules: Res<ScenarioRules>,
    objects: Query<(&NextOccupier, &ObjectKind, Has<TiberiumSpawn>)>,
) {
    if !rules.tiberium_growth && !rules.tiberium_spread {
        return;
    }
    let state = &mut *state;
    let rng = &mut *rng;

    let (batch, swept) = state.scanner.next_batch(grid.len());
    for cell in batch {
        let Some(c) = grid.cell(cell) else {
            continue;
        };
        let tiberium = c.is_tiberium();
        let density = c.overlay_data;

        if rules.tiberium_growth && tiberium && density < MAX_TIBERIUM_DENSITY {
            state.growth.offer(cell, rng);
        }

        if rules.tiberium_spread {
            let chain = walk_chain(c.occupier, |e| {
                objects.get(e).ok().and_then(|(next, _, _)| next.next(cell)).flatten()
            });
            let spawn = chain.iter().any(|&e| {
                matches!(objects.get(e), Ok((_, ObjectKind::Terrain, true)))
            });
            if spawn {
                for _ in 0..SPAWN_WEIGHT {
                    state.spread.offer(cell, rng);
                }
            } else if tiberium && density > SPREAD_THRESHOLD {
                state.spread.offer(cell, rng);
            }
        }
    }

    if swept {
        debug!(
            growth = state.growth.len(),
            spread = state.spread.len(),
            forward = state.scanner.forward,
            "tiberium sweep complete"
        );
        apply_growth(&mut grid, state, rng, &rules);
    }
}

fn apply_growth(
    grid: &mut CellGrid,
    state: &mut TiberiumGrowth,
    rng: &mut SyncRandom,
    rules: &ScenarioRules,
) {
    let tries = if rules.fast_tiberium || rules.multiplayer { 2 } else { 1 };

    if !state.growth.is_empty() {
        for _ in 0..tries {
            let Some(cell) = state.growth.choose(rng) else {
                break;
            };
            if let Some(c) = grid.cell_mut(cell) {
                if c.land == LandType::Tiberium && c.overlay_data < MAX_TIBERIUM_DENSITY {
                    c.overlay_data += 1;
                    grid.mark_dirty(cell);
                }
            }
        }
    }

    if !state.spread.is_empty() {
        for _ in 0..tries {
            let Some(cell) = state.spread.choose(rng) else {
                break;
            };
            if grid.in_bounds(cell) {
                spread_from(grid, cell, rng);
            }
        }
    }

    state.growth.clear();
    state.spread.clear();
}

/// Seed the first open neighbour of `cell`, starting from a random facing.
fn spread_from(grid: &mut CellGrid, cell: CellIndex, rng: &mut SyncRandom) -> Option<CellIndex> {
    let offset = rng.pick(0, 7) as usize;
    for i in 0..Facing::ALL.len() {
        let facing = Facing::ALL[(i + offset) % Facing::ALL.len()];
        let Some(adj) = grid.adjacent(cell, facing) else {
            continue;
        };
        let open = grid.in_bounds(adj)
            && grid.cell(adj).is_some_and(|c| {
                c.occupier.is_none()
                    && c.land == LandType::Clear
                    && c.overlay.is_none()
                    && !grid.is_bridge(c)
            });
        if open {
            let variant = rng.pick(
                OverlayType::Tiberium1 as i32,
                OverlayType::Tiberium12 as i32,
            );
            grid.set_overlay(adj, OverlayId(variant as u8), SEED_DENSITY);
            return Some(adj);
        }
    }
    None
}
