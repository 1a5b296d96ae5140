//! Random number generators.
//!
//! Two generators live side by side and must never be mixed up:
//! - `SyncRandom` drives everything that changes game state. Every peer in a
//!   networked match runs the same sequence, so the algorithm and the order
//!   of calls are part of the simulation's observable behavior.
//! - `CosmeticRandom` is for presentation only (ambient effects). It can be
//!   seeded per client and is free to diverge.

use crate::coord::CellIndex;
use crate::grid::CellGrid;
use bevy_ecs::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MULTIPLIER: u32 = 0x41C6_4E6D;
const INCREMENT: u32 = 0x0000_3039;
const THROW_AWAY_BITS: u32 = 10;
const SIGNIFICANT_BITS: u32 = 15;
const OUTPUT_MASK: u32 = (1 << SIGNIFICANT_BITS) - 1;

/// Linear congruential generator shared by all peers.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct SyncRandom {
    seed: u32,
}

impl SyncRandom {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Next 15-bit value.
    pub fn next(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        (self.seed >> THROW_AWAY_BITS) & OUTPUT_MASK
    }

    /// Uniform value in `[min, max]` (bounds may be given in either order).
    ///
    /// Draws are masked to the magnitude's bit width and rejected until in
    /// range, so the number of `next` calls per pick varies.
    pub fn pick(&mut self, min: i32, max: i32) -> i32 {
        if min == max {
            return min;
        }
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        let magnitude = (max - min) as u32;

        if magnitude > OUTPUT_MASK {
            // Wider than one draw: stitch two draws together.
            let wide = (self.next() << SIGNIFICANT_BITS) | self.next();
            return min + (wide % (magnitude + 1)) as i32;
        }

        let mut highbit = SIGNIFICANT_BITS - 1;
        while magnitude & (1 << highbit) == 0 && highbit > 0 {
            highbit -= 1;
        }
        let mask = !(u32::MAX << (highbit + 1));

        let mut pick = magnitude + 1;
        while pick > magnitude {
            pick = self.next() & mask;
        }
        min + pick as i32
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        self.pick(0, len.saturating_sub(1) as i32) as usize
    }
}

impl Default for SyncRandom {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Presentation-only generator.
#[derive(Resource, Debug, Clone)]
pub struct CosmeticRandom(pub ChaCha8Rng);

impl CosmeticRandom {
    pub fn new(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// A random cell inside the playable bounds, for ambient effects.
    pub fn ambient_cell(&mut self, grid: &CellGrid) -> Option<CellIndex> {
        let bounds = grid.bounds();
        if bounds.width == 0 || bounds.height == 0 {
            return None;
        }
        let x = bounds.x + self.0.gen_range(0..bounds.width);
        let y = bounds.y + self.0.gen_range(0..bounds.height);
        grid.xy_cell(x, y)
    }
}

impl Default for CosmeticRandom {
    fn default() -> Self {
        Self::new(0)
    }
}
