//! Ring-ordered radius offsets.
//!
//! Ring `r` holds every `(dx, dy)` whose approximate distance
//! `max(|dx|,|dy|) + min(|dx|,|dy|) / 2` is exactly `r`, listed row by row.
//! The offsets for radius `r` are the concatenation of rings `0..=r`, so an
//! incremental sight update only has to walk the outer two rings.

use crate::coord::dragon_distance;

/// Largest supported radius.
pub const MAX_RADIUS: usize = 10;

/// Cumulative offset count through each ring.
pub const RING_COUNT: [usize; MAX_RADIUS + 1] = [1, 9, 21, 37, 61, 89, 121, 161, 205, 253, 309];

/// Offsets into a grid of a fixed width, nearest first.
#[derive(Debug, Clone)]
pub struct RadiusTable {
    width: usize,
    offsets: Vec<(i16, i16)>,
    deltas: Vec<isize>,
}

impl RadiusTable {
    pub fn new(width: usize) -> Self {
        let reach = MAX_RADIUS as i16;
        let mut offsets = Vec::with_capacity(RING_COUNT[MAX_RADIUS]);
        for ring in 0..=MAX_RADIUS as u32 {
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    if dragon_distance(dx.unsigned_abs() as u32, dy.unsigned_abs() as u32) == ring {
                        offsets.push((dx, dy));
                    }
                }
            }
        }
        debug_assert_eq!(offsets.len(), RING_COUNT[MAX_RADIUS]);

        let deltas = offsets
            .iter()
            .map(|&(dx, dy)| dy as isize * width as isize + dx as isize)
            .collect();

        Self {
            width,
            offsets,
            deltas,
        }
    }

    /// Grid width the deltas were computed for.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Cumulative offset count through ring `radius`.
    pub fn ring_count(&self, radius: usize) -> usize {
        RING_COUNT[radius.min(MAX_RADIUS)]
    }

    /// Index deltas for every cell through ring `radius`.
    pub fn offsets(&self, radius: usize) -> &[isize] {
        &self.deltas[..self.ring_count(radius)]
    }

    /// Index deltas for rings `radius - 1` and `radius` only.
    pub fn incremental(&self, radius: usize) -> &[isize] {
        let radius = radius.min(MAX_RADIUS);
        let start = if radius > 1 { RING_COUNT[radius - 2] } else { 0 };
        &self.deltas[start..RING_COUNT[radius]]
    }

    /// `(dx, dy)` pairs through ring `radius`, in the same order as the deltas.
    pub fn xy_offsets(&self, radius: usize) -> &[(i16, i16)] {
        &self.offsets[..RING_COUNT[radius.min(MAX_RADIUS)]]
    }
}
