//! Cell indices, offsets, lepton coordinates and facings.
//!
//! A cell is 256 leptons across. Object positions are kept in leptons so
//! sub-cell distances can be compared without floating point.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leptons per cell edge.
pub const LEPTONS_PER_CELL: i32 = 256;

/// Row-major index into the cell grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellIndex(pub usize);

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Offset in cells, used for object footprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellOffset {
    pub dx: i16,
    pub dy: i16,
}

impl CellOffset {
    pub const ZERO: CellOffset = CellOffset { dx: 0, dy: 0 };

    pub const fn new(dx: i16, dy: i16) -> Self {
        Self { dx, dy }
    }
}

/// Object position in leptons.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Centre of cell `(x, y)`.
    pub const fn cell_center(x: usize, y: usize) -> Self {
        Self {
            x: x as i32 * LEPTONS_PER_CELL + LEPTONS_PER_CELL / 2,
            y: y as i32 * LEPTONS_PER_CELL + LEPTONS_PER_CELL / 2,
        }
    }

    /// Cell column/row containing this coordinate, if it is non-negative.
    pub fn cell_xy(&self) -> Option<(usize, usize)> {
        if self.x < 0 || self.y < 0 {
            return None;
        }
        Some((
            (self.x / LEPTONS_PER_CELL) as usize,
            (self.y / LEPTONS_PER_CELL) as usize,
        ))
    }

    /// Lepton distance using the same approximation as cell distance.
    pub fn distance(&self, other: Coord) -> u32 {
        dragon_distance(
            (self.x - other.x).unsigned_abs(),
            (self.y - other.y).unsigned_abs(),
        )
    }
}

/// `max + min / 2`: a cheap octagonal stand-in for Euclidean distance.
#[inline]
pub fn dragon_distance(dx: u32, dy: u32) -> u32 {
    if dx > dy {
        dx + dy / 2
    } else {
        dy + dx / 2
    }
}

/// The eight compass facings, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Facing {
    pub const ALL: [Facing; 8] = [
        Facing::North,
        Facing::NorthEast,
        Facing::East,
        Facing::SouthEast,
        Facing::South,
        Facing::SouthWest,
        Facing::West,
        Facing::NorthWest,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::NorthEast => (1, -1),
            Facing::East => (1, 0),
            Facing::SouthEast => (1, 1),
            Facing::South => (0, 1),
            Facing::SouthWest => (-1, 1),
            Facing::West => (-1, 0),
            Facing::NorthWest => (-1, -1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dragon_distance() {
        assert_eq!(dragon_distance(0, 0), 0);
        assert_eq!(dragon_distance(3, 0), 3);
        assert_eq!(dragon_distance(3, 4), 5);
        assert_eq!(dragon_distance(1, 1), 1);
        assert_eq!(dragon_distance(5, 5), 7);
    }

    #[test]
    fn test_coord_cell_round_trip() {
        let c = Coord::cell_center(7, 3);
        assert_eq!(c, Coord::new(7 * 256 + 128, 3 * 256 + 128));
        assert_eq!(c.cell_xy(), Some((7, 3)));
        assert_eq!(Coord::new(-1, 0).cell_xy(), None);
    }

    #[test]
    fn test_coord_distance() {
        let a = Coord::new(0, 0);
        let b = Coord::new(0x80, 0x40);
        assert_eq!(a.distance(b), 0x80 + 0x20);
        assert_eq!(b.distance(a), a.distance(b));
    }
}
