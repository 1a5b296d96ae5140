//! ECS components for map objects.
//!
//! Objects (infantry, vehicles, aircraft, buildings, terrain features) are
//! entities in the `World`. The grid only ever stores their `Entity`
//! handles; everything the grid needs to know about an object is read from
//! the components below.

use crate::coord::{CellIndex, CellOffset, Coord};
use crate::house::HouseId;
use crate::terrain::LandType;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// IDENTITY
// ============================================================================

/// Broad object category.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectKind {
    Infantry,
    #[default]
    Unit,
    Aircraft,
    Building,
    /// Trees and other static terrain features.
    Terrain,
}

/// Owning house.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub HouseId);

// ============================================================================
// LIFECYCLE
// ============================================================================

/// An object is live on the map only while active and out of limbo.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub active: bool,
    /// Removed from the map but not yet destroyed (e.g. inside a transport).
    pub in_limbo: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            active: true,
            in_limbo: false,
        }
    }
}

impl Lifecycle {
    pub fn is_live(&self) -> bool {
        self.active && !self.in_limbo
    }
}

// ============================================================================
// FOOTPRINT
// ============================================================================

/// Cells an object claims relative to its home cell.
///
/// `occupy` is the logical footprint used for collision; `overlap` is
/// cosmetic and may be changed independently (e.g. a selection box).
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    pub occupy: Arc<[CellOffset]>,
    pub overlap: Arc<[CellOffset]>,
}

impl Footprint {
    pub fn new(occupy: &[CellOffset], overlap: &[CellOffset]) -> Self {
        Self {
            occupy: occupy.into(),
            overlap: overlap.into(),
        }
    }

    /// One cell, no overlap.
    pub fn single() -> Self {
        Self::new(&[CellOffset::ZERO], &[])
    }

    /// A `width` x `height` block anchored at its top-left cell.
    pub fn rect(width: i16, height: i16) -> Self {
        let occupy: Vec<CellOffset> = (0..height)
            .flat_map(|dy| (0..width).map(move |dx| CellOffset::new(dx, dy)))
            .collect();
        Self::new(&occupy, &[])
    }

    pub fn with_overlap(mut self, overlap: &[CellOffset]) -> Self {
        self.overlap = overlap.into();
        self
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::single()
    }
}

/// Per-cell link to the next object in that cell's occupier chain.
///
/// A multi-cell object sits in one chain per occupied cell, so it carries
/// one link per cell. An entry exists exactly while the object is in that
/// cell's chain.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct NextOccupier {
    links: Vec<(CellIndex, Option<Entity>)>,
}

impl NextOccupier {
    /// `None` if the object is not in `cell`'s chain, `Some(next)` otherwise.
    pub fn next(&self, cell: CellIndex) -> Option<Option<Entity>> {
        self.links.iter().find(|(c, _)| *c == cell).map(|&(_, next)| next)
    }

    pub fn set(&mut self, cell: CellIndex, next: Option<Entity>) {
        match self.links.iter_mut().find(|(c, _)| *c == cell) {
            Some(link) => link.1 = next,
            None => self.links.push((cell, next)),
        }
    }

    pub fn remove(&mut self, cell: CellIndex) -> Option<Option<Entity>> {
        let pos = self.links.iter().position(|(c, _)| *c == cell)?;
        Some(self.links.swap_remove(pos).1)
    }

    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }
}

// ============================================================================
// MOVEMENT / VISIBILITY STATE
// ============================================================================

/// How an object moves; decides which land it may stand on.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locomotion {
    Foot,
    #[default]
    Track,
    Wheel,
    Float,
    Winged,
    /// Buildings and terrain features.
    Fixed,
}

impl Locomotion {
    pub fn can_enter(&self, land: LandType) -> bool {
        use LandType::*;
        match self {
            Locomotion::Foot => matches!(land, Clear | Road | Tiberium | Beach | Rough),
            Locomotion::Track => matches!(land, Clear | Road | Tiberium | Beach | Rough),
            Locomotion::Wheel => matches!(land, Clear | Road | Tiberium | Beach),
            Locomotion::Float => matches!(land, Water | River),
            Locomotion::Winged => true,
            Locomotion::Fixed => matches!(land, Clear | Road | Tiberium | Rough),
        }
    }
}

/// Hidden from houses other than its owner.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Cloaked;

/// In flight. Airborne objects are not indexed by the grid.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Airborne {
    /// Height above ground in leptons.
    pub altitude: i32,
}

/// Terrain feature that seeds new Tiberium around it.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct TiberiumSpawn;

// ============================================================================
// BUNDLES
// ============================================================================

/// Bundle for spawning a placeable map object.
#[derive(Bundle, Default)]
pub struct ObjectBundle {
    pub kind: ObjectKind,
    pub coord: Coord,
    pub lifecycle: Lifecycle,
    pub footprint: Footprint,
    pub next: NextOccupier,
    pub locomotion: Locomotion,
}

impl ObjectBundle {
    pub fn new(kind: ObjectKind, coord: Coord) -> Self {
        let locomotion = match kind {
            ObjectKind::Infantry => Locomotion::Foot,
            ObjectKind::Unit => Locomotion::Track,
            ObjectKind::Aircraft => Locomotion::Winged,
            ObjectKind::Building | ObjectKind::Terrain => Locomotion::Fixed,
        };
        Self {
            kind,
            coord,
            locomotion,
            ..Default::default()
        }
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = footprint;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_footprint() {
        let fp = Footprint::rect(2, 2);
        assert_eq!(
            &*fp.occupy,
            &[
                CellOffset::new(0, 0),
                CellOffset::new(1, 0),
                CellOffset::new(0, 1),
                CellOffset::new(1, 1)
            ]
        );
        assert!(fp.overlap.is_empty());
    }

    #[test]
    fn test_next_occupier_links() {
        let other = Entity::from_raw(9);
        let mut next = NextOccupier::default();
        assert_eq!(next.next(CellIndex(1)), None);

        next.set(CellIndex(1), None);
        next.set(CellIndex(2), Some(other));
        assert_eq!(next.next(CellIndex(1)), Some(None));
        assert_eq!(next.next(CellIndex(2)), Some(Some(other)));

        next.set(CellIndex(1), Some(other));
        assert_eq!(next.next(CellIndex(1)), Some(Some(other)));
        assert_eq!(next.remove(CellIndex(2)), Some(Some(other)));
        assert_eq!(next.remove(CellIndex(2)), None);
        assert!(next.is_linked());
    }

    #[test]
    fn test_locomotion() {
        assert!(Locomotion::Track.can_enter(LandType::Tiberium));
        assert!(!Locomotion::Track.can_enter(LandType::Water));
        assert!(Locomotion::Float.can_enter(LandType::Water));
        assert!(!Locomotion::Fixed.can_enter(LandType::Rock));
        assert!(Locomotion::Winged.can_enter(LandType::Wall));
    }

    #[test]
    fn test_bundle_locomotion_from_kind() {
        let b = ObjectBundle::new(ObjectKind::Building, Coord::cell_center(1, 1));
        assert_eq!(b.locomotion, Locomotion::Fixed);
        assert!(b.lifecycle.is_live());
    }
}
