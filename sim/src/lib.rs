//! Tiberium Grid - Map Core
//!
//! The cell map underneath a real-time strategy engine: terrain templates,
//! occupancy chains, per-house fog of war, deterministic Tiberium growth,
//! spatial queries and binary map persistence.
//! Uses `bevy_ecs` for the object arena and the per-frame schedule.

pub mod api;
pub mod components;
pub mod config;
pub mod coord;
pub mod error;
pub mod grid;
pub mod house;
pub mod occupancy;
pub mod persist;
pub mod radius;
pub mod random;
pub mod reservoir;
pub mod spatial;
pub mod systems;
pub mod terrain;
pub mod validate;
pub mod visibility;
pub mod world;

pub use api::MapWorld;
pub use components::{Footprint, Lifecycle, Locomotion, NextOccupier, ObjectBundle, ObjectKind, Owner};
pub use config::{MapConfig, ScenarioConfig, ScenarioRules};
pub use coord::{CellIndex, CellOffset, Coord, Facing};
pub use error::{MapError, Result};
pub use grid::{Cell, CellGrid, MapBounds};
pub use house::{House, HouseId, HouseRoster};
pub use random::{CosmeticRandom, SyncRandom};
pub use systems::*;
pub use terrain::{LandType, OverlayId, OverlayType, SmudgeId, SmudgeType, TemplateCatalog, TemplateId};
pub use validate::Violation;
pub use visibility::CellRevealed;
pub use world::MapSnapshot;
