//! Error types for map allocation, persistence and placement.

use crate::coord::CellIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("map data truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("template {template} blocked at cell {cell}: {reason}")]
    PlacementBlocked {
        template: u16,
        cell: CellIndex,
        reason: String,
    },

    #[error("fixed timestep must be a positive number of seconds, got {0}")]
    InvalidTimestep(f32),

    #[error("cell grid has not been allocated")]
    NotAllocated,

    #[error("unknown template id {0}")]
    UnknownTemplate(u16),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
