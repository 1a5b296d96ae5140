//! Scenario configuration.
//!
//! `ScenarioConfig` is normally loaded from a TOML file:
//!
//! ```toml
//! [map]
//! width = 64
//! height = 64
//!
//! [rules]
//! tiberium_growth = true
//! tiberium_spread = true
//! ```
//!
//! Every field has a default, so partial files are accepted.

use crate::error::{MapError, Result};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid dimensions and simulation tuning.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Allocated width in cells.
    pub width: usize,
    /// Allocated height in cells.
    pub height: usize,
    /// Playable rectangle `(x, y, w, h)`. `None` means the whole allocation.
    pub bounds: Option<(usize, usize, usize, usize)>,
    /// Cells visited per growth step.
    pub scan_batch: usize,
    /// Fixed timestep in seconds (15 Hz by default).
    pub fixed_timestep: f32,
    /// Seed for the synchronized game-state generator.
    pub sync_seed: u32,
    /// Seed for the presentation-only generator.
    pub cosmetic_seed: u64,
}

impl MapConfig {
    /// Frame length used when a configured timestep is unusable.
    pub const DEFAULT_TIMESTEP: f32 = 1.0 / 15.0;

    /// Reject settings the frame loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(MapError::InvalidTimestep(self.fixed_timestep));
        }
        Ok(())
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            bounds: None,
            scan_batch: 30,
            fixed_timestep: Self::DEFAULT_TIMESTEP,
            sync_seed: 0x1234,
            cosmetic_seed: 0,
        }
    }
}

/// Rule flags read by the growth pass and visibility.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRules {
    pub tiberium_growth: bool,
    pub tiberium_spread: bool,
    /// Doubles the number of growth/spread picks per sweep.
    pub fast_tiberium: bool,
    /// Multiplayer sessions also double the picks.
    pub multiplayer: bool,
    /// Lets computer houses run sight updates (shared allied vision).
    pub share_ally_visibility: bool,
}

impl Default for ScenarioRules {
    fn default() -> Self {
        Self {
            tiberium_growth: true,
            tiberium_spread: true,
            fast_tiberium: false,
            multiplayer: false,
            share_ally_visibility: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub map: MapConfig,
    pub rules: ScenarioRules,
}

impl ScenarioConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a scenario config from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ScenarioConfig::from_toml_str(
            r#"
            [map]
            width = 32
            height = 16

            [rules]
            fast_tiberium = true
            "#,
        )
        .unwrap();

        assert_eq!(config.map.width, 32);
        assert_eq!(config.map.height, 16);
        assert_eq!(config.map.scan_batch, 30);
        assert!(config.rules.fast_tiberium);
        assert!(config.rules.tiberium_growth);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ScenarioConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScenarioConfig::default());
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = ScenarioConfig::from_toml_str("[map]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, crate::error::MapError::Config(_)));
    }

    #[test]
    fn test_timestep_must_be_positive() {
        assert!(MapConfig::default().validate().is_ok());
        for bad in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            let config = MapConfig {
                fixed_timestep: bad,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(MapError::InvalidTimestep(_))));
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, "[rules]\ntiberium_spread = false\n").unwrap();

        let config = ScenarioConfig::load(&path).unwrap();
        assert!(!config.rules.tiberium_spread);
    }
}
