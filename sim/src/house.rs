//! Houses (players) as seen by the grid: a visibility bit and region threat.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum number of houses; each owns one bit of a cell's visibility masks.
pub const MAX_HOUSES: usize = 32;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HouseId(pub u8);

impl HouseId {
    /// Bit for this house in `Cell::mapped` / `Cell::visible`.
    #[inline]
    pub fn bit(self) -> u32 {
        1u32 << (self.0 as u32 % MAX_HOUSES as u32)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct House {
    pub name: String,
    /// Human-controlled houses always receive sight updates.
    pub is_human: bool,
    /// Threat per region, indexed by `cell_region`. Maintained by the AI layer.
    pub region_threat: Vec<i32>,
}

impl House {
    pub fn new(name: impl Into<String>, is_human: bool) -> Self {
        Self {
            name: name.into(),
            is_human,
            region_threat: Vec::new(),
        }
    }

    pub fn threat_value(&self, region: usize) -> i32 {
        self.region_threat.get(region).copied().unwrap_or(0)
    }
}

/// Every house in the scenario.
#[derive(Resource, Debug, Clone, Default)]
pub struct HouseRoster {
    houses: Vec<House>,
}

impl HouseRoster {
    /// Register a house. Returns `None` once `MAX_HOUSES` is reached.
    pub fn add(&mut self, house: House) -> Option<HouseId> {
        if self.houses.len() >= MAX_HOUSES {
            return None;
        }
        self.houses.push(house);
        Some(HouseId((self.houses.len() - 1) as u8))
    }

    pub fn get(&self, id: HouseId) -> Option<&House> {
        self.houses.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: HouseId) -> Option<&mut House> {
        self.houses.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.houses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_caps_at_max() {
        let mut roster = HouseRoster::default();
        for i in 0..MAX_HOUSES {
            assert_eq!(roster.add(House::new(format!("h{i}"), false)), Some(HouseId(i as u8)));
        }
        assert_eq!(roster.add(House::new("extra", false)), None);
    }

    #[test]
    fn test_threat_out_of_range_is_zero() {
        let mut house = House::new("GDI", true);
        house.region_threat = vec![0, 7];
        assert_eq!(house.threat_value(1), 7);
        assert_eq!(house.threat_value(99), 0);
        assert_eq!(HouseId(3).bit(), 0b1000);
    }
}
