//! Terrain vocabulary - land types, overlays, smudges and templates.
//!
//! A cell's land type is derived, never stored independently: it comes from
//! the overlay when the overlay changes passability (walls, Tiberium,
//! concrete), and from the terrain template otherwise.

use serde::{Deserialize, Serialize};

/// Derived terrain classification of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LandType {
    /// Open ground.
    #[default]
    Clear,
    /// Roads and concrete.
    Road,
    /// Deep water.
    Water,
    /// Impassable rock and cliffs.
    Rock,
    /// Wall overlays.
    Wall,
    /// Tiberium field.
    Tiberium,
    /// Shoreline.
    Beach,
    /// Rough ground.
    Rough,
    /// River bed.
    River,
}

impl LandType {
    /// Whether structures may be built here.
    pub fn is_buildable(&self) -> bool {
        matches!(self, LandType::Clear | LandType::Road)
    }
}

/// Overlay kinds. Discriminants are the persisted overlay bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OverlayType {
    Concrete = 0,
    Sandbag,
    ChainLink,
    Brick,
    BarbWire,
    WoodFence,
    Tiberium1,
    Tiberium2,
    Tiberium3,
    Tiberium4,
    Tiberium5,
    Tiberium6,
    Tiberium7,
    Tiberium8,
    Tiberium9,
    Tiberium10,
    Tiberium11,
    Tiberium12,
    Road,
    Squish,
    WoodCrate,
    SteelCrate,
    FlagSpot,
}

impl OverlayType {
    pub const COUNT: u8 = OverlayType::FlagSpot as u8 + 1;

    const ALL: [OverlayType; OverlayType::COUNT as usize] = [
        OverlayType::Concrete,
        OverlayType::Sandbag,
        OverlayType::ChainLink,
        OverlayType::Brick,
        OverlayType::BarbWire,
        OverlayType::WoodFence,
        OverlayType::Tiberium1,
        OverlayType::Tiberium2,
        OverlayType::Tiberium3,
        OverlayType::Tiberium4,
        OverlayType::Tiberium5,
        OverlayType::Tiberium6,
        OverlayType::Tiberium7,
        OverlayType::Tiberium8,
        OverlayType::Tiberium9,
        OverlayType::Tiberium10,
        OverlayType::Tiberium11,
        OverlayType::Tiberium12,
        OverlayType::Road,
        OverlayType::Squish,
        OverlayType::WoodCrate,
        OverlayType::SteelCrate,
        OverlayType::FlagSpot,
    ];

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn is_wall(&self) -> bool {
        matches!(
            self,
            OverlayType::Sandbag
                | OverlayType::ChainLink
                | OverlayType::Brick
                | OverlayType::BarbWire
                | OverlayType::WoodFence
        )
    }

    pub fn is_tiberium(&self) -> bool {
        (OverlayType::Tiberium1 as u8..=OverlayType::Tiberium12 as u8).contains(&(*self as u8))
    }

    pub fn is_crate(&self) -> bool {
        matches!(self, OverlayType::WoodCrate | OverlayType::SteelCrate)
    }

    /// Land imposed by this overlay. `Clear` means "defer to the template".
    pub fn land(&self) -> LandType {
        if self.is_wall() {
            LandType::Wall
        } else if self.is_tiberium() {
            LandType::Tiberium
        } else {
            match self {
                OverlayType::Concrete | OverlayType::Road => LandType::Road,
                _ => LandType::Clear,
            }
        }
    }
}

/// Raw overlay byte as stored in a cell.
///
/// Kept raw so corrupted or injected values survive until `validate` sees
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayId(pub u8);

impl OverlayId {
    pub const NONE: OverlayId = OverlayId(0xFF);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    pub fn kind(&self) -> Option<OverlayType> {
        OverlayType::from_u8(self.0)
    }

    pub fn is_valid(&self) -> bool {
        self.is_none() || self.0 < OverlayType::COUNT
    }

    pub fn is_tiberium(&self) -> bool {
        self.kind().is_some_and(|k| k.is_tiberium())
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<OverlayType> for OverlayId {
    fn from(kind: OverlayType) -> Self {
        OverlayId(kind as u8)
    }
}

/// Smudge kinds (craters, scorch marks, building bibs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SmudgeType {
    Crater1 = 0,
    Crater2,
    Crater3,
    Crater4,
    Crater5,
    Crater6,
    Scorch1,
    Scorch2,
    Scorch3,
    Scorch4,
    Scorch5,
    Scorch6,
    Bib1,
    Bib2,
    Bib3,
}

impl SmudgeType {
    pub const COUNT: u8 = SmudgeType::Bib3 as u8 + 1;
}

/// Raw smudge byte as stored in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmudgeId(pub u8);

impl SmudgeId {
    pub const NONE: SmudgeId = SmudgeId(0xFF);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    pub fn is_valid(&self) -> bool {
        self.is_none() || self.0 < SmudgeType::COUNT
    }

    pub fn is_bib(&self) -> bool {
        (SmudgeType::Bib1 as u8..=SmudgeType::Bib3 as u8).contains(&self.0)
    }
}

impl Default for SmudgeId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<SmudgeType> for SmudgeId {
    fn from(kind: SmudgeType) -> Self {
        SmudgeId(kind as u8)
    }
}

/// Index into the template catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u16);

/// Static description of a terrain template (a block of tile icons).
#[derive(Debug, Clone)]
pub struct TemplateDef {
    pub name: &'static str,
    /// Footprint in cells; icons are numbered row-major across it.
    pub width: u8,
    pub height: u8,
    pub land: LandType,
    /// Icons that use `alt_land` instead of `land`.
    pub alt_icons: &'static [u8],
    pub alt_land: LandType,
    /// Icons missing from the template art; never placed.
    pub holes: &'static [u8],
    pub bridge: bool,
}

impl TemplateDef {
    pub fn icon_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `icon` is a real tile of this template.
    pub fn has_icon(&self, icon: u8) -> bool {
        (icon as usize) < self.icon_count() && !self.holes.contains(&icon)
    }

    pub fn land_for(&self, icon: u8) -> LandType {
        if self.alt_icons.contains(&icon) {
            self.alt_land
        } else {
            self.land
        }
    }
}

/// All templates known to a map.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    defs: Vec<TemplateDef>,
}

impl TemplateCatalog {
    pub fn new(defs: Vec<TemplateDef>) -> Self {
        Self { defs }
    }

    /// Built-in temperate set.
    pub fn standard() -> Self {
        let def = |name, width, height, land| TemplateDef {
            name,
            width,
            height,
            land,
            alt_icons: &[],
            alt_land: land,
            holes: &[],
            bridge: false,
        };
        Self::new(vec![
            def("CLEAR1", 1, 1, LandType::Clear),
            def("W1", 1, 1, LandType::Water),
            def("W2", 2, 2, LandType::Water),
            TemplateDef {
                alt_icons: &[3, 4, 5],
                alt_land: LandType::Water,
                ..def("SH1", 3, 2, LandType::Beach)
            },
            def("B1", 2, 1, LandType::Rock),
            TemplateDef {
                alt_icons: &[0, 2, 6, 8],
                alt_land: LandType::Clear,
                ..def("RV1", 3, 3, LandType::River)
            },
            TemplateDef {
                alt_icons: &[0, 2, 6, 8],
                alt_land: LandType::Water,
                bridge: true,
                ..def("BRIDGE1", 3, 3, LandType::Road)
            },
            TemplateDef {
                holes: &[0, 8],
                ..def("P01", 3, 3, LandType::Rough)
            },
            def("D01", 2, 2, LandType::Road),
        ])
    }

    pub fn get(&self, id: TemplateId) -> Option<&TemplateDef> {
        self.defs.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Look a template up by name.
    pub fn find(&self, name: &str) -> Option<TemplateId> {
        self.defs
            .iter()
            .position(|d| d.name == name)
            .map(|i| TemplateId(i as u16))
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
