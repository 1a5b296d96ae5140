//! Binary map persistence.
//!
//! The file is one 3-byte record per allocated cell, row-major, with no
//! header: a little-endian `u16` template id followed by a `u8` icon.
//! Template id 255 marks a cell with no template.

use crate::coord::CellIndex;
use crate::error::{MapError, Result};
use crate::grid::CellGrid;
use crate::terrain::TemplateId;
use bevy_ecs::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Bytes per cell record.
pub const RECORD_SIZE: usize = 3;

/// Template id persisted for "no template".
pub const NO_TEMPLATE: u16 = 255;

/// Running checksum of loaded map data, compared across peers.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(pub u32);

impl Checksum {
    /// Shift left one bit, add `value` and the bit shifted out.
    pub fn add(&mut self, value: u32) {
        let hibit = self.0 >> 31;
        self.0 = (self.0 << 1).wrapping_add(value).wrapping_add(hibit);
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub cells: usize,
    /// Cells whose record named an unknown template or icon and were reset.
    pub demoted: Vec<CellIndex>,
}

/// Load templates and icons for every cell from `path`.
pub fn read_binary(grid: &mut CellGrid, path: impl AsRef<Path>, checksum: &mut Checksum) -> Result<LoadReport> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let report = read_from(grid, &mut reader, checksum)?;
    info!(path = %path.display(), cells = report.cells, demoted = report.demoted.len(), "loaded map");
    Ok(report)
}

/// Load from any reader. The whole payload is read before the grid is
/// touched, so a short read leaves it unchanged.
pub fn read_from(grid: &mut CellGrid, reader: &mut impl Read, checksum: &mut Checksum) -> Result<LoadReport> {
    let expected = grid.len() * RECORD_SIZE;
    let mut data = Vec::with_capacity(expected);
    reader.take(expected as u64).read_to_end(&mut data)?;
    if data.len() < expected {
        return Err(MapError::Truncated {
            expected,
            found: data.len(),
        });
    }

    let mut report = LoadReport {
        cells: grid.len(),
        demoted: Vec::new(),
    };
    for (i, record) in data.chunks_exact(RECORD_SIZE).enumerate() {
        let cell = CellIndex(i);
        let raw = u16::from_le_bytes([record[0], record[1]]);
        let mut icon = record[2];
        let mut template = (raw != NO_TEMPLATE).then_some(TemplateId(raw));

        if let Some(id) = template {
            let valid = grid.catalog().get(id).is_some_and(|def| def.has_icon(icon));
            if !valid {
                warn!(cell = i, template = raw, icon, "demoting bad map record");
                template = None;
                icon = 0;
                report.demoted.push(cell);
            }
        }

        if let Some(c) = grid.cell_mut(cell) {
            c.template = template;
            c.icon = icon;
        }
        grid.recalc_attributes(cell);
        checksum.add(template.map_or(NO_TEMPLATE, |t| t.0) as u32);
        checksum.add(icon as u32);
    }
    Ok(report)
}

/// Save templates and icons for every cell to `path`.
pub fn write_binary(grid: &CellGrid, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_to(grid, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), cells = grid.len(), "saved map");
    Ok(())
}

pub fn write_to(grid: &CellGrid, writer: &mut impl Write) -> Result<()> {
    for c in grid.cells() {
        let raw = c.template.map_or(NO_TEMPLATE, |t| t.0);
        let [lo, hi] = raw.to_le_bytes();
        writer.write_all(&[lo, hi, c.icon])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::LandType;

    fn sample_grid() -> CellGrid {
        let mut grid = CellGrid::new(6, 4);
        let water = grid.catalog().find("W2").unwrap();
        let shore = grid.catalog().find("SH1").unwrap();
        for (cell, template, icon) in [(0, water, 0), (1, water, 3), (7, shore, 4), (23, shore, 5)] {
            let c = grid.cell_mut(CellIndex(cell)).unwrap();
            c.template = Some(template);
            c.icon = icon;
        }
        grid.recalc_all();
        grid
    }

    fn templates(grid: &CellGrid) -> Vec<(Option<TemplateId>, u8)> {
        grid.cells().iter().map(|c| (c.template, c.icon)).collect()
    }

    #[test]
    fn test_checksum_add() {
        let mut crc = Checksum::default();
        crc.add(5);
        assert_eq!(crc.0, 5);
        crc.add(1);
        assert_eq!(crc.0, 11);

        let mut high = Checksum(0x8000_0001);
        high.add(0);
        assert_eq!(high.0, 0x0000_0003);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.bin");
        let original = sample_grid();
        write_binary(&original, &path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 24 * 3);

        let mut loaded = CellGrid::new(6, 4);
        let mut crc = Checksum::default();
        let report = read_binary(&mut loaded, &path, &mut crc).unwrap();

        assert_eq!(report.cells, 24);
        assert!(report.demoted.is_empty());
        assert_eq!(templates(&loaded), templates(&original));
        assert_eq!(loaded.cell(CellIndex(7)).unwrap().land, LandType::Water);
        assert_ne!(crc.0, 0);
    }

    #[test]
    fn test_sentinel_reads_as_none() {
        let grid = CellGrid::new(2, 1);
        let mut bytes = Vec::new();
        write_to(&grid, &mut bytes).unwrap();
        assert_eq!(bytes, vec![255, 0, 0, 255, 0, 0]);

        let mut loaded = CellGrid::new(2, 1);
        loaded.cell_mut(CellIndex(0)).unwrap().template = Some(TemplateId(1));
        read_from(&mut loaded, &mut bytes.as_slice(), &mut Checksum::default()).unwrap();
        assert_eq!(loaded.cell(CellIndex(0)).unwrap().template, None);
        assert_eq!(loaded.cell(CellIndex(0)).unwrap().land, LandType::Clear);
    }

    #[test]
    fn test_bad_icon_is_demoted() {
        // W1 is a single icon; icon 4 does not exist. Template 200 is unknown.
        let bytes = [1u8, 0, 0, 1, 0, 4, 200, 0, 0];
        let mut grid = CellGrid::new(3, 1);
        let mut crc = Checksum::default();
        let report = read_from(&mut grid, &mut &bytes[..], &mut crc).unwrap();

        assert_eq!(report.demoted, vec![CellIndex(1), CellIndex(2)]);
        assert_eq!(grid.cell(CellIndex(0)).unwrap().template, Some(TemplateId(1)));
        assert_eq!(grid.cell(CellIndex(0)).unwrap().land, LandType::Water);
        assert_eq!(grid.cell(CellIndex(1)).unwrap().template, None);
        assert_eq!(grid.cell(CellIndex(1)).unwrap().icon, 0);

        let mut expected = Checksum::default();
        for v in [1, 0, 255, 0, 255, 0] {
            expected.add(v);
        }
        assert_eq!(crc, expected);
    }

    #[test]
    fn test_truncated_leaves_grid_untouched() {
        let mut grid = sample_grid();
        let before = templates(&grid);
        let bytes = [0u8; 10];
        let err = read_from(&mut grid, &mut &bytes[..], &mut Checksum::default()).unwrap_err();
        assert!(matches!(err, MapError::Truncated { expected: 72, found: 10 }));
        assert_eq!(templates(&grid), before);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut grid = CellGrid::new(2, 2);
        let err = read_binary(&mut grid, dir.path().join("absent.bin"), &mut Checksum::default())
            .unwrap_err();
        assert!(matches!(err, MapError::Io(_)));
    }
}
