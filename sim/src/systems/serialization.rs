//! Serialization utilities for map snapshots.

use crate::error::Result;
use crate::world::MapSnapshot;

/// Serialize a snapshot to JSON bytes.
pub fn snapshot_to_json(snapshot: &MapSnapshot) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(snapshot)?)
}

/// Serialize a snapshot to a JSON string.
pub fn snapshot_to_json_string(snapshot: &MapSnapshot) -> Result<String> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Deserialize a snapshot from JSON bytes.
pub fn snapshot_from_json(data: &[u8]) -> Result<MapSnapshot> {
    Ok(serde_json::from_slice(data)?)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> Result<MapSnapshot> {
    Ok(serde_json::from_str(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::CellIndex;
    use crate::house::HouseId;
    use crate::terrain::LandType;
    use crate::visibility::CellRevealed;
    use crate::world::CellSnapshot;

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = MapSnapshot {
            frame: 42,
            width: 8,
            height: 8,
            cells: vec![CellSnapshot {
                index: 9,
                x: 1,
                y: 1,
                template: Some(2),
                icon: 3,
                overlay: None,
                overlay_data: 0,
                smudge: None,
                land: LandType::Water,
                occupied: false,
                overlappers: 0,
                mapped: 1,
                visible: 1,
            }],
            revealed: vec![CellRevealed {
                cell: CellIndex(9),
                house: HouseId(0),
            }],
            ..Default::default()
        };

        let json = snapshot_to_json_string(&snapshot).unwrap();
        let restored = snapshot_from_json_string(&json).unwrap();
        assert_eq!(restored, snapshot);

        let bytes = snapshot_to_json(&snapshot).unwrap();
        assert_eq!(snapshot_from_json(&bytes).unwrap().frame, 42);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            snapshot_from_json_string("{not json"),
            Err(crate::error::MapError::Serialization(_))
        ));
    }
}
