//! Property checks for grid indexing, occupancy and persistence.

use proptest::prelude::*;
use tiberium_grid::persist::{read_from, write_to, Checksum};
use tiberium_grid::{
    CellGrid, CellIndex, CellOffset, Coord, Footprint, MapWorld, ObjectBundle, ObjectKind, ScenarioConfig, TemplateId,
};

fn small_map(width: usize, height: usize) -> MapWorld {
    let mut config = ScenarioConfig::default();
    config.map.width = width;
    config.map.height = height;
    MapWorld::with_config(config).unwrap()
}

fn arb_footprint() -> impl Strategy<Value = Footprint> {
    let offset = (-1i16..=2, -1i16..=2).prop_map(|(dx, dy)| CellOffset::new(dx, dy));
    (
        prop::collection::vec(offset.clone(), 1..5),
        prop::collection::vec(offset, 0..4),
    )
        .prop_map(|(occupy, overlap)| Footprint::new(&occupy, &overlap))
}

proptest! {
    #[test]
    fn xy_cell_round_trip(width in 1usize..40, height in 1usize..40, x in 0usize..40, y in 0usize..40) {
        let grid = CellGrid::new(width, height);
        match grid.xy_cell(x, y) {
            Some(cell) => prop_assert_eq!(grid.cell_xy(cell), (x, y)),
            None => prop_assert!(x >= width || y >= height),
        }
    }

    #[test]
    fn cell_distance_is_symmetric(a in 0usize..400, b in 0usize..400) {
        let grid = CellGrid::new(20, 20);
        let (a, b) = (CellIndex(a), CellIndex(b));
        prop_assert_eq!(grid.cell_distance(a, b), grid.cell_distance(b, a));
        prop_assert_eq!(grid.cell_distance(a, a), 0);
    }

    #[test]
    fn pick_up_undoes_place_down(
        footprint in arb_footprint(),
        x in 0usize..12,
        y in 0usize..12,
        others in 0usize..3,
    ) {
        let mut map = small_map(12, 12);
        let cell = map.grid().xy_cell(x, y).unwrap();

        // Some bystanders already in the cell.
        for _ in 0..others {
            let e = map.spawn_object(
                ObjectBundle::new(ObjectKind::Unit, Coord::cell_center(x, y))
                    .with_footprint(Footprint::single()),
            );
            map.place_down(cell, e);
        }
        let before: Vec<_> = map.grid().cells().to_vec();

        let object = map.spawn_object(
            ObjectBundle::new(ObjectKind::Unit, Coord::cell_center(x, y)).with_footprint(footprint),
        );
        map.place_down(cell, object);
        prop_assert!(map.validate());
        map.pick_up(cell, object);

        prop_assert_eq!(map.grid().cells(), &before[..]);
        prop_assert!(map.validate());
    }

    #[test]
    fn binary_read_restores_written_grid(
        width in 1usize..10,
        height in 1usize..10,
        picks in prop::collection::vec((0usize..100, 0u16..9, 0u8..9), 0..20),
    ) {
        let mut grid = CellGrid::new(width, height);
        for (cell, template, icon) in picks {
            let cell = CellIndex(cell % grid.len());
            let id = TemplateId(template);
            let valid = grid.catalog().get(id).is_some_and(|def| def.has_icon(icon));
            if let (true, Some(c)) = (valid, grid.cell_mut(cell)) {
                c.template = Some(id);
                c.icon = icon;
            }
        }
        grid.recalc_all();

        let mut bytes = Vec::new();
        write_to(&grid, &mut bytes).unwrap();
        let mut loaded = CellGrid::new(width, height);
        let report = read_from(&mut loaded, &mut bytes.as_slice(), &mut Checksum::default()).unwrap();

        prop_assert!(report.demoted.is_empty());
        prop_assert_eq!(loaded.cells(), grid.cells());
    }
}
