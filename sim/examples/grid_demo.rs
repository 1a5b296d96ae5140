//! Demonstration of the Tiberium Grid map core.
//!
//! Run with: RUST_LOG=tiberium_grid=debug cargo run --example grid_demo

use tiberium_grid::{
    CellIndex, Coord, Footprint, House, MapWorld, ObjectBundle, ObjectKind, OverlayType, ScenarioConfig,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> tiberium_grid::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiberium_grid=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Tiberium Grid - Map Demo ===\n");

    let mut config = ScenarioConfig::default();
    config.map.width = 32;
    config.map.height = 32;
    config.map.bounds = Some((1, 1, 30, 30));
    let mut map = MapWorld::with_config(config)?;

    // Terrain: a river crossing and a paved square
    let river = map.grid().catalog().find("RV1");
    let road = map.grid().catalog().find("D01");
    if let (Some(river), Some(road)) = (river, road) {
        map.place_template(CellIndex(10 * 32 + 10), river)?;
        map.place_template(CellIndex(4 * 32 + 4), road)?;
    }

    // A Tiberium field, settled the way a freshly loaded map is
    {
        let mut grid = map.world_mut().resource_mut::<tiberium_grid::CellGrid>();
        for y in 20..24 {
            for x in 20..24 {
                if let Some(cell) = grid.xy_cell(x, y) {
                    grid.set_overlay(cell, OverlayType::Tiberium1, 0);
                }
            }
        }
    }
    println!("Tiberium field value: {} credits", map.overpass());

    // A player house with a harvester
    let gdi = map.add_house(House::new("GDI", true)).expect("empty roster");
    let harvester = map.spawn_object(
        ObjectBundle::new(ObjectKind::Unit, Coord::cell_center(18, 18)).with_footprint(Footprint::single()),
    );
    let start = map.grid().xy_cell(18, 18).expect("on map");
    map.place_down(start, harvester);
    println!("Revealed {} cells around the harvester", map.sight_from(gdi, start, 5, false));

    // Run 60 seconds of frames at 15 Hz
    for _ in 0..(60 * 15) {
        map.step(1.0 / 15.0 + 0.0001);
    }
    println!("\nAfter {} frames:", map.frame());

    let snapshot = map.snapshot();
    println!("  Tiberium cells: {}", snapshot.tiberium_cells);
    println!("  Revealed since start: {}", snapshot.revealed.len());
    println!("  Map valid: {}", map.validate());

    if let Some(cell) = map.place_random_crate() {
        println!("  Crate dropped at {cell}");
    }
    if let Some(cell) = map.nearby_clear_cell(start) {
        println!("  Nearest clear cell to harvester: {cell}");
    }

    println!("\n=== Final State (JSON) ===\n");
    println!("{}", map.snapshot().to_json_pretty()?);
    Ok(())
}
