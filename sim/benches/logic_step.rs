//! Benchmarks for per-frame map work.
//!
//! Run with: cargo bench -p tiberium_grid

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tiberium_grid::{CellIndex, House, MapWorld, OverlayType, ScenarioConfig};

/// Build a square map with every seventh cell holding Tiberium.
fn build_map(side: usize) -> MapWorld {
    let mut config = ScenarioConfig::default();
    config.map.width = side;
    config.map.height = side;
    let mut map = MapWorld::with_config(config).expect("valid dimensions");
    {
        let mut grid = map.world_mut().resource_mut::<tiberium_grid::CellGrid>();
        for i in (0..side * side).step_by(7) {
            grid.set_overlay(CellIndex(i), OverlayType::Tiberium3, 4);
        }
    }
    map.overpass();
    map
}

fn bench_logic_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("logic_step");

    for side in [64, 128] {
        let mut map = build_map(side);
        group.bench_with_input(BenchmarkId::new("growth", side), &side, |b, _| {
            b.iter(|| {
                map.logic_step();
                black_box(map.frame())
            });
        });
    }

    group.finish();
}

fn bench_sight(c: &mut Criterion) {
    let mut group = c.benchmark_group("sight_from");
    let mut map = build_map(128);
    let house = map.add_house(House::new("GDI", true)).expect("roster has room");

    for range in [3, 7, 10] {
        group.bench_with_input(BenchmarkId::new("full", range), &range, |b, &range| {
            b.iter(|| {
                map.init_clear();
                black_box(map.sight_from(house, CellIndex(64 * 128 + 64), range, false))
            });
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let map = build_map(128);
    c.bench_function("validate_128", |b| b.iter(|| black_box(map.validate())));
}

criterion_group!(benches, bench_logic_step, bench_sight, bench_validate);
criterion_main!(benches);
