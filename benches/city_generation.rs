use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridcity::procgen::modules::ModuleLibrary;
use gridcity::procgen::road_generator::{RoadLayoutConfig, RoadLayoutPlanner};
use gridcity::{generate_city, CityGenConfig};

fn bench_road_layout(c: &mut Criterion) {
    let config = RoadLayoutConfig::default();
    c.bench_function("road_layout_60x60", |b| {
        b.iter(|| RoadLayoutPlanner::generate(black_box(&config)))
    });
}

fn bench_full_city(c: &mut Criterion) {
    let config = CityGenConfig::default();
    let library = ModuleLibrary::default();
    c.bench_function("generate_city_60x60", |b| {
        b.iter(|| generate_city(black_box(&config), &library))
    });
}

criterion_group!(benches, bench_road_layout, bench_full_city);
criterion_main!(benches);
