//! Criterion benchmarks for the heat model.
//!
//! - `temperature`: full field recompute at a few grid sizes and heat loads.
//! - `heat_points`: advancing a crowd of drifting heat points.

use criterion::{Criterion, criterion_group, criterion_main};
use heatwire_core::heat::{HeatParams, HeatPoint, advance_heat_points};
use heatwire_core::noise::NoiseField;
use heatwire_core::pipeline::{Simulation, StepContext};
use heatwire_core::temperature::{TemperatureConfig, TemperatureStep};
use heatwire_core::test_utils::*;
use heatwire_core::vec2::Vec2;
use heatwire_core::world::{WorldConfig, WorldState};

// ===========================================================================
// World builders
// ===========================================================================

fn world_with_heat(size: usize, heat_points: usize) -> WorldState {
    let config = WorldConfig {
        rows: size,
        columns: size,
        ..WorldConfig::default()
    };
    let extent = config.field_width() as f64;
    let points = (0..heat_points)
        .map(|i| {
            let t = i as f64 / heat_points.max(1) as f64;
            HeatPoint::random(Vec2::new(t * extent, (1.0 - t) * extent), Vec2::new(-1.0, 0.0), 10.0)
        })
        .collect();
    WorldState::new(config, TEST_SEED)
        .expect("bench config is valid")
        .with_heat_points(points)
}

fn bench_temperature(c: &mut Criterion) {
    let mut group = c.benchmark_group("temperature");
    let step = TemperatureStep::new(NoiseField::new(TEST_SEED), TemperatureConfig::default(), HeatParams::default());

    for (size, heat) in [(10, 1), (10, 8), (30, 8)] {
        let world = world_with_heat(size, heat);
        group.bench_function(format!("recompute_{size}x{size}_{heat}_points"), |b| {
            b.iter(|| {
                let mut ctx = StepContext::new(world.time);
                step.apply(&world, &mut ctx)
            });
        });
    }

    group.finish();
}

fn bench_heat_points(c: &mut Criterion) {
    let world = world_with_heat(10, 200);
    let bounds = world.config.field_dimensions();
    let params = HeatParams::default();
    c.bench_function("advance_200_heat_points", |b| {
        b.iter(|| advance_heat_points(&world.heat_points, bounds, &params));
    });
}

criterion_group!(benches, bench_temperature, bench_heat_points);
criterion_main!(benches);
