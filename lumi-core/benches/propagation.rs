#![allow(missing_docs)]
//! Benchmarks for light propagation.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::{hint::black_box, sync::Arc};

use lumi_core::{
    LightChannel, LightConfig, ThreadedLevelLightEngine,
    world::{BlockLight, MemoryWorld},
};
use lumi_utils::{BlockPos, SectionPos};

const MIN_Y: i32 = -64;

/// Creates an engine over a loaded cube of sections with the given radius.
fn create_lit_world(radius: i32, worker_threads: usize) -> (Arc<MemoryWorld>, ThreadedLevelLightEngine) {
    let world = Arc::new(MemoryWorld::new(MIN_Y));
    let config = LightConfig {
        worker_threads,
        ..LightConfig::default()
    };
    let engine = ThreadedLevelLightEngine::new(world.clone(), config).expect("valid config");
    for x in -radius..=radius {
        for y in -radius..=radius {
            for z in -radius..=radius {
                let section = SectionPos::new(x, y, z);
                world.load_section(section);
                engine.notify_section_loaded(section);
            }
        }
    }
    engine.wait_until_idle();
    (world, engine)
}

fn toggle(world: &MemoryWorld, engine: &ThreadedLevelLightEngine, pos: BlockPos, block: BlockLight) {
    let old = world.set_block(pos, block);
    engine.notify_block_changed(pos, old.opacity, old.emission);
}

fn bench_section_load(c: &mut Criterion) {
    c.bench_function("load_single_section", |b| {
        b.iter(|| black_box(create_lit_world(0, 0)));
    });
}

fn bench_source_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_toggle");

    for worker_threads in [0, 2, 4] {
        let (world, engine) = create_lit_world(1, worker_threads);
        let origin = BlockPos::new(0, 0, 0);
        group.bench_with_input(
            BenchmarkId::new("workers", worker_threads),
            &worker_threads,
            |b, _| {
                b.iter(|| {
                    toggle(&world, &engine, origin, BlockLight::new(0, 15));
                    engine.wait_until_idle();
                    toggle(&world, &engine, origin, BlockLight::AIR);
                    engine.wait_until_idle();
                    black_box(engine.query_light(origin.offset(3, 2, 1), LightChannel::Block))
                });
            },
        );
    }

    group.finish();
}

fn bench_roof_shadow(c: &mut Criterion) {
    let (world, engine) = create_lit_world(1, 0);
    let roof = BlockPos::new(4, 20, 4);

    c.bench_function("roof_place_remove", |b| {
        b.iter(|| {
            toggle(&world, &engine, roof, BlockLight::new(15, 0));
            engine.run_pending();
            toggle(&world, &engine, roof, BlockLight::AIR);
            black_box(engine.run_pending())
        });
    });
}

criterion_group!(benches, bench_section_load, bench_source_toggle, bench_roof_shadow);
criterion_main!(benches);
