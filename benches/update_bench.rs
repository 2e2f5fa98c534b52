//! Benchmarks for amplitude updates and mapping.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use phobz_live::{
    create_visualizer, map_bar, map_circular, FrameRecorder, HeadlessSurface, VisualizerConfig,
    VisualizerKind,
};

fn bench_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mapping");

    group.bench_function("map_bar_all_samples", |b| {
        b.iter(|| {
            for sample in 0..=255u8 {
                black_box(map_bar(black_box(sample)));
            }
        });
    });

    group.bench_function("map_circular_all_samples", |b| {
        b.iter(|| {
            for sample in 0..=255u8 {
                black_box(map_circular(black_box(sample), 1.25, 5.0));
            }
        });
    });

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("Visualizer Update");

    for kind in VisualizerKind::all() {
        let visualizer = match create_visualizer(
            *kind,
            Box::new(HeadlessSurface::new(640, 360)),
            Box::new(FrameRecorder::new()),
            &VisualizerConfig::default(),
        ) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Skipping {} update benchmark: {}", kind.name(), e);
                continue;
            }
        };

        let audio: Vec<u8> = (0..kind.element_count())
            .map(|i| (i * 7 % 255) as u8 + 1)
            .collect();

        group.bench_with_input(BenchmarkId::new("update", kind.name()), &audio, |b, audio| {
            b.iter(|| visualizer.update(black_box(audio)));
        });

        visualizer.dispose();
    }

    group.finish();
}

criterion_group!(benches, bench_mapping, bench_update);
criterion_main!(benches);
