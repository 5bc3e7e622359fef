use criterion::{black_box, criterion_group, criterion_main, Criterion};
use substrate_core::seed::Seed;
use substrate_core::{project, project_with_hilbert};

fn bench_project(c: &mut Criterion) {
    let seeds: Vec<Seed> = (0u32..10_000)
        .filter_map(|cp| Seed::codepoint(cp).ok())
        .collect();

    c.bench_function("project codepoints", |b| {
        b.iter(|| {
            for seed in &seeds {
                black_box(project(black_box(seed)));
            }
        });
    });

    c.bench_function("project_with_hilbert codepoints", |b| {
        b.iter(|| {
            for seed in &seeds {
                black_box(project_with_hilbert(black_box(seed)));
            }
        });
    });
}

criterion_group!(benches, bench_project);
criterion_main!(benches);
