#[macro_use]
extern crate criterion;
extern crate mandelbrot;

use criterion::Criterion;
use mandelbrot::{apply_palette, FieldEngine, Palette};

fn bench_compute(c: &mut Criterion) {
    c.bench_function("compute 256x192 whole set", |b| {
        let engine = FieldEngine::new(256, 192).unwrap();
        b.iter(|| engine.compute().unwrap())
    });

    c.bench_function("compute 256x192 boundary zoom", |b| {
        let mut engine = FieldEngine::new(256, 192).unwrap();
        let mut view = engine.viewport();
        // Seahorse valley: filamentary boundary, the subdivision's
        // worst case.
        view.center_x = -0.75;
        view.center_y = 0.1;
        view.zoom = 60.0;
        engine.set_viewport(view);
        b.iter(|| engine.compute().unwrap())
    });

    c.bench_function("palette map 256x192", |b| {
        let engine = FieldEngine::new(256, 192).unwrap();
        let field = engine.compute().unwrap();
        b.iter(|| apply_palette(&field, 256, Palette::Rainbow, 1.5))
    });
}

criterion_group!(benches, bench_compute);
criterion_main!(benches);
