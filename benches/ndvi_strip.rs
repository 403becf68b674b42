use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strip_ndvi_rs::ndvi_pipeline::mask::{percentile, water_mask};
use strip_ndvi_rs::ndvi_pipeline::ndvi::{normalized_difference, Histogram};
use strip_ndvi_rs::ndvi_pipeline::ndvi::linspace;
use strip_ndvi_rs::ndvi_pipeline::{
    Raster, RasterWriter, StandardTiffWriter, TiffCompression, TiffOptions,
};
use std::io::Cursor;

fn generate_band(width: usize, height: usize, offset: usize) -> Raster<f64> {
    let data = (0..width * height)
        .map(|i| ((i + offset) % 4096) as f64)
        .collect();
    Raster { width, height, data }
}

fn benchmark_ndvi_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("ndvi_by_size");

    let sizes = vec![
        (100, 100, "100x100"),
        (500, 500, "500x500"),
        (1000, 1000, "1000x1000"),
    ];

    for (width, height, label) in sizes {
        let nir = generate_band(width, height, 1000);
        let red = generate_band(width, height, 0);

        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &(nir, red),
            |b, (nir, red)| {
                b.iter(|| normalized_difference(black_box(nir), black_box(red)));
            },
        );
    }

    group.finish();
}

fn benchmark_masking(c: &mut Criterion) {
    let mut group = c.benchmark_group("masking");
    let blue = generate_band(1000, 1000, 0);

    group.bench_function("percentile", |b| {
        b.iter(|| percentile(black_box(&blue.data), 50.0));
    });
    group.bench_function("water_mask", |b| {
        b.iter(|| water_mask(black_box(&blue), 50.0));
    });

    let ndvi = normalized_difference(&generate_band(1000, 1000, 1000), &blue).unwrap();
    let edges = linspace(0.01, 1.0, 100);
    group.bench_function("histogram", |b| {
        b.iter(|| Histogram::density(black_box(&ndvi.data), &edges));
    });

    group.finish();
}

fn benchmark_export_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_compression");
    let raster = generate_band(500, 500, 0);

    let compressions = vec![
        (TiffCompression::None, "none"),
        (TiffCompression::Lzw, "lzw"),
        (TiffCompression::DeflateBalanced, "deflate"),
    ];

    for (compression, label) in compressions {
        let options = TiffOptions { compression };
        group.bench_with_input(BenchmarkId::from_parameter(label), &options, |b, options| {
            let writer = StandardTiffWriter;
            b.iter(|| {
                let mut output = Cursor::new(Vec::new());
                let _ = writer.write_raster(black_box(&raster), &mut output, options);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_ndvi_sizes,
    benchmark_masking,
    benchmark_export_compression
);
criterion_main!(benches);
