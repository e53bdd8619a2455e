//! Benchmarks for the frame-scoring and classification hot paths.
//!
//! Run with: cargo bench
//!
//! These operate on synthetic in-memory data, so no fixtures are required.

use std::path::PathBuf;

use criterion::Criterion;
use framesift::{SortKey, canonical_frame, classify, mean_squared_error};
use image::{DynamicImage, GrayImage};

fn checkerboard(width: u32, height: u32, phase: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if (x + y + phase) % 2 == 0 {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

fn benchmark_canonical_frame(criterion: &mut Criterion) {
    let frame = DynamicImage::ImageLuma8(checkerboard(1920, 1080, 0));

    criterion.bench_function("canonicalize 1080p frame", |bencher| {
        bencher.iter(|| canonical_frame(&frame));
    });
}

fn benchmark_mean_squared_error(criterion: &mut Criterion) {
    let reference = checkerboard(960, 1080, 0);
    let candidate = checkerboard(960, 1080, 1);

    criterion.bench_function("mse between cropped 1080p frames", |bencher| {
        bencher.iter(|| mean_squared_error(&reference, &candidate));
    });
}

fn benchmark_classification(criterion: &mut Criterion) {
    let images: Vec<PathBuf> = (0..10_000)
        .map(|index| {
            PathBuf::from(format!(
                "{}_{}_2023-07-{:02}_10-{:02}-00.jpg",
                index % 7 + 1,
                index % 3 + 1,
                index % 28 + 1,
                index % 60,
            ))
        })
        .collect();
    let keys = [SortKey::Box, SortKey::Cam, SortKey::Day];

    criterion.bench_function("classify 10k frames by box/cam/day", |bencher| {
        bencher.iter(|| classify(images.clone(), &keys).unwrap());
    });
}

criterion::criterion_group!(
    benches,
    benchmark_canonical_frame,
    benchmark_mean_squared_error,
    benchmark_classification,
);
criterion::criterion_main!(benches);
