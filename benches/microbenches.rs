//! Criterion microbenches for images.txt parsing and writing.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - images.txt parsing (from_images_txt_str)
//! - images.txt writing (to_images_txt_string)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use pairmark::colmap::{from_images_txt_str, to_images_txt_string};

/// A deterministic synthetic file: `images` records with `points`
/// keypoints each.
fn synthetic_images_txt(images: usize, points: usize) -> (Vec<String>, String) {
    let names: Vec<String> = (0..images).map(|i| format!("img_{i:04}.png")).collect();

    let mut text = String::from("# synthetic image list\n");
    for (index, name) in names.iter().enumerate() {
        text.push_str(&format!(
            "{} 1.0 0.0 0.0 0.0 0.0 0.0 0.0 1 {}\n",
            index + 1,
            name
        ));
        let rendered: Vec<String> = (0..points)
            .map(|p| {
                let x = (index * 131 + p * 17) % 1920;
                let y = (index * 37 + p * 23) % 1080;
                let id = if p % 3 == 0 { -1 } else { (p + 1) as i64 };
                format!("{x}.250000 {y}.500000 {id}")
            })
            .collect();
        text.push_str(&rendered.join(" "));
        text.push('\n');
    }

    (names, text)
}

/// Benchmark images.txt parsing from string.
fn bench_parse_str(c: &mut Criterion) {
    let (names, text) = synthetic_images_txt(50, 40);

    let mut group = c.benchmark_group("images_txt_parse");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("from_images_txt_str", |b| {
        b.iter(|| {
            let store = from_images_txt_str(black_box(&text), black_box(&names));
            black_box(store)
        })
    });

    group.finish();
}

/// Benchmark images.txt writing.
fn bench_export_string(c: &mut Criterion) {
    let (names, text) = synthetic_images_txt(50, 40);
    let store = from_images_txt_str(&text, &names);

    let mut group = c.benchmark_group("images_txt_write");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("to_images_txt_string", |b| {
        b.iter(|| {
            let out = to_images_txt_string(black_box(&store));
            black_box(out)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parse_str, bench_export_string);
criterion_main!(benches);
