#![allow(dead_code)]

use pairmark::store::AnnotationStore;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Coordinates quantized to three decimal places so that six-decimal
/// serialization is lossless and round-trip comparisons can be exact.
pub fn arb_coord() -> impl Strategy<Value = f64> {
    (0u32..=10_000_000).prop_map(|millis| millis as f64 / 1000.0)
}

/// A keypoint triple as it appears on a keypoints line: either linked to
/// a positive 3D point or unresolved.
pub fn arb_keypoint_triple() -> impl Strategy<Value = (f64, f64, i64)> {
    (
        arb_coord(),
        arb_coord(),
        prop_oneof![Just(-1i64), 1i64..=50],
    )
}

/// A well-formed images.txt over a synthetic image sequence, together
/// with the sequence itself.
pub fn arb_images_txt(
    max_images: usize,
    max_points: usize,
) -> impl Strategy<Value = (Vec<String>, String)> {
    (2..=max_images).prop_flat_map(move |count| {
        let names: Vec<String> = (0..count).map(|i| format!("img_{i:03}.png")).collect();
        proptest::collection::vec(
            proptest::collection::vec(arb_keypoint_triple(), 0..=max_points),
            count,
        )
        .prop_map(move |per_image| {
            let mut text = String::from("# synthetic image list\n");
            for (index, (name, points)) in names.iter().zip(&per_image).enumerate() {
                text.push_str(&format!(
                    "{} 1.0 0.0 0.0 0.0 0.0 0.0 0.0 1 {}\n",
                    index + 1,
                    name
                ));
                let rendered: Vec<String> = points
                    .iter()
                    .map(|(x, y, id)| format!("{x:.6} {y:.6} {id}"))
                    .collect();
                text.push_str(&rendered.join(" "));
                text.push('\n');
            }
            (names.clone(), text)
        })
    })
}

/// Observation triples independent of feature-ID numbering, sorted for
/// multiset comparison.
pub fn triples(store: &AnnotationStore) -> Vec<(String, u64, u64, i64)> {
    let mut out: Vec<_> = store
        .image_names()
        .flat_map(|name| {
            store.observations(name).map(move |(_, obs)| {
                (
                    name.to_string(),
                    obs.x.to_bits(),
                    obs.y.to_bits(),
                    obs.point3d_id.as_i64(),
                )
            })
        })
        .collect();
    out.sort();
    out
}
