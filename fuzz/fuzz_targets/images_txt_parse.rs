//! Fuzz target for images.txt parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the images.txt parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pairmark::colmap::from_images_txt_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let known: Vec<String> = (0..4).map(|i| format!("img_{i:02}.png")).collect();
    let _ = from_images_txt_slice(data, &known);
});
