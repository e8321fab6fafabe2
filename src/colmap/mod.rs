//! COLMAP images.txt reader and writer.
//!
//! This module moves annotation state into and out of the two-lines-per-
//! image text layout consumed by SfM/MVS tooling:
//!
//! ```text
//! # comment block
//! IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME
//! X Y POINT3D_ID X Y POINT3D_ID ...
//! ```
//!
//! # Tolerant parsing
//!
//! The reader never fails on malformed *content* — it fails only when the
//! file itself cannot be read. Records naming images outside the known
//! set are skipped, keypoints lines with a broken token count are dropped
//! whole, and individual non-numeric triples are dropped one by one. A
//! skipped record does **not** consume its keypoints line; that line is
//! examined as a candidate pose line on the next iteration and, lacking
//! ten tokens, usually discarded there (see DESIGN.md for why this quirk
//! is kept).
//!
//! # Deterministic output
//!
//! The writer emits images in filename order and each image's keypoints
//! in ascending feature-ID order, so identical stores always serialize to
//! identical bytes.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use crate::error::PairmarkError;
use crate::store::{AnnotationStore, FeatureId, Keypoint, Observation, Point3dId, Pose};

/// Reads annotation state from an images.txt file.
///
/// `known_images` is the session's discovered image set; records naming
/// anything else are skipped. The parse fails as a whole only when the
/// file cannot be read — no partially filled store is ever returned.
pub fn read_images_txt(
    path: &Path,
    known_images: &[String],
) -> Result<AnnotationStore, PairmarkError> {
    let text =
        std::fs::read_to_string(path).map_err(|source| PairmarkError::ImagesTxtParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
    Ok(from_images_txt_str(&text, known_images))
}

/// Parses annotation state from an images.txt string.
///
/// Useful for testing without file I/O.
pub fn from_images_txt_str(text: &str, known_images: &[String]) -> AnnotationStore {
    let known: HashSet<&str> = known_images.iter().map(String::as_str).collect();
    let mut store = AnnotationStore::new(known_images.iter().cloned());

    // One running counter across the entire file, not reset per image.
    let mut next_feature = FeatureId::FIRST;

    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 10 {
            continue;
        }

        let name_token = tokens[9];
        let matched = if known.contains(name_token) {
            Some(name_token)
        } else {
            // Upstream files often carry directory-qualified names.
            basename(name_token).filter(|base| known.contains(base))
        };
        let Some(matched) = matched else {
            log::warn!("skipping record for unknown image '{}'", name_token);
            continue;
        };
        let matched = matched.to_string();

        store.set_pose(
            &matched,
            Pose {
                image_id: tokens[0].to_string(),
                qw: tokens[1].to_string(),
                qx: tokens[2].to_string(),
                qy: tokens[3].to_string(),
                qz: tokens[4].to_string(),
                tx: tokens[5].to_string(),
                ty: tokens[6].to_string(),
                tz: tokens[7].to_string(),
                camera_id: tokens[8].to_string(),
            },
        );

        if i >= lines.len() {
            break;
        }
        let keypoint_line = lines[i].trim();
        i += 1;
        if keypoint_line.starts_with('#') {
            continue;
        }

        let kp_tokens: Vec<&str> = keypoint_line.split_whitespace().collect();
        if kp_tokens.len() % 3 != 0 {
            log::warn!(
                "dropping keypoints line for '{}': {} token(s) is not a multiple of three",
                matched,
                kp_tokens.len()
            );
            continue;
        }

        for triple in kp_tokens.chunks(3) {
            let (Ok(x), Ok(y), Ok(raw_id)) = (
                triple[0].parse::<f64>(),
                triple[1].parse::<f64>(),
                triple[2].parse::<i64>(),
            ) else {
                continue;
            };

            let point3d_id = Point3dId::new(raw_id);
            let mark = Keypoint::flat(x, y);
            store.insert_imported(
                &matched,
                next_feature,
                Observation {
                    x: mark.x,
                    y: mark.y,
                    descriptor: mark.descriptor,
                    scale: mark.scale,
                    angle: mark.angle,
                    point3d_id,
                },
            );
            if point3d_id.is_linked() {
                store.raise_point3d_watermark(point3d_id.as_i64());
            }
            next_feature = next_feature.next();
        }
    }

    store
}

/// Parses annotation state from images.txt bytes.
///
/// Useful for fuzzing and processing raw bytes; non-UTF-8 input fails
/// the parse as a whole.
pub fn from_images_txt_slice(
    bytes: &[u8],
    known_images: &[String],
) -> Result<AnnotationStore, PairmarkError> {
    let text = std::str::from_utf8(bytes).map_err(|source| PairmarkError::ImagesTxtParse {
        path: Path::new("<bytes>").to_path_buf(),
        message: source.to_string(),
    })?;
    Ok(from_images_txt_str(text, known_images))
}

/// Writes the store to an images.txt file.
pub fn write_images_txt(path: &Path, store: &AnnotationStore) -> Result<(), PairmarkError> {
    let text = to_images_txt_string(store);
    let mut file = File::create(path).map_err(|source| PairmarkError::ImagesTxtWrite {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(text.as_bytes())
        .map_err(|source| PairmarkError::ImagesTxtWrite {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Serializes the store to an images.txt string.
///
/// Images without imported pose tokens get the identity quaternion, zero
/// translation, camera 1 and their 1-based position in filename order as
/// the image ID. Keypoints render as `x y point3d_id` triples with
/// coordinates at six decimal digits; an image without observations still
/// gets its (empty) keypoints line.
pub fn to_images_txt_string(store: &AnnotationStore) -> String {
    let image_count = store.image_names().count();

    let mut out = String::new();
    out.push_str("# Image list with two lines of data per image:\n");
    out.push_str("#   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME\n");
    out.push_str("#   POINTS2D[] as (X, Y, POINT3D_ID)\n");
    let _ = writeln!(
        out,
        "# Number of images: {}, mean observations per image: N/A",
        image_count
    );

    for (index, name) in store.image_names().enumerate() {
        match store.pose(name) {
            Some(pose) => {
                let _ = writeln!(
                    out,
                    "{} {} {} {} {} {} {} {} {} {}",
                    pose.image_id,
                    pose.qw,
                    pose.qx,
                    pose.qy,
                    pose.qz,
                    pose.tx,
                    pose.ty,
                    pose.tz,
                    pose.camera_id,
                    name
                );
            }
            None => {
                let _ = writeln!(out, "{} 1.0 0.0 0.0 0.0 0.0 0.0 0.0 1 {}", index + 1, name);
            }
        }

        let keypoints: Vec<String> = store
            .observations(name)
            .map(|(_, obs)| format!("{:.6} {:.6} {}", obs.x, obs.y, obs.point3d_id))
            .collect();
        out.push_str(&keypoints.join(" "));
        out.push('\n');
    }

    out
}

fn basename(name: &str) -> Option<&str> {
    name.rsplit(['/', '\\']).next()
}
