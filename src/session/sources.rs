//! Seams to the services a session consumes: image discovery, dimension
//! probing and descriptor extraction.
//!
//! Decoding rasters and computing SIFT-like descriptors happen outside
//! this crate. The traits here are the narrow surface a deployment plugs
//! its implementations into; the bundled implementations cover what the
//! core itself needs (header-only dimension reads, constant fallback
//! descriptors).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::PairmarkError;
use crate::store::{DEFAULT_ANGLE, DEFAULT_SCALE, DESCRIPTOR_LEN};

/// Image filename extensions picked up by discovery, lowercase.
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Reports the pixel dimensions of a session image.
pub trait ImageProbe {
    fn dimensions(&self, image: &str) -> Result<(u32, u32), PairmarkError>;
}

/// Header-only dimension probe over an image directory.
pub struct FsImageProbe {
    root: PathBuf,
}

impl FsImageProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageProbe for FsImageProbe {
    fn dimensions(&self, image: &str) -> Result<(u32, u32), PairmarkError> {
        let path = self.root.join(image);
        let size = imagesize::size(&path).map_err(|source| PairmarkError::ImageUnreadable {
            image: image.to_string(),
            message: source.to_string(),
        })?;
        Ok((size.width as u32, size.height as u32))
    }
}

/// Descriptor output for one marked pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct DescriptorSample {
    pub descriptor: Vec<f32>,
    pub scale: f64,
    pub angle: f64,
}

/// Computes a fixed-length descriptor plus refined scale and orientation
/// for a pixel location, or returns `None` to refuse the sample.
///
/// A refusal aborts only the single pending mark; the store is left
/// unmutated.
pub trait DescriptorExtractor {
    fn describe(&self, image: &str, x: f64, y: f64) -> Option<DescriptorSample>;
}

/// Fallback extractor producing a constant zero descriptor with the
/// default scale and orientation. Lets a session run without any feature
/// backend attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatDescriptor;

impl DescriptorExtractor for FlatDescriptor {
    fn describe(&self, _image: &str, _x: f64, _y: f64) -> Option<DescriptorSample> {
        Some(DescriptorSample {
            descriptor: vec![0.0; DESCRIPTOR_LEN],
            scale: DEFAULT_SCALE,
            angle: DEFAULT_ANGLE,
        })
    }
}

/// Lists the annotatable images directly inside `dir`, filename-sorted.
///
/// Only the directory's own entries are considered; subdirectories are
/// not descended into.
pub fn discover_images(dir: &Path) -> Result<Vec<String>, PairmarkError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| PairmarkError::Io(source.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let is_image = name
            .rsplit_once('.')
            .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            names.push(name);
        }
    }
    names.sort();
    log::debug!("discovered {} image(s) in {}", names.len(), dir.display());
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_descriptor_never_refuses() {
        let sample = FlatDescriptor.describe("a.png", 1.0, 2.0).unwrap();
        assert_eq!(sample.descriptor.len(), DESCRIPTOR_LEN);
        assert!(sample.descriptor.iter().all(|v| *v == 0.0));
        assert_eq!(sample.scale, DEFAULT_SCALE);
        assert_eq!(sample.angle, DEFAULT_ANGLE);
    }

    #[test]
    fn discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.jpeg", "z.bmp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let names = discover_images(dir.path()).unwrap();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.jpeg", "z.bmp"]);
    }
}
