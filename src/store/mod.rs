//! In-memory correspondence model.
//!
//! The [`AnnotationStore`] maps each image of the session to the set of
//! observations the operator has marked on it. Identity is carried by two
//! newtypes: [`FeatureId`] names a correspondence across the pair window,
//! [`Point3dId`] links observations on different images to one conceptual
//! 3D point.
//!
//! # Design Principles
//!
//! 1. **Deterministic iteration**: images and observations live in
//!    `BTreeMap`s so that every walk over the store (export, navigation,
//!    reporting) is filename- respectively ID-ordered without sorting.
//!
//! 2. **Monotone allocation**: the 3D point watermark only ever grows.
//!    Deleting observations never returns their IDs to the pool, so a
//!    resurrected ID can never alias a stale one.
//!
//! 3. **Permissive contents**: coordinates are range-checked at the
//!    interaction boundary, not here; the store records whatever the
//!    caller accepted.

mod ids;

pub use ids::{FeatureId, Point3dId};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Descriptor length used when no extractor result is available.
pub const DESCRIPTOR_LEN: usize = 128;

/// Keypoint scale recorded for imported or synthetic observations.
pub const DEFAULT_SCALE: f64 = 30.0;

/// Keypoint orientation recorded for imported or synthetic observations.
pub const DEFAULT_ANGLE: f64 = 0.0;

/// Which member of the pair window an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The two adjacent images currently exposed for annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairWindow {
    pub left: String,
    pub right: String,
}

impl PairWindow {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// The image name addressed by `side`.
    pub fn image(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Geometry and descriptor data for a single marked point, before it is
/// bound to a feature ID.
#[derive(Clone, Debug, PartialEq)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub descriptor: Vec<f32>,
    pub scale: f64,
    pub angle: f64,
}

impl Keypoint {
    /// A keypoint carrying the default flat descriptor, as recorded for
    /// observations that arrive without extractor output (import path).
    pub fn flat(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            descriptor: vec![0.0; DESCRIPTOR_LEN],
            scale: DEFAULT_SCALE,
            angle: DEFAULT_ANGLE,
        }
    }
}

/// One marked pixel location on one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub descriptor: Vec<f32>,
    pub scale: f64,
    pub angle: f64,
    pub point3d_id: Point3dId,
}

/// Camera pose tokens carried through from an imported images.txt.
///
/// The values are kept as the original strings so that export reproduces
/// imported files byte for byte, whatever precision the upstream
/// reconstruction wrote them with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pose {
    pub image_id: String,
    pub qw: String,
    pub qx: String,
    pub qy: String,
    pub qz: String,
    pub tx: String,
    pub ty: String,
    pub tz: String,
    pub camera_id: String,
}

/// Per-image slot: optional imported pose plus the observation set.
#[derive(Clone, Debug, Default, PartialEq)]
struct ImageRecord {
    pose: Option<Pose>,
    observations: BTreeMap<FeatureId, Observation>,
}

/// The session's full correspondence state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationStore {
    images: BTreeMap<String, ImageRecord>,
    max_point3d_id: i64,
}

impl AnnotationStore {
    /// Creates a store with one empty record per discovered image.
    pub fn new<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let images = images
            .into_iter()
            .map(|name| (name.into(), ImageRecord::default()))
            .collect();
        Self {
            images,
            max_point3d_id: 0,
        }
    }

    /// Records (or refreshes) the observation for `id` on one member of
    /// the active pair and returns the 3D point ID it ends up carrying.
    ///
    /// An existing observation keeps its 3D point ID and only has its
    /// geometry and descriptor overwritten. A fresh mark on the left
    /// image allocates a new 3D point; a fresh mark on the right image
    /// adopts the left image's ID for the same feature when present, and
    /// stays unresolved otherwise. New 3D point identities therefore
    /// originate on the left image and propagate rightward.
    pub fn add_observation(
        &mut self,
        pair: &PairWindow,
        side: Side,
        id: FeatureId,
        mark: Keypoint,
    ) -> Point3dId {
        let target = pair.image(side);

        let existing = self
            .images
            .get(target)
            .and_then(|record| record.observations.get(&id))
            .map(|obs| obs.point3d_id);

        let point3d_id = match (existing, side) {
            (Some(kept), _) => kept,
            (None, Side::Left) => self.allocate_point3d_id(),
            (None, Side::Right) => self
                .images
                .get(&pair.left)
                .and_then(|record| record.observations.get(&id))
                .map(|obs| obs.point3d_id)
                .unwrap_or(Point3dId::UNRESOLVED),
        };

        let record = self.images.entry(target.to_string()).or_default();
        record.observations.insert(
            id,
            Observation {
                x: mark.x,
                y: mark.y,
                descriptor: mark.descriptor,
                scale: mark.scale,
                angle: mark.angle,
                point3d_id,
            },
        );

        log::debug!(
            "marked feature {} on '{}' at ({:.2}, {:.2}) as 3D point {}",
            id,
            target,
            mark.x,
            mark.y,
            point3d_id
        );
        point3d_id
    }

    /// Removes the observation for `id` on `image` if present.
    ///
    /// Absence is not an error; the return value reports whether a
    /// removal actually occurred.
    pub fn delete_observation(&mut self, image: &str, id: FeatureId) -> bool {
        self.images
            .get_mut(image)
            .map(|record| record.observations.remove(&id).is_some())
            .unwrap_or(false)
    }

    /// Removes every observation on `image` whose position falls inside
    /// the inclusive box spanned by the two corner pairs, returning how
    /// many were removed.
    ///
    /// Corners may arrive in any order (drag gestures run in every
    /// direction); a degenerate zero-area box still matches points that
    /// lie exactly on it. Linear in the image's observation count.
    pub fn delete_in_range(
        &mut self,
        image: &str,
        x_a: f64,
        x_b: f64,
        y_a: f64,
        y_b: f64,
    ) -> usize {
        let (x_min, x_max) = (x_a.min(x_b), x_a.max(x_b));
        let (y_min, y_max) = (y_a.min(y_b), y_a.max(y_b));

        let Some(record) = self.images.get_mut(image) else {
            return 0;
        };

        let before = record.observations.len();
        record
            .observations
            .retain(|_, obs| !(x_min <= obs.x && obs.x <= x_max && y_min <= obs.y && obs.y <= y_max));
        let removed = before - record.observations.len();

        if removed > 0 {
            log::info!("box delete removed {} point(s) from '{}'", removed, image);
        }
        removed
    }

    /// The highest 3D point ID ever allocated or imported. Never
    /// decreases, even across deletions.
    pub fn point3d_watermark(&self) -> i64 {
        self.max_point3d_id
    }

    /// Raises the watermark to at least `id`. Used when seeding from an
    /// imported file; lower values are ignored.
    pub(crate) fn raise_point3d_watermark(&mut self, id: i64) {
        if id > self.max_point3d_id {
            self.max_point3d_id = id;
        }
    }

    fn allocate_point3d_id(&mut self) -> Point3dId {
        self.max_point3d_id += 1;
        Point3dId::new(self.max_point3d_id)
    }

    /// Image names in filename-sorted order.
    pub fn image_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.images.keys().map(String::as_str)
    }

    pub fn contains_image(&self, image: &str) -> bool {
        self.images.contains_key(image)
    }

    pub fn observation(&self, image: &str, id: FeatureId) -> Option<&Observation> {
        self.images
            .get(image)
            .and_then(|record| record.observations.get(&id))
    }

    pub fn has_observation(&self, image: &str, id: FeatureId) -> bool {
        self.observation(image, id).is_some()
    }

    /// The observations on `image` in ascending feature-ID order.
    pub fn observations<'a>(
        &'a self,
        image: &str,
    ) -> impl Iterator<Item = (FeatureId, &'a Observation)> + 'a {
        self.images
            .get(image)
            .into_iter()
            .flat_map(|record| record.observations.iter().map(|(id, obs)| (*id, obs)))
    }

    /// Feature IDs present on `image`, ascending.
    pub fn feature_ids<'a>(&'a self, image: &str) -> impl Iterator<Item = FeatureId> + 'a {
        self.images
            .get(image)
            .into_iter()
            .flat_map(|record| record.observations.keys().copied())
    }

    /// The largest feature ID present anywhere in the store.
    pub fn max_feature_id(&self) -> Option<FeatureId> {
        self.images
            .values()
            .filter_map(|record| record.observations.keys().next_back())
            .max()
            .copied()
    }

    pub fn observation_count(&self, image: &str) -> usize {
        self.images
            .get(image)
            .map(|record| record.observations.len())
            .unwrap_or(0)
    }

    pub fn total_observations(&self) -> usize {
        self.images
            .values()
            .map(|record| record.observations.len())
            .sum()
    }

    pub fn pose(&self, image: &str) -> Option<&Pose> {
        self.images.get(image).and_then(|record| record.pose.as_ref())
    }

    /// Attaches imported pose tokens to `image`. Unknown names are
    /// ignored; poses are never synthesized for them.
    pub fn set_pose(&mut self, image: &str, pose: Pose) {
        if let Some(record) = self.images.get_mut(image) {
            record.pose = Some(pose);
        }
    }

    /// Inserts an observation that already carries its 3D point ID
    /// (import path). Unknown image names are ignored.
    pub(crate) fn insert_imported(&mut self, image: &str, id: FeatureId, obs: Observation) {
        if let Some(record) = self.images.get_mut(image) {
            record.observations.insert(id, obs);
        }
    }
}
