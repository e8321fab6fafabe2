//! The annotation session: one object owning the store, the codec
//! round-trip, the view transform and the pair cursor, exposing a narrow
//! method set to whatever presentation layer drives it.
//!
//! All mutation goes through `&mut self` from a single interaction
//! thread; there is no interior locking. Import parses into a scratch
//! store and swaps it in only on success, so a failed import leaves the
//! session exactly as it was.

mod sources;

pub use sources::{
    discover_images, DescriptorExtractor, DescriptorSample, FlatDescriptor, FsImageProbe,
    ImageProbe,
};

use std::collections::BTreeMap;
use std::path::Path;

use crate::colmap;
use crate::error::PairmarkError;
use crate::pair::PairCursor;
use crate::store::{AnnotationStore, FeatureId, Keypoint, PairWindow, Point3dId, Side};
use crate::viewport::{within_bounds, Coord, Extent, ImageSpace, ViewSpace, ViewTransform};

/// What an import brought in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportSummary {
    pub observations: usize,
    pub point3d_watermark: i64,
}

/// What an export wrote out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub images: usize,
}

/// An interactive annotation session over one image directory.
pub struct Session {
    store: AnnotationStore,
    cursor: PairCursor,
    view: ViewTransform,
    probe: Box<dyn ImageProbe>,
    extractor: Box<dyn DescriptorExtractor>,
    dims: BTreeMap<String, (u32, u32)>,
}

impl Session {
    /// Builds a session over an explicit image list.
    pub fn new(
        images: Vec<String>,
        probe: Box<dyn ImageProbe>,
        extractor: Box<dyn DescriptorExtractor>,
    ) -> Result<Self, PairmarkError> {
        let cursor = PairCursor::new(images)?;
        let store = AnnotationStore::new(cursor.images().iter().cloned());
        Ok(Self {
            store,
            cursor,
            view: ViewTransform::default(),
            probe,
            extractor,
            dims: BTreeMap::new(),
        })
    }

    /// Discovers the images under `image_dir` and builds a session with
    /// filesystem-backed dimension probing.
    pub fn open(
        image_dir: &Path,
        extractor: Box<dyn DescriptorExtractor>,
    ) -> Result<Self, PairmarkError> {
        let images = discover_images(image_dir)?;
        Self::new(images, Box::new(FsImageProbe::new(image_dir)), extractor)
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn images(&self) -> &[String] {
        self.cursor.images()
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom()
    }

    pub fn set_zoom(&mut self, requested: f64) -> Result<(), PairmarkError> {
        self.view.set_zoom(requested)
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn current_pair(&self) -> PairWindow {
        self.cursor.current()
    }

    pub fn active_feature(&self) -> FeatureId {
        self.cursor.active_feature()
    }

    pub fn set_active_feature(&mut self, id: FeatureId) {
        self.cursor.set_active_feature(id);
    }

    pub fn next_pair(&mut self) -> Option<PairWindow> {
        self.cursor.advance(&self.store)
    }

    pub fn prev_pair(&mut self) -> Option<PairWindow> {
        self.cursor.retreat()
    }

    /// Pixel dimensions of both members of the current pair. A probe
    /// failure is scoped to this pair and leaves the store untouched.
    pub fn pair_extents(&mut self) -> Result<(Extent, Extent), PairmarkError> {
        let pair = self.cursor.current();
        let left = self.image_extent(&pair.left)?;
        let right = self.image_extent(&pair.right)?;
        Ok((left, right))
    }

    /// Records the active feature at a pointer position on one member of
    /// the current pair, mapping the position back through the view
    /// transform first.
    pub fn annotate(
        &mut self,
        side: Side,
        pointer: Coord<ViewSpace>,
        viewport: Extent,
    ) -> Result<Point3dId, PairmarkError> {
        let image = self.cursor.current().image(side).to_string();
        let extent = self.image_extent(&image)?;
        let position = self.view.to_image(pointer, extent, viewport);
        self.mark(side, position.x, position.y)
    }

    /// Records the active feature at an image-space position on one
    /// member of the current pair.
    ///
    /// The position must hit the image (letterbox-margin clicks are
    /// rejected), and the descriptor extractor must accept the sample;
    /// either failure leaves the store unmutated. When the mark completes
    /// the correspondence on both pair members, the active feature ID
    /// advances to the next value.
    pub fn mark(&mut self, side: Side, x: f64, y: f64) -> Result<Point3dId, PairmarkError> {
        let pair = self.cursor.current();
        let image = pair.image(side).to_string();
        let extent = self.image_extent(&image)?;

        let position: Coord<ImageSpace> = Coord::new(x, y);
        if !within_bounds(position, extent) {
            return Err(PairmarkError::CoordinateOutOfBounds {
                image,
                x,
                y,
                width: extent.width,
                height: extent.height,
            });
        }

        let sample = self.extractor.describe(&image, x, y).ok_or_else(|| {
            PairmarkError::DescriptorUnavailable {
                image: image.clone(),
                x,
                y,
            }
        })?;

        let id = self.cursor.active_feature();
        let point3d_id = self.store.add_observation(
            &pair,
            side,
            id,
            Keypoint {
                x,
                y,
                descriptor: sample.descriptor,
                scale: sample.scale,
                angle: sample.angle,
            },
        );

        if self.store.has_observation(&pair.left, id) && self.store.has_observation(&pair.right, id)
        {
            log::info!("feature {} complete on both images, moving on", id);
            self.cursor.set_active_feature(id.next());
        }

        Ok(point3d_id)
    }

    /// Deletes the active feature from both members of the current pair,
    /// reporting whether anything was removed.
    pub fn delete_active(&mut self) -> bool {
        let pair = self.cursor.current();
        let id = self.cursor.active_feature();
        let left = self.store.delete_observation(&pair.left, id);
        let right = self.store.delete_observation(&pair.right, id);
        if !(left || right) {
            log::info!("feature {} not found on the current pair", id);
        }
        left || right
    }

    /// Deletes every observation inside the box dragged between two
    /// image-space corners on one member of the current pair.
    pub fn delete_in_box(
        &mut self,
        side: Side,
        corner_a: Coord<ImageSpace>,
        corner_b: Coord<ImageSpace>,
    ) -> usize {
        let image = self.cursor.current().image(side).to_string();
        self.store
            .delete_in_range(&image, corner_a.x, corner_b.x, corner_a.y, corner_b.y)
    }

    /// Replaces the session state with the contents of an images.txt
    /// file. The swap happens only after a successful parse; on failure
    /// the prior state is untouched.
    pub fn import_images_txt(&mut self, path: &Path) -> Result<ImportSummary, PairmarkError> {
        let imported = colmap::read_images_txt(path, self.cursor.images())?;

        let summary = ImportSummary {
            observations: imported.total_observations(),
            point3d_watermark: imported.point3d_watermark(),
        };
        self.store = imported;

        let next_active = self
            .store
            .max_feature_id()
            .map(|id| id.next())
            .unwrap_or(FeatureId::FIRST);
        self.cursor.set_active_feature(next_active);

        log::info!(
            "imported {} observation(s), 3D point watermark {}",
            summary.observations,
            summary.point3d_watermark
        );
        Ok(summary)
    }

    /// Writes the session state to an images.txt file.
    pub fn export_images_txt(&self, path: &Path) -> Result<ExportSummary, PairmarkError> {
        colmap::write_images_txt(path, &self.store)?;
        let summary = ExportSummary {
            images: self.store.image_names().count(),
        };
        log::info!("exported {} image(s) to {}", summary.images, path.display());
        Ok(summary)
    }

    fn image_extent(&mut self, image: &str) -> Result<Extent, PairmarkError> {
        if let Some(&(w, h)) = self.dims.get(image) {
            return Ok(Extent::of(w, h));
        }
        let (w, h) = self.probe.dimensions(image)?;
        self.dims.insert(image.to_string(), (w, h));
        Ok(Extent::of(w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(u32, u32);

    impl ImageProbe for FixedProbe {
        fn dimensions(&self, _image: &str) -> Result<(u32, u32), PairmarkError> {
            Ok((self.0, self.1))
        }
    }

    struct RefusingExtractor;

    impl DescriptorExtractor for RefusingExtractor {
        fn describe(&self, _image: &str, _x: f64, _y: f64) -> Option<DescriptorSample> {
            None
        }
    }

    fn session() -> Session {
        Session::new(
            vec!["a.png".into(), "b.png".into(), "c.png".into()],
            Box::new(FixedProbe(640, 480)),
            Box::new(FlatDescriptor),
        )
        .unwrap()
    }

    #[test]
    fn mark_on_both_sides_links_and_advances() {
        let mut s = session();
        assert_eq!(s.active_feature(), FeatureId(1));

        let left = s.mark(Side::Left, 10.0, 20.0).unwrap();
        assert_eq!(left, Point3dId(1));
        assert_eq!(s.active_feature(), FeatureId(1));

        let right = s.mark(Side::Right, 12.0, 21.0).unwrap();
        assert_eq!(right, Point3dId(1));
        // Correspondence complete on both members: active ID moved on.
        assert_eq!(s.active_feature(), FeatureId(2));
    }

    #[test]
    fn out_of_bounds_mark_is_rejected() {
        let mut s = session();
        let err = s.mark(Side::Left, 640.5, 10.0).unwrap_err();
        assert!(matches!(err, PairmarkError::CoordinateOutOfBounds { .. }));
        assert_eq!(s.store().total_observations(), 0);
    }

    #[test]
    fn descriptor_refusal_leaves_store_unmutated() {
        let mut s = Session::new(
            vec!["a.png".into(), "b.png".into()],
            Box::new(FixedProbe(640, 480)),
            Box::new(RefusingExtractor),
        )
        .unwrap();

        let err = s.mark(Side::Left, 10.0, 20.0).unwrap_err();
        assert!(matches!(err, PairmarkError::DescriptorUnavailable { .. }));
        assert_eq!(s.store().total_observations(), 0);
        assert_eq!(s.store().point3d_watermark(), 0);
    }

    #[test]
    fn annotate_maps_pointer_through_the_view_transform() {
        let mut s = session();
        s.set_zoom(1.0).unwrap();

        // 640x480 image in a 640x480 viewport: identity mapping.
        let viewport = Extent::new(640.0, 480.0);
        s.annotate(Side::Left, Coord::new(100.0, 200.0), viewport)
            .unwrap();

        let obs = s.store().observation("a.png", FeatureId(1)).unwrap();
        assert_eq!((obs.x, obs.y), (100.0, 200.0));
    }

    #[test]
    fn letterbox_margin_click_is_rejected() {
        let mut s = session();
        s.set_zoom(1.0).unwrap();

        // 640x480 image letterboxed into a 1000x480 viewport leaves 180px
        // margins; a click at x=10 lands left of the image.
        let err = s
            .annotate(Side::Left, Coord::new(10.0, 240.0), Extent::new(1000.0, 480.0))
            .unwrap_err();
        assert!(matches!(err, PairmarkError::CoordinateOutOfBounds { .. }));
    }

    #[test]
    fn delete_active_clears_both_members() {
        let mut s = session();
        s.mark(Side::Left, 10.0, 20.0).unwrap();
        s.mark(Side::Right, 11.0, 21.0).unwrap();

        // The auto-advance moved on; point back at the finished feature.
        s.set_active_feature(FeatureId(1));
        assert!(s.delete_active());
        assert!(!s.delete_active());
        assert_eq!(s.store().total_observations(), 0);
    }

    #[test]
    fn import_failure_keeps_prior_state() {
        let mut s = session();
        s.mark(Side::Left, 10.0, 20.0).unwrap();

        let err = s.import_images_txt(Path::new("/definitely/not/here.txt"));
        assert!(err.is_err());
        assert_eq!(s.store().total_observations(), 1);
        assert_eq!(s.active_feature(), FeatureId(1));
    }

    #[test]
    fn zoom_delegates_and_rejects() {
        let mut s = session();
        s.set_zoom(3.0).unwrap();
        assert!(s.set_zoom(500.0).is_err());
        assert_eq!(s.zoom(), 3.0);
    }
}
