//! Zoom and letterbox mapping between image pixels and the render surface.
//!
//! A displayed image is first scaled by the operator's zoom factor, then
//! uniformly fitted into whatever rectangle the presentation layer
//! allocated, preserving aspect ratio and centering the slack on the
//! non-fitting axis. [`ViewTransform`] owns the zoom factor and performs
//! the forward mapping plus its sub-pixel inverse for pointer events.

use std::fmt;
use std::marker::PhantomData;

use crate::error::PairmarkError;

/// Smallest accepted zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest accepted zoom factor, matching the 0.01-pixel precision floor
/// of the export format.
pub const MAX_ZOOM: f64 = 100.0;

/// Zoom a fresh session starts with.
pub const DEFAULT_ZOOM: f64 = 2.0;

/// Slack tolerated just outside the image rectangle when deciding whether
/// a mapped pointer position still counts as a hit.
pub const BOUNDS_EPSILON: f64 = 0.01;

/// Marker type for native image pixel coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSpace {}

/// Marker type for render-surface coordinates, relative to the viewport
/// origin.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewSpace {}

/// A 2D position with a type-level marker for its coordinate space, so
/// image-pixel and render-surface values cannot be accidentally mixed.
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }
}

impl<TSpace> fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

/// Width and height of a rectangle, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Converts probed integer dimensions.
    pub fn of(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
        }
    }
}

/// The zoom state plus the pixel-space math mapping image coordinates to
/// the render surface and back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    zoom: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { zoom: DEFAULT_ZOOM }
    }
}

impl ViewTransform {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Accepts a new zoom factor, or rejects it and keeps the previous
    /// one when the request is non-finite or outside
    /// [[`MIN_ZOOM`], [`MAX_ZOOM`]].
    pub fn set_zoom(&mut self, requested: f64) -> Result<(), PairmarkError> {
        if !requested.is_finite() || !(MIN_ZOOM..=MAX_ZOOM).contains(&requested) {
            return Err(PairmarkError::ZoomOutOfRange {
                requested,
                min: MIN_ZOOM,
                max: MAX_ZOOM,
            });
        }
        self.zoom = requested;
        Ok(())
    }

    /// Maps a native image pixel position to render-surface coordinates
    /// under the current zoom and the letterbox fit of the zoomed image
    /// into `viewport`.
    pub fn to_view(
        &self,
        p: Coord<ImageSpace>,
        image: Extent,
        viewport: Extent,
    ) -> Coord<ViewSpace> {
        let (scale, offset_x, offset_y) = self.letterbox(image, viewport);
        Coord::new(
            p.x * self.zoom * scale + offset_x,
            p.y * self.zoom * scale + offset_y,
        )
    }

    /// Maps a pointer position relative to the viewport origin back to
    /// native image pixels, rounded to two decimal places.
    pub fn to_image(
        &self,
        p: Coord<ViewSpace>,
        image: Extent,
        viewport: Extent,
    ) -> Coord<ImageSpace> {
        let (scale, offset_x, offset_y) = self.letterbox(image, viewport);
        let x = (p.x - offset_x) / scale / self.zoom;
        let y = (p.y - offset_y) / scale / self.zoom;
        Coord::new(round2(x), round2(y))
    }

    /// Uniform letterbox scale and the centering offsets for the zoomed
    /// image inside `viewport`.
    fn letterbox(&self, image: Extent, viewport: Extent) -> (f64, f64, f64) {
        let zoomed_w = image.width * self.zoom;
        let zoomed_h = image.height * self.zoom;
        let scale = (viewport.width / zoomed_w).min(viewport.height / zoomed_h);
        let offset_x = (viewport.width - zoomed_w * scale) / 2.0;
        let offset_y = (viewport.height - zoomed_h * scale) / 2.0;
        (scale, offset_x, offset_y)
    }
}

/// Whether a mapped position counts as a hit on the image, tolerating
/// [`BOUNDS_EPSILON`] outside the pixel rectangle. Pointer events landing
/// in the letterbox margin fail this test.
pub fn within_bounds(p: Coord<ImageSpace>, image: Extent) -> bool {
    -BOUNDS_EPSILON <= p.x && p.x <= image.width && -BOUNDS_EPSILON <= p.y && p.y <= image.height
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
