//! Pair traversal over the ordered image sequence.
//!
//! Annotation always happens on a window of two adjacent images. The
//! cursor owns the window position plus the active feature ID, and on
//! every forward step recomputes that ID so the operator lands on the
//! most useful correspondence: the one started on the new left image but
//! not yet finished on the right.

use crate::error::PairmarkError;
use crate::store::{AnnotationStore, FeatureId, PairWindow};

/// Walks the filename-sorted image sequence one adjacent pair at a time.
#[derive(Clone, Debug)]
pub struct PairCursor {
    images: Vec<String>,
    index: usize,
    active: FeatureId,
}

impl PairCursor {
    /// Creates a cursor over `images`, sorted by filename. Fewer than two
    /// images cannot form a pair and is reported as a configuration
    /// error.
    pub fn new(mut images: Vec<String>) -> Result<Self, PairmarkError> {
        if images.len() < 2 {
            return Err(PairmarkError::TooFewImages {
                count: images.len(),
            });
        }
        images.sort();
        Ok(Self {
            images,
            index: 0,
            active: FeatureId::FIRST,
        })
    }

    /// The full image sequence in order.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Index of the pair window's left image.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The two images currently exposed for annotation.
    pub fn current(&self) -> PairWindow {
        PairWindow::new(
            self.images[self.index].as_str(),
            self.images[self.index + 1].as_str(),
        )
    }

    pub fn active_feature(&self) -> FeatureId {
        self.active
    }

    pub fn set_active_feature(&mut self, id: FeatureId) {
        self.active = id;
    }

    pub fn at_last_pair(&self) -> bool {
        self.index + 2 >= self.images.len()
    }

    /// Shifts the window one image forward and recomputes the active
    /// feature ID for the new pair. Returns `None` (and moves nothing)
    /// when the window already sits on the last adjacent pair.
    ///
    /// The recomputed ID is the smallest feature present on the new left
    /// image but absent on the new right — an incomplete correspondence
    /// to finish first. When every left feature already has its right
    /// counterpart the ID continues past the largest one, and an
    /// unannotated left image starts over at 1.
    pub fn advance(&mut self, store: &AnnotationStore) -> Option<PairWindow> {
        if self.at_last_pair() {
            log::info!("already at the last image pair");
            return None;
        }

        let new_left = &self.images[self.index + 1];
        let new_right = &self.images[self.index + 2];
        self.active = next_feature_for_pair(store, new_left, new_right);
        self.index += 1;
        Some(self.current())
    }

    /// Shifts the window one image back, leaving the active feature ID
    /// untouched. Returns `None` (and moves nothing) at the first pair.
    pub fn retreat(&mut self) -> Option<PairWindow> {
        if self.index == 0 {
            log::info!("already at the first image pair");
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }
}

fn next_feature_for_pair(store: &AnnotationStore, left: &str, right: &str) -> FeatureId {
    let mut newest = None;
    for id in store.feature_ids(left) {
        if !store.has_observation(right, id) {
            return id;
        }
        newest = Some(id);
    }
    match newest {
        Some(id) => id.next(),
        None => FeatureId::FIRST,
    }
}
