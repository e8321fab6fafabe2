//! Newtype IDs for correspondence identity.
//!
//! Using newtypes prevents accidentally mixing up the two kinds of
//! identifiers that flow through the store (e.g., passing a feature ID
//! where a 3D point ID is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names one correspondence within the annotation session.
///
/// A feature ID is unique within a single image's observation set; the
/// same value on two different images asserts that both observations
/// depict the same scene point.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u32);

impl FeatureId {
    /// The ID a fresh session starts annotating with.
    pub const FIRST: FeatureId = FeatureId(1);

    /// Creates a new FeatureId.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// The next feature ID in sequence.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureId({})", self.0)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Links 2D observations across images to one conceptual 3D point.
///
/// Carries no coordinate itself. The sentinel [`Point3dId::UNRESOLVED`]
/// (-1) marks an observation with no cross-image link yet; values ≤ 0
/// never participate in the store's allocation watermark.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Point3dId(pub i64);

impl Point3dId {
    /// Sentinel for "no cross-image link".
    pub const UNRESOLVED: Point3dId = Point3dId(-1);

    /// Creates a new Point3dId.
    #[inline]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying i64 value.
    #[inline]
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// True when this observation is linked to an allocated 3D point.
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for Point3dId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point3dId({})", self.0)
    }
}

impl fmt::Display for Point3dId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
