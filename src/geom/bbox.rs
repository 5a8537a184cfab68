use geo::Rect;
use rstar::{RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a unit by index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize, // Index of corresponding unit in Geometries
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(crate) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Get the index of the corresponding unit.
    pub(crate) fn idx(&self) -> usize { self.idx }

    /// Convert a rectangle into an R-tree query envelope.
    pub(crate) fn envelope_of(rect: &Rect<f64>) -> AABB<[f64; 2]> {
        AABB::from_corners(rect.min().into(), rect.max().into())
    }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        Self::envelope_of(&self.bbox)
    }
}
