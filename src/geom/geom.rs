use std::collections::BTreeSet;

use geo::{Area, BoundingRect, Coord, MultiPolygon, Rect, Simplify};
use rstar::{RTree, AABB};

use crate::{geom::BoundingBox, Error, Result};

/// The units of one partition: identifiers, polygons, cached areas, and an
/// R-tree over bounding boxes for candidate lookups.
#[derive(Debug, Clone)]
pub struct Geometries {
    ids: Vec<String>,
    shapes: Vec<MultiPolygon<f64>>,
    areas: Vec<f64>,
    rtree: RTree<BoundingBox>,
}

impl Geometries {
    /// Construct a Geometries object from parallel vectors of ids and shapes.
    /// Empty shapes have no bounding box and are never returned by `query`.
    pub fn new(ids: Vec<String>, shapes: Vec<MultiPolygon<f64>>) -> Result<Self> {
        if ids.len() != shapes.len() {
            return Err(Error::InvalidGeometry(format!(
                "got {} unit ids but {} shapes", ids.len(), shapes.len()
            )));
        }
        Ok(Self::from_parts(ids, shapes))
    }

    fn from_parts(ids: Vec<String>, shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            areas: shapes.iter().map(|shape| shape.unsigned_area()).collect(),
            ids,
            shapes,
        }
    }

    /// Get the number of units.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no units.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get the list of unit ids, in unit order.
    #[inline] pub fn ids(&self) -> &[String] { &self.ids }

    /// Get the list of unit shapes, in unit order.
    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get the id of unit `i`.
    #[inline] pub fn id(&self, i: usize) -> &str { &self.ids[i] }

    /// Get the shape of unit `i`.
    #[inline] pub fn shape(&self, i: usize) -> &MultiPolygon<f64> { &self.shapes[i] }

    /// Get the planar area of unit `i`.
    #[inline] pub fn area(&self, i: usize) -> f64 { self.areas[i] }

    /// Sum of all unit areas.
    #[inline] pub fn total_area(&self) -> f64 { self.areas.iter().sum() }

    /// Unit ids as an ordered set.
    pub fn id_set(&self) -> BTreeSet<String> { self.ids.iter().cloned().collect() }

    /// Query the R-tree for units whose bounding boxes intersect the envelope.
    #[inline]
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> + '_ {
        self.rtree.locate_in_envelope_intersecting(envelope).map(|bb| bb.idx())
    }

    /// Indices of units whose bounding boxes intersect the bounding box of `shape`.
    pub(crate) fn candidates(&self, shape: &MultiPolygon<f64>) -> Vec<usize> {
        match shape.bounding_rect() {
            Some(rect) => self.query(&BoundingBox::envelope_of(&rect)).collect(),
            None => Vec::new(),
        }
    }

    /// Compute the bounding rectangle of all units.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|shape| shape.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Douglas-Peucker simplification of every unit with the given tolerance.
    pub fn simplified(&self, tolerance: f64) -> Self {
        if tolerance <= 0.0 { return self.clone() }
        Self::from_parts(
            self.ids.clone(),
            self.shapes.iter().map(|shape| shape.simplify(&tolerance)).collect(),
        )
    }
}
