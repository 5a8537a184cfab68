#![allow(dead_code)]

use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use polars::prelude::*;
use reapportion::{io::RawFeature, GeoJsonDefinition, Geometries, Region, RegionSource, Result};
use serde_json::{json, Map};

pub fn poly(points: &[(f64, f64)]) -> MultiPolygon<f64> {
    let ring: Vec<Coord<f64>> = points.iter().map(|&(x, y)| Coord { x, y }).collect();
    MultiPolygon(vec![Polygon::new(LineString(ring), vec![])])
}

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    poly(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)])
}

/// Region whose unit ids live in the property named after the region.
pub fn region(id: &str, units: Vec<(&str, MultiPolygon<f64>)>) -> Arc<dyn RegionSource> {
    let features = units.into_iter().map(|(unit, shape)| {
        let mut properties = Map::new();
        properties.insert(id.to_string(), json!(unit));
        RawFeature::new(properties, shape)
    }).collect();
    Arc::new(Region::new(GeoJsonDefinition::from_features(id, features)))
}

/// One unit "main" covering (-4,-4)..(4,4), area 64.
pub fn square() -> Arc<dyn RegionSource> {
    region("square", vec![("main", rect(-4.0, -4.0, 4.0, 4.0))])
}

pub fn quadrants() -> Arc<dyn RegionSource> {
    region("quadrant", vec![
        ("M", rect(-4.0, 0.0, 0.0, 4.0)),
        ("N", rect(0.0, 0.0, 4.0, 4.0)),
        ("O", rect(-4.0, -4.0, 0.0, 0.0)),
        ("P", rect(0.0, -4.0, 4.0, 0.0)),
    ])
}

/// A lies inside the square; B and C stick half out on either side.
pub fn triangles() -> Arc<dyn RegionSource> {
    region("triangle", vec![
        ("A", poly(&[(-4.0, -4.0), (0.0, 4.0), (4.0, -4.0), (-4.0, -4.0)])),
        ("B", poly(&[(-4.0, -4.0), (-8.0, 4.0), (0.0, 4.0), (-4.0, -4.0)])),
        ("C", poly(&[(4.0, -4.0), (0.0, 4.0), (8.0, 4.0), (4.0, -4.0)])),
    ])
}

pub fn halves() -> Arc<dyn RegionSource> {
    region("half", vec![
        ("L", rect(-4.0, -4.0, 0.0, 4.0)),
        ("R", rect(0.0, -4.0, 4.0, 4.0)),
    ])
}

/// A strip overlapping the right quarter of the square.
pub fn far_right() -> Arc<dyn RegionSource> {
    region("strip", vec![("FR", rect(2.0, -4.0, 10.0, 4.0))])
}

pub fn square_data(value: f64) -> DataFrame {
    df! { "square" => ["main"], "data" => [value] }.unwrap()
}

/// Value of `column` per key of `key_column`; the null key maps to `None`.
pub fn values_by_key(df: &DataFrame, key_column: &str, column: &str) -> Vec<(Option<String>, f64)> {
    let keys = df.column(key_column).unwrap().str().unwrap().clone();
    let values = df.column(column).unwrap().f64().unwrap().clone();
    let mut out: Vec<(Option<String>, f64)> = keys.into_iter()
        .zip(values.into_iter())
        .map(|(k, v)| (k.map(str::to_string), v.unwrap()))
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

pub fn assert_values(actual: &[(Option<String>, f64)], expected: &[(Option<&str>, f64)]) {
    assert_eq!(actual.len(), expected.len(), "got {actual:?}, expected {expected:?}");
    let mut expected: Vec<(Option<String>, f64)> = expected.iter()
        .map(|(k, v)| (k.map(str::to_string), *v))
        .collect();
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    for ((ak, av), (ek, ev)) in actual.iter().zip(&expected) {
        assert_eq!(ak, ek, "got {actual:?}, expected {expected:?}");
        assert!((av - ev).abs() < 1e-6, "{ak:?}: got {av}, expected {ev}");
    }
}

/// Wraps a region and counts geometry fetches.
pub struct CountingRegion {
    inner: Arc<dyn RegionSource>,
    pub fetches: AtomicUsize,
}

impl CountingRegion {
    pub fn new(inner: Arc<dyn RegionSource>) -> Self {
        Self { inner, fetches: AtomicUsize::new(0) }
    }

    pub fn fetches(&self) -> usize { self.fetches.load(Ordering::SeqCst) }
}

impl RegionSource for CountingRegion {
    fn id(&self) -> &str { self.inner.id() }

    fn ids(&self) -> Result<std::collections::BTreeSet<String>> { self.inner.ids() }

    fn geometry(&self) -> Result<Arc<Geometries>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.geometry()
    }

    fn raw_geometry(&self) -> Result<Arc<Geometries>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.raw_geometry()
    }
}

