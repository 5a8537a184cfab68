use std::{collections::BTreeSet, path::PathBuf, sync::Arc};

use geo::MultiPolygon;
use polars::frame::DataFrame;

use crate::{common::io::{read_geojson_file, RawFeature}, geom::Geometries, Result};

/// Read-only access to one partition: its id, its unit ids, and its unit
/// polygons at two precisions.
pub trait RegionSource: Send + Sync {
    /// Identifier of the partition; also the join-key column name.
    fn id(&self) -> &str;

    /// Set of unit identifiers.
    fn ids(&self) -> Result<BTreeSet<String>>;

    /// Simplified unit polygons.
    fn geometry(&self) -> Result<Arc<Geometries>>;

    /// Full-precision unit polygons.
    fn raw_geometry(&self) -> Result<Arc<Geometries>>;
}

/// Where the raw boundaries of a region come from.
#[derive(Debug, Clone)]
pub enum Source {
    GeoJson(PathBuf),
    Features(Arc<[RawFeature]>),
}

impl Source {
    /// Load every raw feature.
    pub fn load(&self) -> Result<RawTable> {
        match self {
            Source::GeoJson(path) => read_geojson_file(path),
            Source::Features(features) => Ok(features.to_vec()),
        }
    }
}

/// Raw features as loaded from a `Source`.
pub type RawTable = Vec<RawFeature>;

/// A raw table transformed into canonical form: one id and one polygon per
/// unit, plus a metadata table keyed by the region id column.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub ids: Vec<String>,
    pub geometries: Vec<MultiPolygon<f64>>,
    pub metadata: DataFrame,
}

/// Describes how to obtain and canonicalize the boundaries of one partition.
/// `Region<D>` turns any definition into a cached `RegionSource`.
pub trait RegionDefinition: Send + Sync {
    /// Region id, e.g. "sa1_2021".
    fn identify(&self) -> &str;

    /// Where to load raw features from.
    fn raw_source(&self) -> Source;

    /// Turn raw features into ids, polygons, and metadata.
    fn transform_raw(&self, raw: RawTable) -> Result<Transformed>;
}
