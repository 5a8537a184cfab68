#![doc = "Areal-weighted redistribution of data between spatial partitions"]
mod common;
mod error;
mod geom;
mod mapping;
mod redistribute;
mod region;

#[doc(inline)]
pub use error::{ColumnMismatch, Error, Result};

#[doc(inline)]
pub use geom::Geometries;

#[doc(inline)]
pub use region::{GeoJsonDefinition, RawTable, Region, RegionDefinition, RegionOptions, RegionSource, Source, Transformed};

#[doc(inline)]
pub use mapping::{
    build_entries, centroid_distance, intersection_area,
    MappingEntry, MappingMethod, MappingStore, MappingTable, Precision, StoreConfig,
    DEFAULT_TEMPLATE, MAPPING_COLUMN, RATIO_COLUMN,
};

#[doc(inline)]
pub use redistribute::{
    normalize, validate, weighted_ratios,
    Aggregation, Mapping, OnConservationError, RedistributeOptions, Redistributor, Weighting,
    DEFAULT_TOLERANCE,
};

/// Tabular and GeoJSON input/output.
pub mod io {
    pub use crate::common::io::{read_csv_file, write_csv_file, RawFeature};
}
