mod csv;
mod geojson;
#[cfg(feature = "parquet")]
mod parquet;

pub use csv::{read_csv_file, write_csv_file};
pub(crate) use csv::{read_csv_bytes, write_csv_bytes};
pub use geojson::RawFeature;
pub(crate) use geojson::read_geojson_file;
#[cfg(feature = "parquet")]
pub(crate) use parquet::*;
