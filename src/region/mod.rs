mod cache;
mod geojson;
mod region;
mod source;

pub use geojson::GeoJsonDefinition;
pub use region::{Region, RegionOptions};
pub use source::{RawTable, RegionDefinition, RegionSource, Source, Transformed};
