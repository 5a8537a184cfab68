mod build;
mod method;
mod store;
mod table;

pub use build::{build_entries, centroid_distance, intersection_area};
pub use method::MappingMethod;
pub use store::{MappingStore, Precision, StoreConfig, DEFAULT_TEMPLATE};
pub use table::{MappingEntry, MappingTable, MAPPING_COLUMN, RATIO_COLUMN};
