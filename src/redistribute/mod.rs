mod conservation;
mod ratio;
mod redistribute;

pub use conservation::{validate, OnConservationError, DEFAULT_TOLERANCE};
pub use ratio::{normalize, weighted_ratios, Weighting};
pub use redistribute::{Aggregation, Mapping, RedistributeOptions, Redistributor};
