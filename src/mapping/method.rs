use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// How mapping weights between two partitions are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMethod {
    /// Planar area of the intersection of each pair of units.
    #[default]
    IntersectionArea,
    /// Declared but not implemented.
    CentroidDistance,
}

impl MappingMethod {
    /// Name used in cache paths and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntersectionArea => "intersection_area",
            Self::CentroidDistance => "centroid_distance",
        }
    }
}

impl fmt::Display for MappingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intersection_area" => Ok(Self::IntersectionArea),
            "centroid_distance" => Ok(Self::CentroidDistance),
            other => Err(Error::UnsupportedMethod(format!("Unknown mapping method: {other}"))),
        }
    }
}
