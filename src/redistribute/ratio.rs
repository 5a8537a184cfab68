use std::{fmt, str::FromStr};

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{mapping::{MAPPING_COLUMN, RATIO_COLUMN}, region::RegionSource, Error, Result};

const DISTRIBUTED_WEIGHT_COLUMN: &str = "distributed_weight";

/// Add a `ratio` column: `weight_column` divided by its total over
/// `group_key`. Groups whose total is zero get ratio 0.
pub fn normalize(table: DataFrame, group_key: &str, weight_column: &str) -> Result<DataFrame> {
    let total = col(weight_column).sum().over([col(group_key)]);
    Ok(table.lazy()
        .with_column(
            when(total.clone().eq(lit(0.0)))
                .then(lit(0.0))
                .otherwise(col(weight_column).cast(DataType::Float64) / total)
                .alias(RATIO_COLUMN)
        )
        .collect()?)
}

/// Two-stage ratios for an external per-source-unit signal: split each
/// source unit's `weight_column` value over its targets by mapping weight,
/// then normalize the distributed weights per target unit.
///
/// `weights` must hold the `from_id` column and `weight_column`.
pub fn weighted_ratios(
    mapping: DataFrame,
    from_id: &str,
    to_id: &str,
    weights: &DataFrame,
    weight_column: &str,
) -> Result<DataFrame> {
    if weights.column(from_id).is_err() || weights.column(weight_column).is_err() {
        return Err(Error::Schema(format!(
            "Weight table must contain columns {from_id:?} and {weight_column:?}, it has {:?}",
            weights.get_column_names_str(),
        )));
    }

    let weights = weights.clone().lazy().select([
        col(from_id).cast(DataType::String),
        col(weight_column).cast(DataType::Float64),
    ]);
    let distributed = normalize(mapping, from_id, MAPPING_COLUMN)?
        .lazy()
        .join(weights, [col(from_id)], [col(from_id)], JoinArgs::new(JoinType::Inner))
        .select([
            col(from_id),
            col(to_id),
            (col(weight_column) * col(RATIO_COLUMN)).alias(DISTRIBUTED_WEIGHT_COLUMN),
        ])
        .collect()?;

    normalize(distributed, to_id, DISTRIBUTED_WEIGHT_COLUMN)
}

/// External signals that can re-weight a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    Population,
}

impl Weighting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Population => "population",
        }
    }

    /// Per-unit signal for `region`, keyed by the region id column with the
    /// values in a column named after the signal.
    pub fn weight_table(&self, region: &dyn RegionSource) -> Result<DataFrame> {
        match self {
            Self::Population => Err(Error::NotImplemented(format!(
                "population weights for region {:?}", region.id()
            ))),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weighting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "population" => Ok(Self::Population),
            other => Err(Error::UnsupportedMethod(format!("Unknown weight: {other}"))),
        }
    }
}
