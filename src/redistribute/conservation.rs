use std::{fmt, str::FromStr};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{error::describe, ColumnMismatch, Error, Result};

/// Default relative tolerance on column totals.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// What to do when totals are not conserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnConservationError {
    /// Fail with `Error::ConservationViolation`.
    #[default]
    Raise,
    /// Log a warning and keep the result.
    Warn,
}

impl fmt::Display for OnConservationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raise => "raise",
            Self::Warn => "warn",
        })
    }
}

impl FromStr for OnConservationError {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raise" => Ok(Self::Raise),
            "warn" | "warning" => Ok(Self::Warn),
            other => Err(Error::UnsupportedMethod(format!("Unknown conservation policy: {other}"))),
        }
    }
}

/// Compare the total of each column in `before` and `after`. Returns the
/// offending columns; under `Raise` any offence is an error instead.
pub fn validate(
    before: &DataFrame,
    after: &DataFrame,
    columns: &[String],
    tolerance: f64,
    mode: OnConservationError,
) -> Result<Vec<ColumnMismatch>> {
    let mut mismatches = Vec::new();
    for column in columns {
        let before_total = column_total(before, column)?;
        let after_total = column_total(after, column)?;
        if !conserved(before_total, after_total, tolerance) {
            mismatches.push(ColumnMismatch { column: column.clone(), before: before_total, after: after_total });
        }
    }

    if mismatches.is_empty() { return Ok(mismatches) }

    match mode {
        OnConservationError::Raise => Err(Error::ConservationViolation(mismatches)),
        OnConservationError::Warn => {
            warn!("Found differences in input and output data while redistributing.{}", describe(&mismatches));
            Ok(mismatches)
        }
    }
}

fn column_total(df: &DataFrame, column: &str) -> Result<f64> {
    let values = df.column(column)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.sum().unwrap_or(0.0))
}

/// A zero input total is only matched by an output total within `tolerance`
/// of zero.
fn conserved(before: f64, after: f64, tolerance: f64) -> bool {
    if before == 0.0 {
        return after.abs() <= tolerance;
    }
    let ratio = after / before;
    ratio.is_finite() && ratio >= 1.0 - tolerance && ratio <= 1.0 + tolerance
}
