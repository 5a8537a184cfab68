use std::fmt::Write;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Totals of one data column before and after a redistribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMismatch {
    pub column: String,
    pub before: f64,
    pub after: f64,
}

impl ColumnMismatch {
    /// Ratio of the redistributed total to the input total, `None` when the
    /// input total is zero.
    pub fn ratio(&self) -> Option<f64> {
        (self.before != 0.0).then(|| self.after / self.before)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("No data columns left to redistribute in {0:?}")]
    NoDataColumns(Vec<String>),

    #[error("Found differences in input and output data while redistributing.{}", describe(.0))]
    ConservationViolation(Vec<ColumnMismatch>),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One line per offending column, matching the wording logged in warn mode.
pub(crate) fn describe(mismatches: &[ColumnMismatch]) -> String {
    let mut out = String::new();
    for m in mismatches {
        let _ = write!(out, "\nMismatch in data for column: {:?}. From: {} -> To: {}", m.column, m.before, m.after);
    }
    out
}
