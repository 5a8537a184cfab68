use std::collections::BTreeMap;

use polars::prelude::*;

use crate::{Error, Result};

/// Name of the weight column in every mapping table.
pub const MAPPING_COLUMN: &str = "mapping";

/// Name of the normalized weight column added by `normalize`.
pub const RATIO_COLUMN: &str = "ratio";

/// One weighted link between a source unit and a target unit. `None` on
/// either side stands for the gap outside the other partition.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub unit_from: Option<String>,
    pub unit_to: Option<String>,
    pub weight: f64,
}

impl MappingEntry {
    pub fn new(unit_from: Option<String>, unit_to: Option<String>, weight: f64) -> Self {
        Self { unit_from, unit_to, weight }
    }
}

/// The weights linking the units of `region_from` to the units of `region_to`.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingTable {
    region_from: String,
    region_to: String,
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    /// Build a table; entries without positive weight are dropped.
    pub fn new(region_from: impl Into<String>, region_to: impl Into<String>, entries: Vec<MappingEntry>) -> Self {
        Self {
            region_from: region_from.into(),
            region_to: region_to.into(),
            entries: entries.into_iter().filter(|e| e.weight > 0.0).collect(),
        }
    }

    #[inline] pub fn region_from(&self) -> &str { &self.region_from }

    #[inline] pub fn region_to(&self) -> &str { &self.region_to }

    #[inline] pub fn entries(&self) -> &[MappingEntry] { &self.entries }

    #[inline] pub fn len(&self) -> usize { self.entries.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The same links seen from the other side.
    pub fn reversed(&self) -> Self {
        Self {
            region_from: self.region_to.clone(),
            region_to: self.region_from.clone(),
            entries: self.entries.iter()
                .map(|e| MappingEntry::new(e.unit_to.clone(), e.unit_from.clone(), e.weight))
                .collect(),
        }
    }

    /// Total weight per real source unit.
    pub fn weight_by_from(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for entry in &self.entries {
            if let Some(unit) = &entry.unit_from {
                *totals.entry(unit.clone()).or_insert(0.0) += entry.weight;
            }
        }
        totals
    }

    /// Total weight per real target unit.
    pub fn weight_by_to(&self) -> BTreeMap<String, f64> {
        self.reversed().weight_by_from()
    }

    /// Tabular form with columns `(region_from, region_to, "mapping")`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let from: Vec<Option<&str>> = self.entries.iter().map(|e| e.unit_from.as_deref()).collect();
        let to: Vec<Option<&str>> = self.entries.iter().map(|e| e.unit_to.as_deref()).collect();
        let weight: Vec<f64> = self.entries.iter().map(|e| e.weight).collect();

        Ok(DataFrame::new(vec![
            Series::new(self.region_from.as_str().into(), from).into(),
            Series::new(self.region_to.as_str().into(), to).into(),
            Series::new(MAPPING_COLUMN.into(), weight).into(),
        ])?)
    }

    /// Read a table from any frame holding the columns
    /// `(region_from, region_to, "mapping")`; other columns are ignored.
    /// Ids are compared as strings and weights as floats.
    pub fn from_frame(df: &DataFrame, region_from: &str, region_to: &str) -> Result<Self> {
        let missing: Vec<&str> = [region_from, region_to, MAPPING_COLUMN].into_iter()
            .filter(|name| df.column(name).is_err())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Schema(format!(
                "Mapping table must contain columns {:?}, missing {missing:?}",
                [region_from, region_to, MAPPING_COLUMN],
            )));
        }

        let from = df.column(region_from)?.cast(&DataType::String)?;
        let to = df.column(region_to)?.cast(&DataType::String)?;
        let weight = df.column(MAPPING_COLUMN)?.cast(&DataType::Float64)?;

        let entries = from.str()?.into_iter()
            .zip(to.str()?.into_iter())
            .zip(weight.f64()?.into_iter())
            .map(|((f, t), w)| MappingEntry::new(f.map(str::to_string), t.map(str::to_string), w.unwrap_or(0.0)))
            .collect();

        Ok(Self::new(region_from, region_to, entries))
    }
}
