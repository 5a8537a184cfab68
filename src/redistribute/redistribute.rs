use std::{fmt, str::FromStr, sync::Arc};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    mapping::{MappingMethod, MappingStore, MappingTable, Precision, MAPPING_COLUMN, RATIO_COLUMN},
    redistribute::{normalize, validate, weighted_ratios, OnConservationError, Weighting, DEFAULT_TOLERANCE},
    region::RegionSource,
    Error, Result,
};

/// Internal name of the ratio column while it sits next to user data.
const SCALE_COLUMN: &str = "__reapportion_ratio";

/// How redistributed values are combined within a target unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
    Count,
    Max,
    Min,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    fn expr(&self, column: &str) -> Result<Expr> {
        match self {
            Self::Sum => Ok(col(column).sum()),
            Self::Mean | Self::Count | Self::Max | Self::Min => {
                Err(Error::NotImplemented(format!("{} aggregation", self.as_str())))
            }
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            "count" => Ok(Self::Count),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            other => Err(Error::UnsupportedMethod(format!("Unknown aggregation: {other}"))),
        }
    }
}

/// Source of the mapping weights.
#[derive(Debug, Clone)]
pub enum Mapping {
    /// Build or read a mapping with this method through the store.
    Method(MappingMethod),
    /// Use a caller-supplied table holding the from-id, to-id and "mapping" columns.
    Table(DataFrame),
}

impl Default for Mapping {
    fn default() -> Self { Self::Method(MappingMethod::default()) }
}

impl From<MappingMethod> for Mapping {
    fn from(method: MappingMethod) -> Self { Self::Method(method) }
}

impl From<DataFrame> for Mapping {
    fn from(table: DataFrame) -> Self { Self::Table(table) }
}

/// Knobs for one `redistribute` call.
#[derive(Clone)]
pub struct RedistributeOptions {
    /// Columns carried through and grouped by alongside the target id.
    pub index_columns: Vec<String>,
    /// Intermediate partition to pass through first.
    pub via: Option<Arc<dyn RegionSource>>,
    pub weights: Option<Weighting>,
    pub mapping: Mapping,
    pub aggregation: Aggregation,
    pub precision: Precision,
    /// Persist freshly built mappings (full precision only).
    pub save: bool,
    pub on_conservation_error: OnConservationError,
    /// Relative tolerance on column totals.
    pub tolerance: f64,
}

impl Default for RedistributeOptions {
    fn default() -> Self {
        Self {
            index_columns: Vec::new(),
            via: None,
            weights: None,
            mapping: Mapping::default(),
            aggregation: Aggregation::default(),
            precision: Precision::default(),
            save: false,
            on_conservation_error: OnConservationError::default(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl fmt::Debug for RedistributeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedistributeOptions")
            .field("index_columns", &self.index_columns)
            .field("via", &self.via.as_ref().map(|via| via.id()))
            .field("weights", &self.weights)
            .field("mapping", &self.mapping)
            .field("aggregation", &self.aggregation)
            .field("precision", &self.precision)
            .field("save", &self.save)
            .field("on_conservation_error", &self.on_conservation_error)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl RedistributeOptions {
    pub fn with_index_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.index_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_via(mut self, via: Arc<dyn RegionSource>) -> Self {
        self.via = Some(via);
        self
    }

    pub fn with_weights(mut self, weights: Weighting) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_mapping(mut self, mapping: impl Into<Mapping>) -> Self {
        self.mapping = mapping.into();
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    pub fn with_on_conservation_error(mut self, mode: OnConservationError) -> Self {
        self.on_conservation_error = mode;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Moves data keyed by the units of one partition onto the units of another.
#[derive(Debug)]
pub struct Redistributor {
    store: MappingStore,
}

impl Redistributor {
    pub fn new(store: MappingStore) -> Self { Self { store } }

    #[inline] pub fn store(&self) -> &MappingStore { &self.store }

    /// Redistribute every data column of `data` from `region_from` to
    /// `region_to`. Data columns are all columns except the index columns
    /// and the two region id columns.
    pub fn redistribute(
        &self,
        data: &DataFrame,
        region_from: &dyn RegionSource,
        region_to: &dyn RegionSource,
        options: &RedistributeOptions,
    ) -> Result<DataFrame> {
        let from_id = region_from.id();
        let to_id = region_to.id();

        if data.column(from_id).is_err() {
            return Err(Error::Schema(format!("From region column {from_id:?} not found in data")));
        }
        if from_id == to_id {
            return Err(Error::InvalidConfiguration(format!("From and to region cannot be the same, both were {from_id:?}")));
        }
        if let Some(missing) = options.index_columns.iter().find(|name| data.column(name).is_err()) {
            return Err(Error::Schema(format!("Index column {missing:?} not found in data")));
        }

        let data_columns: Vec<String> = data.get_column_names_str().into_iter()
            .filter(|name| *name != from_id && *name != to_id && !options.index_columns.iter().any(|c| c == name))
            .map(str::to_string)
            .collect();
        if data_columns.is_empty() {
            return Err(Error::NoDataColumns(data.get_column_names_str().into_iter().map(str::to_string).collect()));
        }
        check_numeric(data, &data_columns)?;
        let aggregations = data_columns.iter()
            .map(|column| options.aggregation.expr(column))
            .collect::<Result<Vec<_>>>()?;

        if let Some(via) = &options.via {
            info!(from = from_id, via = via.id(), to = to_id, "redistributing through intermediate region");
            let first_hop = RedistributeOptions {
                via: None,
                on_conservation_error: OnConservationError::default(),
                ..options.clone()
            };
            let intermediate = self.redistribute(data, region_from, via.as_ref(), &first_hop)?;
            let second_hop = RedistributeOptions { via: None, ..options.clone() };
            return self.redistribute(&intermediate, via.as_ref(), region_to, &second_hop);
        }

        let ratios = self.ratios(region_from, region_to, options)?;
        let combined = combine(data, from_id, to_id, &options.index_columns, &data_columns, ratios)?;

        let mut keys = vec![col(to_id)];
        keys.extend(options.index_columns.iter().map(|c| col(c.as_str())));
        let result = combined.lazy()
            .group_by_stable(keys)
            .agg(aggregations)
            .collect()?;
        debug!(from = from_id, to = to_id, rows = result.height(), "aggregated redistributed data");

        validate(data, &result, &data_columns, options.tolerance, options.on_conservation_error)?;
        Ok(result)
    }

    /// Ratio table with columns `(from id, to id, "ratio")`.
    fn ratios(
        &self,
        region_from: &dyn RegionSource,
        region_to: &dyn RegionSource,
        options: &RedistributeOptions,
    ) -> Result<DataFrame> {
        let (from_id, to_id) = (region_from.id(), region_to.id());
        let mapping = match &options.mapping {
            Mapping::Table(table) => MappingTable::from_frame(table, from_id, to_id)?,
            Mapping::Method(method) => {
                self.store.get(region_from, region_to, *method, options.precision, options.save, false)?
            }
        };

        let ratios = match options.weights {
            None => normalize(mapping.to_frame()?, from_id, MAPPING_COLUMN)?,
            Some(weighting) => {
                let weights = weighting.weight_table(region_from)?;
                weighted_ratios(mapping.to_frame()?, from_id, to_id, &weights, weighting.as_str())?
            }
        };
        Ok(ratios.select([from_id, to_id, RATIO_COLUMN])?)
    }
}

/// Data columns are scaled by ratios, so they must be numeric.
fn check_numeric(data: &DataFrame, data_columns: &[String]) -> Result<()> {
    for name in data_columns {
        let dtype = data.column(name)?.dtype();
        if !dtype.is_primitive_numeric() {
            return Err(Error::Schema(format!(
                "Data column {name:?} has non-numeric type {dtype}; list it as an index column or drop it"
            )));
        }
    }
    Ok(())
}

/// Join data to ratios on the from id and scale every data column.
fn combine(
    data: &DataFrame,
    from_id: &str,
    to_id: &str,
    index_columns: &[String],
    data_columns: &[String],
    ratios: DataFrame,
) -> Result<DataFrame> {
    let ratios = ratios.lazy().select([
        col(from_id),
        col(to_id),
        col(RATIO_COLUMN).alias(SCALE_COLUMN),
    ]);

    let mut selected = vec![col(from_id).cast(DataType::String)];
    selected.extend(index_columns.iter().map(|c| col(c.as_str())));
    selected.extend(data_columns.iter().map(|c| col(c.as_str()).cast(DataType::Float64)));

    let scaled: Vec<Expr> = data_columns.iter()
        .map(|c| col(c.as_str()) * col(SCALE_COLUMN))
        .collect();

    Ok(data.clone().lazy()
        .select(selected)
        .join(
            ratios,
            [col(from_id)],
            [col(from_id)],
            JoinArgs { maintain_order: MaintainOrderJoin::LeftRight, ..JoinArgs::new(JoinType::Inner) },
        )
        .with_columns(scaled)
        .collect()?)
}
