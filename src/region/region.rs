use std::{collections::BTreeSet, sync::Arc, time::Duration};

use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{geom::Geometries, region::{cache::CacheSlot, RegionDefinition, RegionSource, Transformed}, Result};

/// Caching knobs for a `Region`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionOptions {
    /// Douglas-Peucker tolerance used for `geometry()`.
    pub simplify_tolerance: f64,
    /// How long full-precision polygons stay cached.
    pub raw_ttl: Duration,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self { simplify_tolerance: 1e-4, raw_ttl: Duration::from_secs(300) }
    }
}

/// Simplified geometry and metadata; computed once per instance.
#[derive(Debug)]
struct Loaded {
    geometry: Arc<Geometries>,
    metadata: DataFrame,
}

/// A partition backed by a `RegionDefinition`, with per-instance caches.
#[derive(Debug)]
pub struct Region<D> {
    definition: D,
    options: RegionOptions,
    loaded: CacheSlot<Loaded>,
    raw: CacheSlot<Geometries>,
}

impl<D: RegionDefinition> Region<D> {
    pub fn new(definition: D) -> Self {
        Self::with_options(definition, RegionOptions::default())
    }

    pub fn with_options(definition: D, options: RegionOptions) -> Self {
        Self {
            loaded: CacheSlot::new(None),
            raw: CacheSlot::new(Some(options.raw_ttl)),
            definition,
            options,
        }
    }

    #[inline] pub fn definition(&self) -> &D { &self.definition }

    #[inline] pub fn options(&self) -> &RegionOptions { &self.options }

    /// Name of the human-readable name column in `metadata()`.
    pub fn name_column(&self) -> String { format!("{}_name", self.definition.identify()) }

    /// Metadata table keyed by the region id column.
    pub fn metadata(&self) -> Result<DataFrame> {
        Ok(self.load()?.metadata.clone())
    }

    /// Drop every cached value; the next access reloads from source.
    pub fn clear_cache(&self) {
        self.loaded.clear();
        self.raw.clear();
    }

    fn load(&self) -> Result<Arc<Loaded>> {
        self.loaded.get_or_try_init(|| {
            let transformed = self.transformed()?;
            let raw = Arc::new(Geometries::new(transformed.ids, transformed.geometries)?);
            let geometry = Arc::new(raw.simplified(self.options.simplify_tolerance));
            self.raw.set(raw);
            Ok(Loaded { geometry, metadata: transformed.metadata })
        })
    }

    fn transformed(&self) -> Result<Transformed> {
        let transformed = self.definition.transform_raw(self.definition.raw_source().load()?)?;
        debug!(region = self.definition.identify(), units = transformed.ids.len(), "loaded region boundaries");
        Ok(transformed)
    }
}

impl<D: RegionDefinition> RegionSource for Region<D> {
    fn id(&self) -> &str { self.definition.identify() }

    fn ids(&self) -> Result<BTreeSet<String>> {
        Ok(self.geometry()?.id_set())
    }

    fn geometry(&self) -> Result<Arc<Geometries>> {
        Ok(Arc::clone(&self.load()?.geometry))
    }

    fn raw_geometry(&self) -> Result<Arc<Geometries>> {
        self.raw.get_or_try_init(|| {
            let transformed = self.transformed()?;
            Geometries::new(transformed.ids, transformed.geometries)
        })
    }
}
