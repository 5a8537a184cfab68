pub mod mapping;
pub mod redistribute;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use reapportion::{GeoJsonDefinition, MappingStore, Region, RegionSource, StoreConfig};

use crate::cli::StoreArgs;

/// Parse an `ID=GEOJSON` argument into a region whose unit ids are read
/// from the property named ID.
pub fn parse_region(arg: &str) -> Result<Arc<dyn RegionSource>> {
    let Some((id, path)) = arg.split_once('=') else {
        bail!("expected ID=GEOJSON, got {arg:?}");
    };
    if id.is_empty() || path.is_empty() {
        bail!("expected ID=GEOJSON, got {arg:?}");
    }
    Ok(Arc::new(Region::new(GeoJsonDefinition::from_file(id, PathBuf::from(path)))))
}

/// Open the mapping store from --config and/or --cache.
pub fn open_store(args: &StoreArgs) -> Result<MappingStore> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("reading store config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(root) = &args.cache {
        config.root = root.clone();
    }
    Ok(MappingStore::new(config))
}
