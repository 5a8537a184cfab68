use std::{collections::HashMap, fmt, fs, path::{Path, PathBuf}, str::FromStr, sync::{Arc, Mutex, MutexGuard}};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    common::{io::{read_csv_bytes, write_csv_bytes}, write_atomic},
    mapping::{build_entries, MappingMethod, MappingTable},
    region::RegionSource,
    Error, Result,
};

/// Default cache layout: one directory per method, one file per region pair.
pub const DEFAULT_TEMPLATE: &str = "{method}/{region_a}__{region_b}.parquet";

/// Which geometry a mapping may be built from, or whether it may only be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precision {
    /// Only read a stored mapping; never build.
    #[default]
    CacheOnly,
    /// Build from simplified polygons.
    Simplified,
    /// Build from full-precision polygons.
    Full,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheOnly => "cache-only",
            Self::Simplified => "simplified",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "cache-only" => Ok(Self::CacheOnly),
            "simplified" => Ok(Self::Simplified),
            "full" => Ok(Self::Full),
            other => Err(Error::UnsupportedMethod(format!("Unknown precision: {other}"))),
        }
    }
}

/// Where mapping tables are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory all cache paths are relative to.
    pub root: PathBuf,
    /// Relative path with `{method}`, `{region_a}` and `{region_b}`
    /// placeholders; the extension picks the file format.
    pub template: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { root: PathBuf::from("mappings"), template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..Self::default() }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Load a config from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageFormat {
    #[cfg(feature = "parquet")]
    Parquet,
    Csv,
}

impl StorageFormat {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "parquet")]
            Some("parquet") => Ok(Self::Parquet),
            Some("csv") => Ok(Self::Csv),
            _ => Err(Error::InvalidConfiguration(format!("Unsupported mapping cache file: {}", path.display()))),
        }
    }
}

/// Builds mapping tables and persists them under a per-pair cache key.
#[derive(Debug, Default)]
pub struct MappingStore {
    config: StoreConfig,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl MappingStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config, locks: Mutex::new(HashMap::new()) }
    }

    /// Store rooted at `root` with the default template.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::new(root))
    }

    #[inline] pub fn config(&self) -> &StoreConfig { &self.config }

    /// Cache path for a pair of regions. The ids are sorted, so both
    /// directions share one file.
    pub fn path(&self, from_id: &str, to_id: &str, method: MappingMethod) -> PathBuf {
        let (region_a, region_b) = if from_id <= to_id { (from_id, to_id) } else { (to_id, from_id) };
        self.config.root.join(
            self.config.template
                .replace("{method}", method.as_str())
                .replace("{region_a}", region_a)
                .replace("{region_b}", region_b)
        )
    }

    /// Fetch the mapping from `from` to `to`, reading the cache when allowed
    /// and building it otherwise.
    pub fn get(
        &self,
        from: &dyn RegionSource,
        to: &dyn RegionSource,
        method: MappingMethod,
        precision: Precision,
        save: bool,
        force_new: bool,
    ) -> Result<MappingTable> {
        let path = self.path(from.id(), to.id(), method);
        let cached = path.exists();

        if precision == Precision::CacheOnly && !cached {
            return Err(Error::NotFound(format!(
                "No cached {method} mapping between {:?} and {:?} at {}", from.id(), to.id(), path.display()
            )));
        }
        if force_new && precision == Precision::CacheOnly {
            return Err(Error::InvalidConfiguration("force_new cannot be combined with cache-only precision".into()));
        }
        check_save(precision, save)?;

        if !force_new && cached {
            return self.read(&path, from.id(), to.id());
        }

        self.with_lock(&path, || {
            if !force_new && path.exists() {
                // built by another caller while we waited
                return self.read(&path, from.id(), to.id());
            }
            self.build_and_store(&path, from, to, method, precision, save)
        })
    }

    /// Build the mapping unconditionally, optionally replacing the cached copy.
    pub fn create(
        &self,
        from: &dyn RegionSource,
        to: &dyn RegionSource,
        method: MappingMethod,
        precision: Precision,
        save: bool,
    ) -> Result<MappingTable> {
        if precision == Precision::CacheOnly {
            return Err(Error::InvalidConfiguration("Cannot create a mapping with cache-only precision".into()));
        }
        check_save(precision, save)?;

        let path = self.path(from.id(), to.id(), method);
        self.with_lock(&path, || self.build_and_store(&path, from, to, method, precision, save))
    }

    fn build_and_store(
        &self,
        path: &Path,
        from: &dyn RegionSource,
        to: &dyn RegionSource,
        method: MappingMethod,
        precision: Precision,
        save: bool,
    ) -> Result<MappingTable> {
        info!(from = from.id(), to = to.id(), %method, %precision, "generating mapping");
        let (units_from, units_to) = match precision {
            Precision::Full => (from.raw_geometry()?, to.raw_geometry()?),
            Precision::Simplified => (from.geometry()?, to.geometry()?),
            Precision::CacheOnly => {
                return Err(Error::InvalidConfiguration("Cannot build a mapping with cache-only precision".into()));
            }
        };

        let table = MappingTable::new(from.id(), to.id(), build_entries(method, &units_from, &units_to)?);
        if save {
            self.write(path, &table)?;
            info!(path = %path.display(), entries = table.len(), "saved mapping");
        }
        Ok(table)
    }

    fn read(&self, path: &Path, from_id: &str, to_id: &str) -> Result<MappingTable> {
        info!(from = from_id, to = to_id, path = %path.display(), "reading cached mapping");
        let bytes = fs::read(path)?;
        let df = match StorageFormat::of(path)? {
            #[cfg(feature = "parquet")]
            StorageFormat::Parquet => crate::common::io::read_from_parquet_bytes(&bytes)?,
            StorageFormat::Csv => read_csv_bytes(&bytes, &[from_id, to_id])?,
        };
        MappingTable::from_frame(&df, from_id, to_id)
    }

    fn write(&self, path: &Path, table: &MappingTable) -> Result<()> {
        let df = table.to_frame()?;
        let bytes = match StorageFormat::of(path)? {
            #[cfg(feature = "parquet")]
            StorageFormat::Parquet => crate::common::io::write_to_parquet_bytes(&df)?,
            StorageFormat::Csv => write_csv_bytes(&df)?,
        };
        write_atomic(path, &bytes)
    }

    /// Run `f` while holding the per-path lock, then drop the lock entry if
    /// nobody else is waiting on it.
    fn with_lock<T>(&self, path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.lock_for(path);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f()
        };

        let mut locks = self.locks();
        let idle = locks.get(path).is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if idle { locks.remove(path); }
        result
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        debug!(path = %path.display(), "acquiring mapping lock");
        Arc::clone(self.locks().entry(path.to_path_buf()).or_default())
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Only full-precision mappings may be persisted.
fn check_save(precision: Precision, save: bool) -> Result<()> {
    if save && precision != Precision::Full {
        return Err(Error::InvalidConfiguration(format!(
            "Mappings can only be saved at full precision, got {precision}"
        )));
    }
    Ok(())
}
