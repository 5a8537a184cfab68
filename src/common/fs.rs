use std::{fs, io::Write, path::Path};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Create the directory if it doesn't exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::InvalidConfiguration(format!("Path exists but is not a directory: {}", path.display())));
        }
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Write `bytes` to `path` by writing a sibling temp file and renaming it over
/// the target, so readers never observe a partially written file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir_exists(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
