//! Legacy plain-file persistence binding: no mmap, no double-buffer swap
//! (`spec.md` §4.5.2). Kept for environments where mapping a file isn't an
//! option; [`super::MemoryMappedStore`] is the primary binding.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{PersistenceBinding, StoreSnapshot};

/// Persists a [`StoreSnapshot`] to a single bincode file, overwritten whole
/// on every checkpoint.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a binding rooted at `path`, creating parent directories if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::persistence)?;
        }
        Ok(Self { path })
    }
}

impl PersistenceBinding for SnapshotStore {
    fn checkpoint(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let file = File::create(&self.path).map_err(Error::persistence)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, snapshot).map_err(|e| Error::internal(e.to_string()))
    }

    fn recover(&self) -> Result<Option<StoreSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path).map_err(Error::persistence)?;
        let reader = BufReader::new(file);
        let snapshot = bincode::deserialize_from(reader).map_err(|e| Error::internal(e.to_string()))?;
        Ok(Some(snapshot))
    }
}
