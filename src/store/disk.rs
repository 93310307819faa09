//! JSON-file reference store with atomic replace semantics.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::ReferenceStore;
use crate::common::errors::StoreError;

/// One JSON object per file, e.g. `{"pdfUrl": "https://host/x.pdf"}`.
///
/// Writes land via temp-file-then-rename, so a crash mid-write never
/// corrupts the previous contents. A missing file reads as empty.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read(&self.path) {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(StoreError::Read(err)),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::Write)?;
        }

        let raw = serde_json::to_vec_pretty(entries)?;

        let tmp_path = temp_path_for(&self.path);
        fs::write(&tmp_path, &raw).map_err(StoreError::Write)?;

        let file = fs::OpenOptions::new()
            .write(true)
            .open(&tmp_path)
            .map_err(StoreError::Write)?;
        file.sync_all().map_err(StoreError::Write)?;

        fs::rename(&tmp_path, &self.path).map_err(StoreError::Write)?;

        Ok(())
    }
}

/// Build a unique temp path next to the target store file.
fn temp_path_for(path: &Path) -> PathBuf {
    let base_name = path
        .file_name()
        .and_then(|x| x.to_str())
        .unwrap_or("references.json");
    let tmp_name = format!(".{base_name}.{}.tmp", Uuid::new_v4());
    path.with_file_name(tmp_name)
}

impl ReferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}
