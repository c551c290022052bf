//! File-backed key-value store.

use crate::backend::KvStore;
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A key-value store persisted as a single JSON file.
///
/// The whole namespace is held in memory and rewritten on every mutation
/// via a temp-file-then-rename, so a crash mid-write leaves either the old
/// image or the new one, never a torn file. The namespace is small (one
/// dataset, one config blob, bounded backups), so whole-file rewrites are
/// cheap enough.
///
/// There is no lock against other processes opening the same file.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens a store at `path`, creating an empty one if the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] if an existing file does not parse
    /// as a JSON string map.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)
                .map_err(|e| StoreError::Corrupted(format!("{}: {e}", path.display())))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        let serialized = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.put("speakers", "[]").unwrap();
            store.put("speakers.version", "3").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("speakers").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get("speakers.version").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.put("a", "1").unwrap();
            store.remove("a").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("fresh.json")).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn open_garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json at all").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Corrupted(_))
        ));
    }
}
