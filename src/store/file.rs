//! Durable record store backed by a single JSON document file.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use super::memory::Documents;
use super::{RecordStore, StoreResult};
use crate::cache::CacheRecord;

// == File Store ==
/// Record store persisted to a JSON file.
///
/// Every mutation is applied to a copy of the documents, written to a
/// temporary file and renamed over the backing file. The in-memory state only
/// advances once the write succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    documents: Mutex<Documents>,
}

impl FileStore {
    // == Constructor ==
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let documents = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Documents::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            records = documents.len(),
            "Opened file record store"
        );

        Ok(Self {
            path,
            documents: Mutex::new(documents),
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.documents().len()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn documents(&self) -> MutexGuard<'_, Documents> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies `change` to a copy of the documents and persists it.
    fn commit<T>(
        &self,
        change: impl FnOnce(&mut Documents) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut current = self.documents();
        let mut next = current.clone();
        let outcome = change(&mut next)?;

        self.write(&next)?;
        *current = next;
        Ok(outcome)
    }

    /// Sibling of the backing file that full snapshots are written to first.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write(&self, documents: &Documents) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staging = self.staging_path();
        fs::write(&staging, serde_json::to_vec(documents)?)?;
        fs::rename(&staging, &self.path)?;

        debug!(path = %self.path.display(), records = documents.len(), "Persisted records");
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn create_or_update(&self, record: CacheRecord) -> StoreResult<CacheRecord> {
        self.commit(|documents| documents.upsert(record))
    }

    fn find_by_key(&self, storage_key: &str) -> StoreResult<Option<CacheRecord>> {
        Ok(self.documents().find(storage_key))
    }

    fn delete_one(&self, record: &CacheRecord) -> StoreResult<()> {
        self.commit(|documents| documents.remove(record))
    }

    fn fetch_up_to(&self, limit: usize) -> StoreResult<Vec<CacheRecord>> {
        Ok(self.documents().first(limit))
    }

    fn delete_many(&self, records: &[CacheRecord]) -> StoreResult<()> {
        self.commit(|documents| documents.remove_all(records))
            .map(|_| ())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::never_expires;
    use crate::store::StoreError;

    fn record(key: &str) -> CacheRecord {
        CacheRecord::new(key.to_string(), b"\"v\"".to_vec(), never_expires())
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("cache.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let saved = {
            let store = FileStore::open(&path).unwrap();
            store.create_or_update(record("a")).unwrap()
        };

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.find_by_key("a").unwrap(), Some(saved));

        // Ids keep increasing after reopening
        let next = reopened.create_or_update(record("b")).unwrap();
        assert_eq!(next.id, Some(2));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let store = FileStore::open(&path).unwrap();
        store.create_or_update(record("a")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_failed_change_is_not_applied() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("cache.json")).unwrap();
        let saved = store.create_or_update(record("a")).unwrap();
        store.delete_one(&saved).unwrap();

        assert!(matches!(
            store.delete_one(&saved),
            Err(StoreError::Missing(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_staging_file_keeps_full_name() {
        let dir = tempfile::tempdir().unwrap();
        let json = FileStore::open(dir.path().join("x.json")).unwrap();
        let db = FileStore::open(dir.path().join("x.db")).unwrap();

        assert_eq!(json.staging_path(), dir.path().join("x.json.tmp"));
        assert_ne!(json.staging_path(), db.staging_path());
    }

    #[test]
    fn test_tmp_extension_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.tmp");

        let store = FileStore::open(&path).unwrap();
        assert_ne!(store.staging_path(), path);
        let saved = store.create_or_update(record("a")).unwrap();

        assert!(!dir.path().join("cache.tmp.tmp").exists());
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.find_by_key("a").unwrap(), Some(saved));
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StoreError::Format(_))));
    }

    #[test]
    fn test_unwritable_path_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail
        let path = dir.path().join("cache.json");
        fs::create_dir(&path).unwrap();

        let store = FileStore {
            path: path.clone(),
            documents: Mutex::new(Documents::default()),
        };
        assert!(matches!(
            store.create_or_update(record("a")),
            Err(StoreError::Io(_))
        ));
        assert!(store.is_empty());
    }
}
