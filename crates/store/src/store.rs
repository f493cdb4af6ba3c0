//! Tenant store implementations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::{fs, io};

use launchkit_core::TenantId;

use crate::record::TenantRecord;

/// Tenant store abstraction.
///
/// Implementations must be safe for concurrent use; the job driver inserts
/// while the API layer reads.
pub trait TenantStore: Send + Sync {
    /// Persist a new tenant record. Fails if the id already exists.
    fn insert(&self, record: &TenantRecord) -> Result<(), StoreError>;

    /// Fetch one record by id.
    fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, StoreError>;

    /// List every stored record, oldest first.
    fn list(&self) -> Result<Vec<TenantRecord>, StoreError>;
}

impl<S> TenantStore for Arc<S>
where
    S: TenantStore + ?Sized,
{
    fn insert(&self, record: &TenantRecord) -> Result<(), StoreError> {
        (**self).insert(record)
    }

    fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, StoreError> {
        (**self).get(tenant_id)
    }

    fn list(&self) -> Result<Vec<TenantRecord>, StoreError> {
        (**self).list()
    }
}

/// Tenant store error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("tenant already exists: {0}")]
    AlreadyExists(TenantId),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt tenant record at {path}: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
}

/// In-memory tenant store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    inner: RwLock<HashMap<TenantId, TenantRecord>>,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TenantStore for InMemoryTenantStore {
    fn insert(&self, record: &TenantRecord) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if map.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        map.insert(record.id, record.clone());
        Ok(())
    }

    fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, StoreError> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(tenant_id).cloned())
    }

    fn list(&self) -> Result<Vec<TenantRecord>, StoreError> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut records: Vec<_> = map.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

/// Filesystem-backed tenant store: one pretty-printed JSON file per tenant.
///
/// Writes go through a temp file + rename so a crash mid-write never leaves
/// a half-written record behind.
#[derive(Debug)]
pub struct FsTenantStore {
    root: PathBuf,
}

impl FsTenantStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn record_path(&self, tenant_id: &TenantId) -> PathBuf {
        self.root.join(format!("{tenant_id}.json"))
    }

    fn read_record(path: &Path) -> Result<TenantRecord, StoreError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }
}

impl TenantStore for FsTenantStore {
    fn insert(&self, record: &TenantRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.id);
        if path.exists() {
            return Err(StoreError::AlreadyExists(record.id));
        }

        let raw = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(tenant_id = %record.id, "tenant record persisted");
        Ok(())
    }

    fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, StoreError> {
        let path = self.record_path(tenant_id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<TenantRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) => records.push(record),
                // One unreadable file must not hide the healthy records;
                // get() on that id still surfaces the corruption.
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable tenant record");
                }
            }
        }
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> TenantRecord {
        TenantRecord::new(TenantId::new(), name, r#"{"app":{"routes":[]}}"#)
    }

    #[test]
    fn in_memory_round_trip() {
        let store = InMemoryTenantStore::new();
        let rec = record("Pet Sitting Marketplace");

        store.insert(&rec).unwrap();
        assert_eq!(store.get(&rec.id).unwrap(), Some(rec.clone()));
        assert!(matches!(
            store.insert(&rec),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn fs_round_trip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let rec = record("Dog Walker Finder");

        {
            let store = FsTenantStore::open(dir.path()).unwrap();
            store.insert(&rec).unwrap();
        }

        // A fresh handle over the same directory sees the record.
        let store = FsTenantStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&rec.id).unwrap(), Some(rec));
    }

    #[test]
    fn fs_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTenantStore::open(dir.path()).unwrap();
        let rec = record("dup");

        store.insert(&rec).unwrap();
        assert!(matches!(
            store.insert(&rec),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn fs_list_is_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTenantStore::open(dir.path()).unwrap();

        let mut first = record("first");
        let mut second = record("second");
        first.created_at = ts(1_700_000_000);
        second.created_at = ts(1_700_000_100);

        store.insert(&second).unwrap();
        store.insert(&first).unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn fs_list_skips_unreadable_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTenantStore::open(dir.path()).unwrap();

        store.insert(&record("healthy")).unwrap();
        std::fs::write(dir.path().join("zz-damaged.json"), "{{{").unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["healthy"]);
    }

    #[test]
    fn fs_get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTenantStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&TenantId::new()).unwrap(), None);
    }

    fn ts(secs: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(secs, 0).unwrap()
    }
}
