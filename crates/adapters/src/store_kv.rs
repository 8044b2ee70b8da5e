//! JSON file key-value grade store
//!
//! The file holds one JSON object with a nested object per namespace, each
//! mapping product ids to serialized entries. Several namespaces may share a
//! file: every write re-reads it and replaces only its own namespace, so other
//! top-level keys are carried through untouched.

use async_trait::async_trait;
use nutri_grade_domain::{CacheEntry, GradeStore, StoreError};
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::store::validate_namespace;

/// JSON-file-backed grade store
pub struct KvGradeStore {
    path: PathBuf,
    namespace: String,
    /// This namespace's entries keyed by product id
    entries: Mutex<Map<String, Value>>,
}

impl KvGradeStore {
    /// Open the file at `path`, creating it if missing
    pub async fn open(path: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        validate_namespace(namespace)?;
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("Failed to create directory: {}", e)))?;
        }

        let mut document = read_document(&path).await?;
        let entries = match document.remove(namespace) {
            None => Map::new(),
            Some(Value::Object(entries)) => entries,
            Some(_) => {
                return Err(StoreError::Serialization(format!(
                    "{}: namespace {} is not an object",
                    path.display(),
                    namespace
                )));
            }
        };

        let store = Self {
            path,
            namespace: namespace.to_string(),
            entries: Mutex::new(entries),
        };

        // surface an unwritable location at open time
        {
            let entries = store.entries.lock().await;
            store.persist(&entries).await?;
        }

        Ok(store)
    }

    /// Rewrite the file with `entries` as this namespace, via a temp file and rename
    async fn persist(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let mut document = read_document(&self.path).await?;
        document.insert(self.namespace.clone(), Value::Object(entries.clone()));

        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = self.temp_path();
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))?;

        Ok(())
    }

    /// One temp file per namespace, next to the target so the rename stays on one filesystem
    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{}.tmp", self.namespace));
        PathBuf::from(name)
    }
}

async fn read_document(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(StoreError::Io(format!("{}: {}", path.display(), e))),
    };

    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    serde_json::from_str(&raw)
        .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl GradeStore for KvGradeStore {
    async fn get(&self, product_id: &str) -> Result<Option<CacheEntry>, StoreError> {
        let entries = self.entries.lock().await;

        entries
            .get(product_id)
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        let value =
            serde_json::to_value(entry).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut entries = self.entries.lock().await;
        entries.insert(entry.id.clone(), value);
        self.persist(&entries).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.entries.lock().await.len() as u64)
    }

    fn backend(&self) -> &'static str {
        "kv"
    }
}
