//! Grade store selection with graceful degradation

use nutri_grade_domain::{GradeStore, StoreError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use crate::store_kv::KvGradeStore;
use crate::store_memory::InMemoryGradeStore;
use crate::store_sqlite::SqliteGradeStore;

static NAMESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("valid namespace regex"));

/// Configured cache backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite, then the JSON file, then memory
    #[default]
    Auto,
    Sqlite,
    Kv,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Auto => "auto",
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Kv => "kv",
            StoreBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(StoreBackend::Auto),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "kv" => Ok(StoreBackend::Kv),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "unknown cache backend '{}', expected auto, sqlite, kv or memory",
                other
            )),
        }
    }
}

/// Where and how to open the grade store
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub db_path: PathBuf,
    pub kv_path: PathBuf,
    pub namespace: String,
}

/// An opened store and how it was reached
pub struct OpenedStore {
    pub store: Arc<dyn GradeStore>,
    /// Backend actually serving requests
    pub backend: &'static str,
    /// Why a less preferred backend is in use, if one is
    pub fallback_reason: Option<String>,
}

/// Open the configured store; never fails, degrading to memory at worst
pub async fn open_grade_store(settings: &StoreSettings) -> OpenedStore {
    let mut failures: Vec<String> = Vec::new();

    if matches!(settings.backend, StoreBackend::Auto | StoreBackend::Sqlite) {
        match SqliteGradeStore::new(&settings.db_path, &settings.namespace).await {
            Ok(store) => {
                tracing::debug!(
                    path = %settings.db_path.display(),
                    namespace = %settings.namespace,
                    "Opened SQLite grade store"
                );
                return opened(Arc::new(store), failures);
            }
            Err(e) => {
                tracing::warn!(
                    path = %settings.db_path.display(),
                    error = %e,
                    "SQLite grade store unavailable, falling back"
                );
                failures.push(format!("sqlite: {}", e));
            }
        }
    }

    if matches!(settings.backend, StoreBackend::Auto | StoreBackend::Kv) {
        match KvGradeStore::open(&settings.kv_path, &settings.namespace).await {
            Ok(store) => {
                tracing::debug!(
                    path = %settings.kv_path.display(),
                    namespace = %settings.namespace,
                    "Opened key-value grade store"
                );
                return opened(Arc::new(store), failures);
            }
            Err(e) => {
                tracing::warn!(
                    path = %settings.kv_path.display(),
                    error = %e,
                    "Key-value grade store unavailable, falling back to memory"
                );
                failures.push(format!("kv: {}", e));
            }
        }
    }

    opened(Arc::new(InMemoryGradeStore::new()), failures)
}

fn opened(store: Arc<dyn GradeStore>, failures: Vec<String>) -> OpenedStore {
    OpenedStore {
        backend: store.backend(),
        store,
        fallback_reason: (!failures.is_empty()).then(|| failures.join("; ")),
    }
}

/// Namespaces become table names and JSON keys, so they stay `[a-z0-9_]+`
pub(crate) fn validate_namespace(namespace: &str) -> Result<(), StoreError> {
    if NAMESPACE_RE.is_match(namespace) {
        Ok(())
    } else {
        Err(StoreError::InvalidNamespace(namespace.to_string()))
    }
}
