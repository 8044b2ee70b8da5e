//! In-memory grade store for testing and `memory` backend runs

use async_trait::async_trait;
use nutri_grade_domain::{CacheEntry, GradeStore, StoreError};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory grade store implementation
pub struct InMemoryGradeStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryGradeStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryGradeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GradeStore for InMemoryGradeStore {
    async fn get(&self, product_id: &str) -> Result<Option<CacheEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(entries.get(product_id).cloned())
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(entries.len() as u64)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
