//! Fake port implementations shared by use case tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};

use crate::model::CacheEntry;
use crate::ports::{Clock, GradeStore, StoreError};

#[derive(Default)]
pub struct FakeStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl FakeStore {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn entry(&self, id: &str) -> Option<CacheEntry> {
        self.entries.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl GradeStore for FakeStore {
    async fn get(&self, product_id: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entry(product_id))
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.len() as u64)
    }

    fn backend(&self) -> &'static str {
        "fake"
    }
}

pub struct FailingStore;

#[async_trait]
impl GradeStore for FailingStore {
    async fn get(&self, _product_id: &str) -> Result<Option<CacheEntry>, StoreError> {
        Err(StoreError::Database("disk on fire".to_string()))
    }

    async fn put(&self, _entry: &CacheEntry) -> Result<(), StoreError> {
        Err(StoreError::Database("disk on fire".to_string()))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::Database("disk on fire".to_string()))
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

pub struct FakeClock {
    time: Mutex<OffsetDateTime>,
}

impl FakeClock {
    pub fn new(time: OffsetDateTime) -> Self {
        Self {
            time: Mutex::new(time),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.time.lock().unwrap() += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        *self.time.lock().unwrap()
    }
}
