//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{CacheEntry, Grade, NutrientProfile};

/// Error type for catalog source operations
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Port for fetching a product's per-100g nutrient composition
#[async_trait]
pub trait NutritionSource: Send + Sync {
    /// `Ok(None)` means the catalog has no nutrition record for the product
    async fn fetch_nutrition(&self, product_id: &str)
    -> Result<Option<NutrientProfile>, SourceError>;
}

/// Port for fetching the category names a product is listed under
#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn fetch_categories(&self, product_id: &str) -> Result<Vec<String>, SourceError>;
}

/// Error type for presentation sinks
#[derive(Debug, Error)]
pub enum PresentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for showing a grade next to a product
#[async_trait]
pub trait PresentationSink: Send + Sync {
    /// Only called for products that actually have a grade
    async fn present(&self, product_id: &str, grade: Grade) -> Result<(), PresentError>;
}

/// Error type for grade store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid namespace '{0}': must match [a-z0-9_]+")]
    InvalidNamespace(String),
}

/// Port for persisting computed grades
#[async_trait]
pub trait GradeStore: Send + Sync {
    /// Stored entry, or `None` when the product was never computed
    async fn get(&self, product_id: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Insert or overwrite the entry for `entry.id`
    async fn put(&self, entry: &CacheEntry) -> Result<(), StoreError>;

    /// Number of entries in this store's namespace
    async fn count(&self) -> Result<u64, StoreError>;

    /// Backend name (e.g., "sqlite", "kv", "memory")
    fn backend(&self) -> &'static str;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
