//! Result cache use case
//!
//! Wraps a [`GradeStore`] with the lookup semantics the orchestrator relies
//! on: store failures degrade to a miss, and `DataUnavailable` negatives age
//! out so that a later lookup retries the catalog.

use std::sync::Arc;
use time::Duration;

use crate::model::{CacheEntry, Grade, NullReason};
use crate::ports::{Clock, GradeStore};

/// Default lifetime of a `DataUnavailable` entry (7 days)
pub const DEFAULT_DATA_UNAVAILABLE_TTL: Duration = Duration::seconds(604_800);

/// Version of the persisted entry semantics; bump when scoring changes
pub const SCHEMA_VERSION: u32 = 3;

/// Store namespace for a revision, e.g. `nutri_scores_v3_nutri_2022`
pub fn namespace(revision_slug: &str) -> String {
    format!("nutri_scores_v{}_{}", SCHEMA_VERSION, revision_slug)
}

/// Per-product memo of grade computations
pub struct ResultCache<St, Cl>
where
    St: GradeStore + ?Sized,
    Cl: Clock + ?Sized,
{
    store: Arc<St>,
    clock: Arc<Cl>,
    data_unavailable_ttl: Duration,
}

impl<St, Cl> ResultCache<St, Cl>
where
    St: GradeStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(store: Arc<St>, clock: Arc<Cl>) -> Self {
        Self {
            store,
            clock,
            data_unavailable_ttl: DEFAULT_DATA_UNAVAILABLE_TTL,
        }
    }

    pub fn with_data_unavailable_ttl(mut self, ttl: Duration) -> Self {
        self.data_unavailable_ttl = ttl;
        self
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Cached entry, or `None` when the product must be (re)computed
    pub async fn get(&self, product_id: &str) -> Option<CacheEntry> {
        let entry = match self.store.get(product_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    product_id = %product_id,
                    backend = self.store.backend(),
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                return None;
            }
        };

        if self.is_expired(&entry) {
            tracing::debug!(
                product_id = %product_id,
                computed_at = %entry.computed_at,
                "Cached data_unavailable entry expired"
            );
            return None;
        }

        Some(entry)
    }

    /// Record a computation; failures are logged and swallowed
    pub async fn set(&self, product_id: &str, grade: Option<Grade>, reason: Option<NullReason>) {
        let now = self.clock.now();
        let entry = match grade {
            Some(grade) => CacheEntry::graded(product_id, grade, now),
            None => CacheEntry::ungraded(
                product_id,
                reason.unwrap_or(NullReason::DataUnavailable),
                now,
            ),
        };

        if let Err(e) = self.store.put(&entry).await {
            tracing::warn!(
                product_id = %product_id,
                backend = self.store.backend(),
                error = %e,
                "Cache write failed"
            );
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.grade.is_none()
            && entry.reason == Some(NullReason::DataUnavailable)
            && self.clock.now() - entry.computed_at >= self.data_unavailable_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::fakes::{FailingStore, FakeClock, FakeStore};
    use time::OffsetDateTime;

    fn cache() -> (
        ResultCache<FakeStore, FakeClock>,
        Arc<FakeStore>,
        Arc<FakeClock>,
    ) {
        let store = Arc::new(FakeStore::default());
        let clock = Arc::new(FakeClock::new(OffsetDateTime::UNIX_EPOCH));
        let cache = ResultCache::new(Arc::clone(&store), Arc::clone(&clock));
        (cache, store, clock)
    }

    #[test]
    fn test_namespace_carries_schema_version() {
        assert_eq!(namespace("nutri_2022"), "nutri_scores_v3_nutri_2022");
    }

    #[tokio::test]
    async fn test_absent_is_distinct_from_null_grade() {
        let (cache, _, _) = cache();
        assert!(cache.get("1").await.is_none());

        cache.set("1", None, Some(NullReason::NotApplicable)).await;
        let entry = cache.get("1").await.unwrap();
        assert_eq!(entry.grade, None);
        assert_eq!(entry.reason, Some(NullReason::NotApplicable));
    }

    #[tokio::test]
    async fn test_round_trip_every_grade() {
        let (cache, store, _) = cache();
        for (i, grade) in Grade::ALL.into_iter().enumerate() {
            let id = i.to_string();
            cache.set(&id, Some(grade), None).await;
            let entry = cache.get(&id).await.unwrap();
            assert_eq!(entry.grade, Some(grade));
            assert_eq!(entry.reason, None);
        }
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_stamps_clock() {
        let (cache, _, clock) = cache();
        cache.set("1", Some(Grade::C), None).await;
        clock.advance(Duration::hours(1));
        cache.set("1", Some(Grade::B), Some(NullReason::NotApplicable)).await;

        let entry = cache.get("1").await.unwrap();
        assert_eq!(entry.grade, Some(Grade::B));
        // a reason is never stored next to a grade
        assert_eq!(entry.reason, None);
        assert_eq!(entry.computed_at, OffsetDateTime::UNIX_EPOCH + Duration::hours(1));
    }

    #[tokio::test]
    async fn test_data_unavailable_expires_after_ttl() {
        let (cache, _, clock) = cache();
        let cache = cache.with_data_unavailable_ttl(Duration::days(1));

        cache.set("missing", None, Some(NullReason::DataUnavailable)).await;
        cache.set("beer", None, Some(NullReason::NotApplicable)).await;
        cache.set("bread", Some(Grade::C), None).await;

        clock.advance(Duration::hours(23));
        assert!(cache.get("missing").await.is_some());

        clock.advance(Duration::hours(1));
        assert!(cache.get("missing").await.is_none());
        assert!(cache.get("beer").await.is_some());
        assert!(cache.get("bread").await.is_some());
    }

    #[tokio::test]
    async fn test_missing_reason_defaults_to_data_unavailable() {
        let (cache, _, _) = cache();
        cache.set("1", None, None).await;
        let entry = cache.get("1").await.unwrap();
        assert_eq!(entry.reason, Some(NullReason::DataUnavailable));
    }

    #[tokio::test]
    async fn test_store_errors_are_a_miss() {
        let clock = Arc::new(FakeClock::new(OffsetDateTime::UNIX_EPOCH));
        let cache = ResultCache::new(Arc::new(FailingStore), clock);

        cache.set("1", Some(Grade::A), None).await;
        assert!(cache.get("1").await.is_none());
    }
}
