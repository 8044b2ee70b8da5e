//! Lookup use case - orchestrates cache, catalog, classification, scoring
//! and presentation for product ids

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{FuturesUnordered, StreamExt};

use crate::{
    classifier::CategoryRules,
    model::{Grade, LookupOutcome, NullReason},
    ports::{CategorySource, Clock, GradeStore, NutritionSource, PresentationSink},
    revision::Revision,
    scoring::score,
    usecases::cache::ResultCache,
};

/// Configuration for the lookup orchestrator
#[derive(Debug, Clone)]
pub struct GradeLookupConfig {
    /// Maximum concurrent lookups in [`GradeLookup::lookup_many`]
    pub max_concurrent: usize,
    /// Serve results from the cache; when false the cache is only written
    pub read_cache: bool,
}

impl Default for GradeLookupConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            read_cache: true,
        }
    }
}

type InFlight = Arc<Mutex<HashMap<String, Shared<BoxFuture<'static, LookupOutcome>>>>>;

/// Lookup orchestrator
pub struct GradeLookup<N, C, P, St, Cl>
where
    N: NutritionSource + ?Sized,
    C: CategorySource + ?Sized,
    P: PresentationSink + ?Sized,
    St: GradeStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pipeline: Arc<Pipeline<N, C, P, St, Cl>>,
    in_flight: InFlight,
    max_concurrent: usize,
}

impl<N, C, P, St, Cl> Clone for GradeLookup<N, C, P, St, Cl>
where
    N: NutritionSource + ?Sized,
    C: CategorySource + ?Sized,
    P: PresentationSink + ?Sized,
    St: GradeStore + ?Sized,
    Cl: Clock + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            in_flight: Arc::clone(&self.in_flight),
            max_concurrent: self.max_concurrent,
        }
    }
}

struct Pipeline<N, C, P, St, Cl>
where
    N: NutritionSource + ?Sized,
    C: CategorySource + ?Sized,
    P: PresentationSink + ?Sized,
    St: GradeStore + ?Sized,
    Cl: Clock + ?Sized,
{
    nutrition: Arc<N>,
    categories: Arc<C>,
    sink: Arc<P>,
    cache: ResultCache<St, Cl>,
    rules: Arc<CategoryRules>,
    revision: Arc<Revision>,
    read_cache: bool,
}

impl<N, C, P, St, Cl> GradeLookup<N, C, P, St, Cl>
where
    N: NutritionSource + ?Sized + 'static,
    C: CategorySource + ?Sized + 'static,
    P: PresentationSink + ?Sized + 'static,
    St: GradeStore + ?Sized + 'static,
    Cl: Clock + ?Sized + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nutrition: Arc<N>,
        categories: Arc<C>,
        sink: Arc<P>,
        cache: ResultCache<St, Cl>,
        rules: Arc<CategoryRules>,
        revision: Arc<Revision>,
        config: GradeLookupConfig,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                nutrition,
                categories,
                sink,
                cache,
                rules,
                revision,
                read_cache: config.read_cache,
            }),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            max_concurrent: config.max_concurrent.max(1),
        }
    }

    /// Grade one product; concurrent calls for the same id share one computation
    pub async fn lookup(&self, product_id: &str) -> LookupOutcome {
        let computation = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

            match in_flight.get(product_id) {
                Some(existing) => {
                    tracing::debug!(product_id = %product_id, "Joining in-flight lookup");
                    existing.clone()
                }
                None => {
                    let pipeline = Arc::clone(&self.pipeline);
                    let registry = Arc::clone(&self.in_flight);
                    let key = product_id.to_string();

                    let computation: BoxFuture<'static, LookupOutcome> = Box::pin(async move {
                        let outcome = pipeline.run(&key).await;
                        registry
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .remove(&key);
                        outcome
                    });
                    let shared = computation.shared();
                    in_flight.insert(product_id.to_string(), shared.clone());
                    shared
                }
            }
        };

        computation.await
    }

    /// Grade many products with bounded concurrency; results keep input order
    pub async fn lookup_many(&self, product_ids: &[String]) -> Vec<LookupOutcome> {
        let mut results = Vec::with_capacity(product_ids.len());
        let mut tasks: FuturesUnordered<BoxFuture<'_, (usize, LookupOutcome)>> =
            FuturesUnordered::new();
        let mut ids_iter = product_ids.iter().enumerate();

        while tasks.len() < self.max_concurrent {
            let Some((index, id)) = ids_iter.next() else {
                break;
            };
            tasks.push(Box::pin(async move { (index, self.lookup(id).await) }));
        }

        while let Some(result) = tasks.next().await {
            results.push(result);
            while tasks.len() < self.max_concurrent {
                let Some((index, id)) = ids_iter.next() else {
                    break;
                };
                tasks.push(Box::pin(async move { (index, self.lookup(id).await) }));
            }
        }

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

impl<N, C, P, St, Cl> Pipeline<N, C, P, St, Cl>
where
    N: NutritionSource + ?Sized,
    C: CategorySource + ?Sized,
    P: PresentationSink + ?Sized,
    St: GradeStore + ?Sized,
    Cl: Clock + ?Sized,
{
    async fn run(&self, product_id: &str) -> LookupOutcome {
        if self.read_cache {
            if let Some(entry) = self.cache.get(product_id).await {
                tracing::debug!(product_id = %product_id, grade = ?entry.grade, "Cache hit");
                self.present(product_id, entry.grade).await;
                return LookupOutcome {
                    product_id: product_id.to_string(),
                    grade: entry.grade,
                    reason: entry.reason,
                    cached: true,
                };
            }
        }

        let (grade, reason) = self.compute(product_id).await;

        tracing::info!(
            product_id = %product_id,
            grade = ?grade,
            reason = ?reason,
            "Computed grade"
        );

        self.cache.set(product_id, grade, reason).await;
        self.present(product_id, grade).await;

        LookupOutcome {
            product_id: product_id.to_string(),
            grade,
            reason,
            cached: false,
        }
    }

    async fn compute(&self, product_id: &str) -> (Option<Grade>, Option<NullReason>) {
        let unavailable = (None, Some(NullReason::DataUnavailable));

        let names = match self.categories.fetch_categories(product_id).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Failed to fetch categories");
                return unavailable;
            }
        };

        let flags = self.rules.classify(&names);
        if flags.is_alcoholic {
            return (None, Some(NullReason::NotApplicable));
        }

        let profile = match self.nutrition.fetch_nutrition(product_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::debug!(product_id = %product_id, "No nutrition record");
                return unavailable;
            }
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Failed to fetch nutrition");
                return unavailable;
            }
        };

        match score(&profile, &flags, &self.revision) {
            Ok(assessment) => (assessment.grade(), assessment.null_reason()),
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Scoring failed");
                unavailable
            }
        }
    }

    async fn present(&self, product_id: &str, grade: Option<Grade>) {
        let Some(grade) = grade else {
            return;
        };
        if let Err(e) = self.sink.present(product_id, grade).await {
            tracing::error!(product_id = %product_id, error = %e, "Failed to present grade");
        }
    }
}
