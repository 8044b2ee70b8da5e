//! Lookup command - grade catalog products through the cache

use anyhow::{Context, Result};
use nutri_grade_adapters::badges::{JsonlBadgeSink, MemoryBadgeSink};
use nutri_grade_adapters::catalog::{CatalogClient, StubCatalog};
use nutri_grade_adapters::rules::load_rules_or_default;
use nutri_grade_adapters::stores::open_grade_store;
use nutri_grade_domain::usecases::{GradeLookup, GradeLookupConfig, ResultCache};
use nutri_grade_domain::{
    CategorySource, LookupOutcome, NutritionSource, PresentationSink, SystemClock,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::args::LookupArgs;
use crate::config::AppConfig;

pub async fn execute(args: LookupArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let revision_id = config.revision_id(args.revision.as_deref())?;

    let rules = load_rules_or_default(config.classifier.rules_path.as_deref())
        .context("Failed to load classifier rules")?;

    let opened = open_grade_store(&config.store_settings(revision_id)).await;
    if let Some(ref reason) = opened.fallback_reason {
        tracing::warn!(backend = opened.backend, reason = %reason, "Using fallback cache store");
    }
    let backend = opened.backend;
    let fallback_reason = opened.fallback_reason.clone();

    let cache = ResultCache::new(opened.store, Arc::new(SystemClock))
        .with_data_unavailable_ttl(config.data_unavailable_ttl());

    let (nutrition, categories) = catalog_sources(args.catalog_file.as_deref(), &config)?;

    let collected = Arc::new(MemoryBadgeSink::new());
    let sink: Arc<dyn PresentationSink> = match args.badges {
        Some(ref path) => Arc::new(
            JsonlBadgeSink::new(path.clone())
                .await
                .with_context(|| format!("Failed to open badge file: {}", path.display()))?,
        ),
        None => collected.clone(),
    };

    let lookup = GradeLookup::new(
        nutrition,
        categories,
        sink,
        cache,
        Arc::new(rules),
        Arc::new(revision_id.revision()),
        GradeLookupConfig {
            max_concurrent: config.general.max_concurrent,
            read_cache: !args.no_cache,
        },
    );

    tracing::info!(
        products = args.product_ids.len(),
        revision = %revision_id,
        backend,
        "Looking up products"
    );

    let outcomes = lookup.lookup_many(&args.product_ids).await;

    if args.json {
        let output = serde_json::json!({
            "revision": revision_id.as_str(),
            "backend": backend,
            "fallback_reason": fallback_reason,
            "results": outcomes,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_outcomes(&outcomes);

        let badges = collected.presented();
        if !badges.is_empty() {
            println!();
            println!("Badges");
            println!("======");
            for (product_id, grade) in badges {
                println!("{}  {}  {}", product_id, grade, grade.color_hex());
            }
        }
    }

    if let Some(ref path) = args.badges {
        tracing::info!(path = %path.display(), "Badges written");
    }

    Ok(())
}

/// Offline stub when a catalog file is given, the HTTP catalog otherwise
fn catalog_sources(
    catalog_file: Option<&Path>,
    config: &AppConfig,
) -> Result<(Arc<dyn NutritionSource>, Arc<dyn CategorySource>)> {
    match catalog_file {
        Some(path) => {
            let stub = Arc::new(StubCatalog::load(path).context("Failed to load catalog file")?);
            tracing::info!(path = %path.display(), "Using offline catalog");
            let nutrition: Arc<dyn NutritionSource> = stub.clone();
            let categories: Arc<dyn CategorySource> = stub;
            Ok((nutrition, categories))
        }
        None => {
            let client = Arc::new(
                CatalogClient::new(&config.catalog.base_url, config.catalog_timeout())
                    .context("Failed to create catalog client")?,
            );
            let nutrition: Arc<dyn NutritionSource> = client.clone();
            let categories: Arc<dyn CategorySource> = client;
            Ok((nutrition, categories))
        }
    }
}

fn print_outcomes(outcomes: &[LookupOutcome]) {
    for outcome in outcomes {
        let grade = outcome
            .grade
            .map(|g| g.to_string())
            .unwrap_or_else(|| "-".to_string());
        let reason = outcome
            .reason
            .map(|r| format!(" ({})", r.as_str()))
            .unwrap_or_default();
        let cached = if outcome.cached { " [cached]" } else { "" };

        println!("{}: {}{}{}", outcome.product_id, grade, reason, cached);
    }
}
