//! Cache command - inspect stored grade computations

use anyhow::{Context, Result};
use nutri_grade_adapters::stores::open_grade_store;
use nutri_grade_domain::usecases::SCHEMA_VERSION;
use std::path::PathBuf;

use crate::args::{CacheArgs, CacheCommands};
use crate::config::AppConfig;

pub async fn execute(args: CacheArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        CacheCommands::Get {
            product_id,
            revision,
            json,
        } => get_entry(product_id, revision, json, config_path).await,
        CacheCommands::Stats { revision, json } => show_stats(revision, json, config_path).await,
    }
}

async fn get_entry(
    product_id: String,
    revision: Option<String>,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let revision_id = config.revision_id(revision.as_deref())?;
    let opened = open_grade_store(&config.store_settings(revision_id)).await;

    // raw store read: expired data_unavailable entries are shown too
    let entry = opened
        .store
        .get(&product_id)
        .await
        .context("Failed to read cache entry")?;

    if json {
        let output = serde_json::json!({
            "product_id": product_id,
            "revision": revision_id.as_str(),
            "backend": opened.backend,
            "entry": entry,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match entry {
        Some(entry) => {
            println!("Product: {}", entry.id);
            match entry.grade {
                Some(grade) => println!("  Grade: {}", grade),
                None => println!("  Grade: none"),
            }
            if let Some(reason) = entry.reason {
                println!("  Reason: {}", reason.as_str());
            }
            println!("  Computed at: {}", entry.computed_at);
            println!("  Backend: {}", opened.backend);
        }
        None => println!("No cached entry for {} ({})", product_id, revision_id),
    }

    Ok(())
}

async fn show_stats(revision: Option<String>, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let revision_id = config.revision_id(revision.as_deref())?;
    let settings = config.store_settings(revision_id);
    let opened = open_grade_store(&settings).await;

    let count = opened
        .store
        .count()
        .await
        .context("Failed to count cache entries")?;

    if json {
        let output = serde_json::json!({
            "revision": revision_id.as_str(),
            "namespace": settings.namespace,
            "schema_version": SCHEMA_VERSION,
            "backend": opened.backend,
            "fallback_reason": opened.fallback_reason,
            "entries": count,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Cache Stats");
        println!("===========");
        println!();
        println!("Revision: {}", revision_id);
        println!("Namespace: {}", settings.namespace);
        println!("Backend: {}", opened.backend);
        if let Some(ref reason) = opened.fallback_reason {
            println!("  Fallback: {}", reason);
        }
        println!("Entries: {}", count);
    }

    Ok(())
}
