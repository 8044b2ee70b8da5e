//! Doctor command - validate configuration and show status

use anyhow::Result;
use nutri_grade_adapters::catalog::CatalogClient;
use nutri_grade_adapters::rules::load_rules_or_default;
use nutri_grade_adapters::stores::{StoreBackend, open_grade_store};
use nutri_grade_domain::RevisionId;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    revision: CheckResult,
    rules: CheckResult,
    cache: CheckResult,
    catalog: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        revision: CheckResult::error("Not checked"),
        rules: CheckResult::error("Not checked"),
        cache: CheckResult::error("Not checked"),
        catalog: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        let revision = config.revision_id(None);
        report.revision = match revision {
            Ok(id) => CheckResult::ok(format!("Revision: {}", id)),
            Err(ref e) => CheckResult::error(e.to_string()),
        };

        report.rules = check_rules(config);
        report.cache = match revision {
            Ok(id) => check_cache(config, id).await,
            Err(_) => CheckResult::error("Skipped: no valid revision"),
        };
        report.catalog = check_catalog(config);
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.revision,
        &report.rules,
        &report.cache,
        &report.catalog,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_rules(config: &AppConfig) -> CheckResult {
    let path = config.classifier.rules_path.as_deref();
    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());

    match load_rules_or_default(path) {
        Ok(rules) => CheckResult::ok(format!("{} rules ({})", rules.rules().len(), source))
            .with_details(serde_json::json!({
                "source": source,
                "count": rules.rules().len(),
            })),
        Err(e) => CheckResult::error(format!("Failed to load rules: {}", e)),
    }
}

async fn check_cache(config: &AppConfig, revision: RevisionId) -> CheckResult {
    let settings = config.store_settings(revision);
    let opened = open_grade_store(&settings).await;

    let entries = match opened.store.count().await {
        Ok(count) => count,
        Err(e) => {
            return CheckResult::error(format!(
                "Backend {} opened but unreadable: {}",
                opened.backend, e
            ));
        }
    };

    let details = serde_json::json!({
        "configured": config.cache.backend,
        "backend": opened.backend,
        "namespace": settings.namespace,
        "entries": entries,
        "fallback_reason": opened.fallback_reason,
    });

    let message = format!(
        "Backend: {}, Namespace: {}, Entries: {}",
        opened.backend, settings.namespace, entries
    );

    match opened.fallback_reason {
        Some(ref reason) => {
            CheckResult::warn(format!("{} (fallback: {})", message, reason)).with_details(details)
        }
        // results vanish on exit
        None if config.cache.backend == StoreBackend::Memory => {
            CheckResult::warn(format!("{} (not persisted)", message)).with_details(details)
        }
        None => CheckResult::ok(message).with_details(details),
    }
}

fn check_catalog(config: &AppConfig) -> CheckResult {
    let base_url = config.catalog.base_url.trim();

    if base_url.is_empty() {
        return CheckResult::error("Catalog base_url is empty");
    }

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return CheckResult::error(format!("Catalog base_url is not an HTTP URL: {}", base_url));
    }

    if config.catalog.timeout_secs == 0 {
        return CheckResult::warn(format!("Catalog: {}, timeout is 0s", base_url));
    }

    match CatalogClient::new(base_url, config.catalog_timeout()) {
        Ok(client) => CheckResult::ok(format!(
            "Catalog: {}, timeout: {}s",
            client.base_url(),
            config.catalog.timeout_secs
        )),
        Err(e) => CheckResult::error(format!("Failed to create catalog client: {}", e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("nutri-grade Doctor Report");
    println!("=========================");
    println!();

    print_check("Config", &report.config);
    print_check("Revision", &report.revision);
    print_check("Rules", &report.rules);
    print_check("Cache", &report.cache);
    print_check("Catalog", &report.catalog);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall != "error" {
        println!();
        println!("Ready to grade! Try: nutri-grade lookup <product-id>");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
