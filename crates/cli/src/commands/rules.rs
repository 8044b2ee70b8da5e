//! Rules command - list and validate classifier rules

use anyhow::{Context, Result};
use nutri_grade_adapters::rules::{load_rules, load_rules_or_default, rules_to_toml};
use std::path::PathBuf;

use crate::args::{RulesArgs, RulesCommands};
use crate::config::AppConfig;

pub async fn execute(args: RulesArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        RulesCommands::List { rules, json, toml } => {
            list_rules(rules, json, toml, config_path).await
        }
        RulesCommands::Validate { rules } => validate_rules(rules, config_path).await,
    }
}

async fn list_rules(
    rules: Option<PathBuf>,
    json: bool,
    toml: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();
    let path = rules.or(config.classifier.rules_path);

    let rule_set =
        load_rules_or_default(path.as_deref()).context("Failed to load classifier rules")?;
    let source = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());

    if toml {
        print!("{}", rules_to_toml(&rule_set).context("Failed to serialize rules")?);
    } else if json {
        let output = serde_json::json!({
            "source": source,
            "count": rule_set.rules().len(),
            "rules": rule_set.rules(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Classifier Rules ({} from {})", rule_set.rules().len(), source);
        println!("========================");
        println!();

        for rule in rule_set.rules() {
            println!("{:<28} -> {}", rule.keyword, rule.flag);
        }
    }

    Ok(())
}

async fn validate_rules(rules: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();

    let Some(path) = rules.or(config.classifier.rules_path) else {
        println!("No rules file configured, built-in rules are always valid");
        return Ok(());
    };

    println!("Validating rules in: {}", path.display());

    match load_rules(&path) {
        Ok(rule_set) => {
            println!("✓ Validation passed ({} rules)", rule_set.rules().len());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Validation failed: {}", e);
            std::process::exit(1);
        }
    }
}
