//! Config command - configuration management

use anyhow::{Context, Result};
use std::fs;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(path, force).await,
    }
}

async fn init_config(path: std::path::PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let content = AppConfig::example_toml();

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    let written =
        AppConfig::load(Some(path.as_path())).context("Written config does not load")?;

    println!("Created config file: {}", path.display());
    println!(
        "  Revision: {}, cache backend: {}",
        written.general.revision, written.cache.backend
    );
    println!();
    println!("Next steps:");
    println!("  1. Pick a scoring revision and cache backend in the config file");
    println!("  2. Optionally customize the classifier rules:");
    println!("     'nutri-grade rules list --toml > rules.toml', then set [classifier] rules_path");
    println!("  3. Run 'nutri-grade doctor' to validate your setup");
    println!("  4. Run 'nutri-grade grade --energy 1108 --proteins 9 --salt 0.9 --explain' to test");

    Ok(())
}
