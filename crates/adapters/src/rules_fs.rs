//! Filesystem-based classifier rules loader

use nutri_grade_domain::{CategoryRules, KeywordRule, RulesError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading a rules file
#[derive(Debug, Error)]
pub enum RulesFileError {
    #[error("IO error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
    #[error("Invalid rules in {file}: {source}")]
    Invalid {
        file: String,
        #[source]
        source: RulesError,
    },
}

/// On-disk shape: a list of `[[rule]]` tables
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default, rename = "rule")]
    pub rules: Vec<KeywordRule>,
}

/// Load and validate a TOML rules file
pub fn load_rules(path: impl AsRef<Path>) -> Result<CategoryRules, RulesFileError> {
    let path = path.as_ref();
    let file = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|source| RulesFileError::Io {
        file: file.clone(),
        source,
    })?;

    let rules = parse_rules(&content).map_err(|e| match e {
        ParseFailure::Toml(message) => RulesFileError::Parse {
            file: file.clone(),
            message,
        },
        ParseFailure::Rules(source) => RulesFileError::Invalid {
            file: file.clone(),
            source,
        },
    })?;

    tracing::debug!(file = %file, count = rules.rules().len(), "Loaded classifier rules");

    Ok(rules)
}

/// Rules from `path` when given, otherwise the built-in set
pub fn load_rules_or_default(path: Option<&Path>) -> Result<CategoryRules, RulesFileError> {
    match path {
        Some(path) => load_rules(path),
        None => Ok(CategoryRules::default()),
    }
}

/// Serialize a rule set in the rules file format
pub fn rules_to_toml(rules: &CategoryRules) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&RulesFile {
        rules: rules.rules().to_vec(),
    })
}

enum ParseFailure {
    Toml(String),
    Rules(RulesError),
}

fn parse_rules(content: &str) -> Result<CategoryRules, ParseFailure> {
    let file: RulesFile = toml::from_str(content).map_err(|e| ParseFailure::Toml(e.to_string()))?;
    CategoryRules::new(file.rules).map_err(ParseFailure::Rules)
}
