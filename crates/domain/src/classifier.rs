//! Keyword-based category classification
//!
//! Category names coming from a catalog are free text. A rule table of
//! `(keyword, flag)` pairs turns them into [`CategoryFlags`]: any name that
//! contains a keyword (case-insensitively) sets that keyword's flag.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{CategoryFlag, CategoryFlags};

/// A single keyword rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub flag: CategoryFlag,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, flag: CategoryFlag) -> Self {
        Self {
            keyword: keyword.into(),
            flag,
        }
    }
}

/// Errors from building a rule set
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("Rule set is empty")]
    Empty,
    #[error("Rule {index} has an empty keyword")]
    EmptyKeyword { index: usize },
    #[error("Duplicate rule '{keyword}' for flag {flag}")]
    Duplicate { keyword: String, flag: CategoryFlag },
}

/// Validated, normalized rule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRules {
    rules: Vec<KeywordRule>,
}

impl CategoryRules {
    /// Build a rule set; keywords are lowercased and trimmed
    pub fn new(rules: Vec<KeywordRule>) -> Result<Self, RulesError> {
        if rules.is_empty() {
            return Err(RulesError::Empty);
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rules.len());

        for (index, rule) in rules.into_iter().enumerate() {
            let keyword = rule.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(RulesError::EmptyKeyword { index });
            }
            if !seen.insert((keyword.clone(), rule.flag)) {
                return Err(RulesError::Duplicate {
                    keyword,
                    flag: rule.flag,
                });
            }
            normalized.push(KeywordRule::new(keyword, rule.flag));
        }

        Ok(Self { rules: normalized })
    }

    /// Keywords used by the Czech catalog the tool was built for
    pub fn czech() -> Self {
        let rules = [
            ("víno", CategoryFlag::Alcoholic),
            ("piva", CategoryFlag::Alcoholic),
            ("lihoviny", CategoryFlag::Alcoholic),
            ("sýr", CategoryFlag::Cheese),
            ("hověz", CategoryFlag::RedMeat),
            ("vepřov", CategoryFlag::RedMeat),
            ("nápoje", CategoryFlag::Beverage),
            ("oleje", CategoryFlag::FatsOilsNutsOrSeeds),
            ("máslo, tuky a margaríny", CategoryFlag::FatsOilsNutsOrSeeds),
            ("ořechy", CategoryFlag::FatsOilsNutsOrSeeds),
            ("semínka", CategoryFlag::FatsOilsNutsOrSeeds),
        ]
        .into_iter()
        .map(|(keyword, flag)| KeywordRule::new(keyword, flag))
        .collect();

        Self { rules }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Derive flags from category names
    pub fn classify<S: AsRef<str>>(&self, names: &[S]) -> CategoryFlags {
        let lowered: Vec<String> = names.iter().map(|n| n.as_ref().to_lowercase()).collect();

        let mut flags = CategoryFlags::default();
        for rule in &self.rules {
            if lowered.iter().any(|name| name.contains(&rule.keyword)) {
                flags.set(rule.flag);
            }
        }

        tracing::debug!(
            categories = names.len(),
            flags = ?flags.active(),
            "Classified categories"
        );

        flags
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::czech()
    }
}
