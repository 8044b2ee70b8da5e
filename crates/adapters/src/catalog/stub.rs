//! Offline catalog served from memory or a JSON file

use async_trait::async_trait;
use nutri_grade_domain::{CategorySource, NutrientProfile, NutritionSource, SourceError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors from loading a catalog file
#[derive(Debug, Error)]
pub enum CatalogFileError {
    #[error("IO error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
}

/// One product in a catalog file
#[derive(Debug, Deserialize)]
struct StubProduct {
    #[serde(default)]
    categories: Vec<String>,
    /// Missing means the catalog has no composition for the product
    nutrition: Option<NutrientProfile>,
}

/// Offline catalog with predefined products
#[derive(Debug, Clone, Default)]
pub struct StubCatalog {
    nutrition: HashMap<String, NutrientProfile>,
    categories: HashMap<String, Vec<String>>,
}

impl StubCatalog {
    /// Create an empty stub; every product lacks nutrition data
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a product with its category names and nutrients
    pub fn with_product(
        mut self,
        product_id: impl Into<String>,
        categories: Vec<String>,
        profile: NutrientProfile,
    ) -> Self {
        let product_id = product_id.into();
        self.categories.insert(product_id.clone(), categories);
        self.nutrition.insert(product_id, profile);
        self
    }

    /// Load a JSON object mapping product ids to `{categories, nutrition}`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogFileError> {
        let path = path.as_ref();
        let file = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|source| CatalogFileError::Io {
            file: file.clone(),
            source,
        })?;

        let products: HashMap<String, StubProduct> =
            serde_json::from_str(&content).map_err(|e| CatalogFileError::Parse {
                file: file.clone(),
                message: e.to_string(),
            })?;

        let mut catalog = Self::empty();
        for (product_id, product) in products {
            if let Some(profile) = product.nutrition {
                catalog.nutrition.insert(product_id.clone(), profile);
            }
            catalog.categories.insert(product_id, product.categories);
        }

        tracing::debug!(file = %file, count = catalog.categories.len(), "Loaded offline catalog");

        Ok(catalog)
    }
}

#[async_trait]
impl NutritionSource for StubCatalog {
    async fn fetch_nutrition(
        &self,
        product_id: &str,
    ) -> Result<Option<NutrientProfile>, SourceError> {
        Ok(self.nutrition.get(product_id).cloned())
    }
}

#[async_trait]
impl CategorySource for StubCatalog {
    async fn fetch_categories(&self, product_id: &str) -> Result<Vec<String>, SourceError> {
        Ok(self.categories.get(product_id).cloned().unwrap_or_default())
    }
}
