//! Grocery catalog HTTP adapter for nutrition and category data

use async_trait::async_trait;
use nutri_grade_domain::{CategorySource, NutrientProfile, NutritionSource, SourceError};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.rohlik.cz";

/// Catalog client implementing both source ports
pub struct CatalogClient {
    client: Client,
    base_url: Url,
}

impl CatalogClient {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, SourceError> {
        let raw = base_url.as_ref().trim();
        let base_url = Url::parse(raw)
            .map_err(|e| SourceError::Api(format!("Invalid catalog base URL {}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::Api(format!(
                "Catalog base URL cannot carry a path: {}",
                raw
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/api/v1/products/{id}/{resource}` with the id percent-encoded as one segment
    fn product_url(&self, product_id: &str, resource: &str) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SourceError::Api(format!(
                    "Catalog base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", "v1", "products", product_id, resource]);
        Ok(url)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompositionResponse {
    #[serde(default)]
    nutritional_values: Vec<NutritionalValues>,
}

#[derive(Deserialize)]
struct NutritionalValues {
    values: Option<Values>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Values {
    #[serde(rename = "energyKJ")]
    energy_kj: Option<Amount>,
    protein: Option<Amount>,
    sugars: Option<Amount>,
    saturated_fats: Option<Amount>,
    fiber: Option<Amount>,
    salt: Option<Amount>,
}

#[derive(Deserialize)]
struct Amount {
    amount: Option<f64>,
}

fn amount(value: Option<Amount>) -> Option<f64> {
    value.and_then(|v| v.amount)
}

impl From<Values> for NutrientProfile {
    fn from(values: Values) -> Self {
        NutrientProfile {
            energy: amount(values.energy_kj),
            sugars: amount(values.sugars),
            saturated_fats: amount(values.saturated_fats),
            salt: amount(values.salt),
            proteins: amount(values.protein),
            fiber: amount(values.fiber),
            fruit_veg_legumes_percent: None,
        }
    }
}

#[derive(Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Option<Vec<Category>>,
}

#[derive(Deserialize)]
struct Category {
    name: String,
}

#[async_trait]
impl NutritionSource for CatalogClient {
    async fn fetch_nutrition(
        &self,
        product_id: &str,
    ) -> Result<Option<NutrientProfile>, SourceError> {
        let url = self.product_url(product_id, "composition")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!(
                product_id = %product_id,
                status = %response.status(),
                "No composition for product"
            );
            return Ok(None);
        }

        let composition: CompositionResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(composition
            .nutritional_values
            .into_iter()
            .next()
            .and_then(|first| first.values)
            .map(NutrientProfile::from))
    }
}

#[async_trait]
impl CategorySource for CatalogClient {
    async fn fetch_categories(&self, product_id: &str) -> Result<Vec<String>, SourceError> {
        let url = self.product_url(product_id, "categories")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!(
                "Failed to get categories ({}): {}",
                status, body
            )));
        }

        let categories: CategoriesResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        let names: Vec<String> = categories
            .categories
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.name)
            .collect();

        tracing::debug!(product_id = %product_id, count = names.len(), "Fetched categories");

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CatalogClient {
        CatalogClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_nutrition_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/1234/composition"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "nutritionalValues": [{
                    "values": {
                        "energyKJ": {"amount": 1108.76, "unit": "kJ"},
                        "protein": {"amount": 9.0},
                        "carbohydrates": {"amount": 49.0},
                        "sugars": {"amount": 0.0},
                        "saturatedFats": {"amount": 0.5},
                        "salt": {"amount": 0.9}
                    }
                }]
            })))
            .mount(&mock_server)
            .await;

        let profile = client(&mock_server)
            .fetch_nutrition("1234")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(profile.energy, Some(1108.76));
        assert_eq!(profile.proteins, Some(9.0));
        assert_eq!(profile.saturated_fats, Some(0.5));
        assert_eq!(profile.salt, Some(0.9));
        assert_eq!(profile.fiber, None);
    }

    #[tokio::test]
    async fn test_fetch_nutrition_missing_values_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/1/composition"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"nutritionalValues": []})),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/2/composition"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let client = client(&mock_server);
        assert!(client.fetch_nutrition("1").await.unwrap().is_none());
        assert!(client.fetch_nutrition("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_nutrition_not_found_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/404/composition"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server).fetch_nutrition("404").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fetch_nutrition_bad_json_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/1/composition"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server).fetch_nutrition("1").await;
        assert!(matches!(result, Err(SourceError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetch_categories() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/1234/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "categories": [
                    {"id": 1, "name": "Mléčné a chlazené"},
                    {"id": 2, "name": "Sýry"}
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/5/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let client = client(&mock_server);
        assert_eq!(
            client.fetch_categories("1234").await.unwrap(),
            vec!["Mléčné a chlazené".to_string(), "Sýry".to_string()]
        );
        assert!(client.fetch_categories("5").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_categories_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/1/categories"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server).fetch_categories("1").await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    #[tokio::test]
    async fn test_product_id_is_encoded_as_one_segment() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/products/a%2Fb%3Fc/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "categories": [{"id": 1, "name": "Sýry"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let categories = client(&mock_server).fetch_categories("a/b?c").await.unwrap();
        assert_eq!(categories, vec!["Sýry".to_string()]);
    }

    #[test]
    fn test_base_url_trailing_slash_and_prefix() {
        let client = CatalogClient::new("http://localhost:1/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1");
        assert_eq!(
            client.product_url("7", "categories").unwrap().as_str(),
            "http://localhost:1/api/v1/products/7/categories"
        );

        let proxied =
            CatalogClient::new("http://localhost:1/proxy/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            proxied.product_url("7", "composition").unwrap().as_str(),
            "http://localhost:1/proxy/api/v1/products/7/composition"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        for base_url in ["not a url", "mailto:catalog@example.com"] {
            assert!(matches!(
                CatalogClient::new(base_url, Duration::from_secs(1)),
                Err(SourceError::Api(_))
            ));
        }
    }
}
