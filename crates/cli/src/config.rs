//! Configuration loading and management

use anyhow::{Context, Result};
use nutri_grade_adapters::catalog::DEFAULT_BASE_URL;
use nutri_grade_adapters::stores::{StoreBackend, StoreSettings};
use nutri_grade_domain::RevisionId;
use nutri_grade_domain::usecases::namespace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_revision")]
    pub revision: String,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_kv_path")]
    pub kv_path: PathBuf,

    #[serde(default = "default_data_unavailable_ttl")]
    pub data_unavailable_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// TOML rules file; the built-in Czech rules are used when unset
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_revision() -> String {
    RevisionId::default().as_str().to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./nutri-grade.sqlite")
}

fn default_kv_path() -> PathBuf {
    PathBuf::from("./nutri-grade.json")
}

fn default_data_unavailable_ttl() -> u64 {
    604_800
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            revision: default_revision(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            db_path: default_db_path(),
            kv_path: default_kv_path(),
            data_unavailable_ttl_secs: default_data_unavailable_ttl(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("NUTRI_GRADE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Revision from a command-line override or `[general] revision`
    pub fn revision_id(&self, cli_override: Option<&str>) -> Result<RevisionId> {
        let raw = cli_override.unwrap_or(&self.general.revision);
        raw.parse::<RevisionId>().map_err(anyhow::Error::msg)
    }

    /// Store location for one revision's namespace
    pub fn store_settings(&self, revision: RevisionId) -> StoreSettings {
        StoreSettings {
            backend: self.cache.backend,
            db_path: self.cache.db_path.clone(),
            kv_path: self.cache.kv_path.clone(),
            namespace: namespace(revision.slug()),
        }
    }

    pub fn data_unavailable_ttl(&self) -> time::Duration {
        let secs = i64::try_from(self.cache.data_unavailable_ttl_secs).unwrap_or(i64::MAX);
        time::Duration::seconds(secs)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.timeout_secs)
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# nutri-grade configuration

[general]
log_level = "info"
revision = "2022"  # legacy-2017, 2022, 2022-fats
max_concurrent = 4

[cache]
backend = "auto"  # auto, sqlite, kv, memory
db_path = "./nutri-grade.sqlite"
kv_path = "./nutri-grade.json"
# products whose data could not be fetched are retried after this long
data_unavailable_ttl_secs = 604800

[catalog]
base_url = "https://www.rohlik.cz"
timeout_secs = 30

[classifier]
# rules_path = "./rules.toml"
"#
        .to_string()
    }
}
