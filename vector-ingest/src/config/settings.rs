//! Run configuration.
//!
//! Selects the embedding provider explicitly instead of swapping script
//! files around.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::AppError;
use vector_ingest_pipeline::loader::{
    LoaderConfig, DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION, DEFAULT_VECTOR_SLOT,
};
use vector_ingest_pipeline::orchestrator::OrchestratorConfig;
use vector_ingest_pipeline::router::{default_tenant_pool, TenantRouter, DEFAULT_ROUTING_PROPERTY};

/// Default Weaviate URL.
pub const DEFAULT_WEAVIATE_URL: &str = "http://localhost:8080";

/// Multi-tenancy when neither the caller nor the collection decides.
pub const DEFAULT_MULTI_TENANCY: bool = true;

/// Embedding provider the dataset was vectorized with.
///
/// Decides which archive is loaded by default and which API key the
/// collection's vectorizer needs at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Provider {
    #[default]
    Ollama,
    Openai,
    Cohere,
}

impl Provider {
    /// Model tag used in the dataset file name.
    pub fn dataset_tag(&self) -> &'static str {
        match self {
            Self::Ollama => "nomic",
            Self::Openai => "openai",
            Self::Cohere => "cohere",
        }
    }

    /// Archive loaded when none is given.
    pub fn default_archive(&self) -> PathBuf {
        PathBuf::from(format!(
            "data/twitter_customer_support_{}.zip",
            self.dataset_tag()
        ))
    }

    /// Environment variable holding the provider's API key, if it needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::Openai => Some("OPENAI_API_KEY"),
            Self::Cohere => Some("COHERE_API_KEY"),
        }
    }

    /// Header Weaviate reads the provider key from.
    pub fn api_key_header(&self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::Openai => Some("X-OpenAI-Api-Key"),
            Self::Cohere => Some("X-Cohere-Api-Key"),
        }
    }
}

/// Everything needed for one import run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub weaviate_url: String,
    pub weaviate_api_key: Option<String>,
    /// Provider key forwarded to the vectorizer. Read from `provider.api_key_env()`.
    pub provider_api_key: Option<String>,
    pub request_timeout: Duration,
    pub provider: Provider,
    pub archive_path: PathBuf,
    pub collection: String,
    pub batch_size: usize,
    pub vector_slot: String,
    /// `None` follows the collection's own multi-tenancy setting.
    pub multi_tenancy: Option<bool>,
    pub routing_property: String,
    pub tenant_pool: Vec<String>,
    pub failure_preview: usize,
    pub progress_every: usize,
    pub channel_buffer_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let provider = Provider::default();
        Self {
            weaviate_url: DEFAULT_WEAVIATE_URL.to_string(),
            weaviate_api_key: None,
            provider_api_key: None,
            request_timeout: Duration::from_secs(60),
            provider,
            archive_path: provider.default_archive(),
            collection: DEFAULT_COLLECTION.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            vector_slot: DEFAULT_VECTOR_SLOT.to_string(),
            multi_tenancy: None,
            routing_property: DEFAULT_ROUTING_PROPERTY.to_string(),
            tenant_pool: default_tenant_pool(),
            failure_preview: 3,
            progress_every: 1000,
            channel_buffer_size: 1,
        }
    }
}

impl IngestConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.batch_size == 0 {
            return Err(AppError::config("batch size must be at least 1"));
        }
        if self.collection.trim().is_empty() {
            return Err(AppError::config("collection name is empty"));
        }
        if self.vector_slot.trim().is_empty() {
            return Err(AppError::config("vector slot is empty"));
        }
        if self.multi_tenancy == Some(true) && self.tenant_pool.is_empty() {
            return Err(AppError::config(
                "multi-tenancy is enabled but the tenant pool is empty",
            ));
        }
        Ok(())
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            collection: self.collection.clone(),
            batch_size: self.batch_size,
            vector_slot: self.vector_slot.clone(),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            channel_buffer_size: self.channel_buffer_size,
            failure_preview: self.failure_preview,
            progress_every: self.progress_every,
        }
    }

    pub fn router(&self) -> TenantRouter {
        TenantRouter::new(self.routing_property.clone(), self.tenant_pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_archives() {
        assert_eq!(
            Provider::Ollama.default_archive(),
            PathBuf::from("data/twitter_customer_support_nomic.zip")
        );
        assert_eq!(
            Provider::Cohere.default_archive(),
            PathBuf::from("data/twitter_customer_support_cohere.zip")
        );
    }

    #[test]
    fn test_provider_keys() {
        assert_eq!(Provider::Ollama.api_key_env(), None);
        assert_eq!(Provider::Openai.api_key_env(), Some("OPENAI_API_KEY"));
        assert_eq!(Provider::Cohere.api_key_header(), Some("X-Cohere-Api-Key"));
    }

    #[test]
    fn test_provider_parses_from_cli_value() {
        assert_eq!(Provider::from_str("openai", true).unwrap(), Provider::Openai);
        assert!(Provider::from_str("mistral", true).is_err());
    }

    #[test]
    fn test_defaults_validate() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 200);
        assert_eq!(config.multi_tenancy, None);
        assert_eq!(config.tenant_pool.len(), 5);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let config = IngestConfig {
            batch_size: 0,
            ..IngestConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));

        let config = IngestConfig {
            tenant_pool: Vec::new(),
            multi_tenancy: Some(true),
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());

        let config = IngestConfig {
            tenant_pool: Vec::new(),
            multi_tenancy: Some(false),
            ..IngestConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_configs() {
        let config = IngestConfig {
            batch_size: 50,
            failure_preview: 10,
            ..IngestConfig::default()
        };
        assert_eq!(config.loader_config().batch_size, 50);
        assert_eq!(config.orchestrator_config().failure_preview, 10);
        assert_eq!(config.router().routing_property(), "company_author");
    }
}
