//! Dependency initialization and wiring for the vector ingest.

use std::env;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{IngestConfig, DEFAULT_MULTI_TENANCY};
use crate::AppError;
use vector_ingest_pipeline::orchestrator::Orchestrator;
use vector_ingest_repository::{StoreError, VectorStoreClient, WeaviateClient, WeaviateConfig};

/// Container for all initialized dependencies.
///
/// Owns the store connection for the duration of one run. Call `close` when
/// the run is over.
pub struct Dependencies {
    /// The store connection shared with the orchestrator.
    pub store: Arc<dyn VectorStoreClient>,
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// Whether records are tagged with tenants in this run.
    pub multi_tenancy: bool,
}

impl Dependencies {
    /// Connect to Weaviate and build the pipeline.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError::ConfigError)` - If the configuration is invalid
    /// * `Err(AppError::StoreError)` - If Weaviate cannot be reached or is not ready
    pub async fn new(config: &IngestConfig) -> Result<Self, AppError> {
        config.validate()?;

        info!(
            weaviate_url = %config.weaviate_url,
            provider = ?config.provider,
            collection = %config.collection,
            "Initializing dependencies"
        );

        let mut store_config = WeaviateConfig::new(&config.weaviate_url)
            .with_timeout(config.request_timeout);
        if let Some(api_key) = &config.weaviate_api_key {
            store_config = store_config.with_api_key(api_key);
        }

        if let (Some(var), Some(header)) = (
            config.provider.api_key_env(),
            config.provider.api_key_header(),
        ) {
            match &config.provider_api_key {
                Some(key) => {
                    info!(variable = var, "Provider API key is set");
                    store_config = store_config.with_header(header, key);
                }
                None => warn!(variable = var, "Provider API key is not set"),
            }
        }

        let client = WeaviateClient::new(store_config)
            .map_err(|e| AppError::config(format!("Failed to create Weaviate client: {}", e)))?;

        Self::connect(config, Arc::new(client)).await
    }

    /// Check that `store` is ready, settle multi-tenancy and build the pipeline.
    ///
    /// When `config.multi_tenancy` is unset the collection's own setting is
    /// used, falling back to `DEFAULT_MULTI_TENANCY` if the store cannot tell.
    pub async fn connect(
        config: &IngestConfig,
        store: Arc<dyn VectorStoreClient>,
    ) -> Result<Self, AppError> {
        if !store.health_check().await? {
            return Err(StoreError::connection("Weaviate is not ready").into());
        }

        info!("Weaviate connection verified");

        let multi_tenancy = match config.multi_tenancy {
            Some(enabled) => enabled,
            None => match store.collection_multi_tenancy(&config.collection).await? {
                Some(enabled) => {
                    info!(
                        collection = %config.collection,
                        multi_tenancy = enabled,
                        "Using the collection's multi-tenancy setting"
                    );
                    enabled
                }
                None => {
                    warn!(
                        collection = %config.collection,
                        multi_tenancy = DEFAULT_MULTI_TENANCY,
                        "Collection did not report multi-tenancy, using default"
                    );
                    DEFAULT_MULTI_TENANCY
                }
            },
        };

        let orchestrator = Orchestrator::with_config(
            store.clone(),
            config.router(),
            config.loader_config(),
            config.orchestrator_config(),
        );

        Ok(Self {
            store,
            orchestrator,
            multi_tenancy,
        })
    }

    /// Release the store connection.
    pub async fn close(self) -> Result<(), StoreError> {
        self.store.close().await
    }
}

/// Read the provider key named by `config.provider` from the environment.
pub fn provider_api_key_from_env(config: &IngestConfig) -> Option<String> {
    config
        .provider
        .api_key_env()
        .and_then(|var| env::var(var).ok())
        .filter(|key| !key.trim().is_empty())
}
