//! Weaviate client implementation.
//!
//! This module provides the concrete implementation of `VectorStoreClient`
//! on top of Weaviate's REST batch endpoint (`POST /v1/batch/objects`).

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::WeaviateConfig;
use crate::errors::StoreError;
use crate::interfaces::{BatchInsertResult, StoreObject, VectorStoreClient};
use vector_ingest_shared::{FailureRecord, PropertyMap, VectorMap};

const BATCH_OBJECTS_PATH: &str = "v1/batch/objects";
const READY_PATH: &str = "v1/.well-known/ready";
const SCHEMA_PATH: &str = "v1/schema";

/// Weaviate client implementation.
///
/// # Example
///
/// ```ignore
/// let config = WeaviateConfig::new("http://localhost:8080");
/// let client = WeaviateClient::new(config)?;
/// let result = client.batch_insert("SupportChat", &objects).await?;
/// println!("{} rejected", result.failed_count());
/// ```
pub struct WeaviateClient {
    client: Client,
    base_url: Url,
}

impl WeaviateClient {
    /// Create a new client for the instance described by `config`.
    ///
    /// # Returns
    ///
    /// * `Ok(WeaviateClient)` - A new client instance
    /// * `Err(StoreError)` - If the URL or a header is invalid
    pub fn new(config: WeaviateConfig) -> Result<Self, StoreError> {
        // Url::join drops the last path segment unless it ends with '/'
        let mut raw_url = config.url.trim_end_matches('/').to_string();
        raw_url.push('/');
        let base_url = Url::parse(&raw_url)
            .map_err(|e| StoreError::invalid_config(format!("Invalid Weaviate URL: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
                .map_err(|e| StoreError::invalid_config(format!("Invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| StoreError::invalid_config(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| StoreError::invalid_config(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(url = %base_url, "Created Weaviate client");

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::invalid_config(e.to_string()))
    }

    fn schema_endpoint(&self, collection: &str) -> Result<Url, StoreError> {
        let mut url = self.endpoint(SCHEMA_PATH)?;
        url.path_segments_mut()
            .map_err(|_| StoreError::invalid_config("Weaviate URL cannot be a base"))?
            .push(collection);
        Ok(url)
    }
}

#[async_trait]
impl VectorStoreClient for WeaviateClient {
    #[instrument(skip(self, objects), fields(count = objects.len()))]
    async fn batch_insert(
        &self,
        collection: &str,
        objects: &[StoreObject],
    ) -> Result<BatchInsertResult, StoreError> {
        let (payload, mut failures) = build_batch_request(collection, objects);

        if payload.objects.is_empty() {
            return Ok(BatchInsertResult::with_failures(objects.len(), failures));
        }

        let response = self
            .client
            .post(self.endpoint(BATCH_OBJECTS_PATH)?)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Batch request failed");
            return Err(StoreError::batch_rejected(status.as_u16(), body));
        }

        let items: Vec<BatchResponseItem> = response.json().await?;
        failures.extend(collect_failures(&payload, items));

        debug!(
            submitted = objects.len(),
            failed = failures.len(),
            "Batch insert completed"
        );

        Ok(BatchInsertResult::with_failures(objects.len(), failures))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let response = self.client.get(self.endpoint(READY_PATH)?).send().await?;
        Ok(response.status().is_success())
    }

    #[instrument(skip(self))]
    async fn collection_multi_tenancy(&self, collection: &str) -> Result<Option<bool>, StoreError> {
        let response = self
            .client
            .get(self.schema_endpoint(collection)?)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(collection = %collection, "Collection not found in schema");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::connection(format!(
                "schema request failed with status {}: {}",
                status, body
            )));
        }

        let schema: CollectionSchema = response.json().await?;
        Ok(Some(schema.multi_tenancy_enabled()))
    }

    async fn close(&self) -> Result<(), StoreError> {
        debug!(url = %self.base_url, "Closing Weaviate client");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    objects: Vec<BatchObject<'a>>,
}

#[derive(Debug, Serialize)]
struct BatchObject<'a> {
    class: &'a str,
    id: Uuid,
    properties: &'a PropertyMap,
    vectors: &'a VectorMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant: Option<&'a str>,
    #[serde(skip)]
    source_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CollectionSchema {
    #[serde(rename = "multiTenancyConfig", default)]
    multi_tenancy_config: Option<MultiTenancyConfig>,
}

impl CollectionSchema {
    fn multi_tenancy_enabled(&self) -> bool {
        self.multi_tenancy_config
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct MultiTenancyConfig {
    #[serde(default)]
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct BatchResponseItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    result: Option<ObjectResult>,
}

#[derive(Debug, Deserialize)]
struct ObjectResult {
    #[serde(default)]
    errors: Option<ErrorList>,
}

#[derive(Debug, Deserialize)]
struct ErrorList {
    #[serde(default)]
    error: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Build the request body, rejecting objects whose id is not a UUID.
///
/// Weaviate refuses the whole request when one id is malformed, so those
/// objects are reported as failures locally and left out of the call.
fn build_batch_request<'a>(
    collection: &'a str,
    objects: &'a [StoreObject],
) -> (BatchRequest<'a>, Vec<FailureRecord>) {
    let mut failures = Vec::new();
    let mut batch = Vec::with_capacity(objects.len());

    for object in objects {
        match Uuid::parse_str(&object.id) {
            Ok(id) => batch.push(BatchObject {
                class: collection,
                id,
                properties: &object.properties,
                vectors: &object.vectors,
                tenant: object.tenant.as_deref(),
                source_id: &object.id,
            }),
            Err(e) => {
                warn!(id = %object.id, error = %e, "Object id is not a UUID");
                failures.push(FailureRecord::new(
                    object.id.clone(),
                    format!("invalid object id: {}", e),
                ));
            }
        }
    }

    (BatchRequest { objects: batch }, failures)
}

/// Map per-object errors in the response back to the ids we sent.
///
/// Items are matched by id. Items without an id fall back to their position.
fn collect_failures(request: &BatchRequest<'_>, items: Vec<BatchResponseItem>) -> Vec<FailureRecord> {
    let by_uuid: HashMap<Uuid, &str> = request
        .objects
        .iter()
        .map(|o| (o.id, o.source_id))
        .collect();

    let mut failures = Vec::new();
    for (position, item) in items.into_iter().enumerate() {
        let messages: Vec<String> = item
            .result
            .and_then(|r| r.errors)
            .map(|e| e.error.into_iter().map(|m| m.message).collect())
            .unwrap_or_default();

        if messages.is_empty() {
            continue;
        }

        let id = item
            .id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .and_then(|uuid| by_uuid.get(&uuid).copied())
            .or_else(|| request.objects.get(position).map(|o| o.source_id))
            .map(str::to_string)
            .or(item.id)
            .unwrap_or_else(|| format!("#{}", position));

        failures.push(FailureRecord::new(id, messages.join("; ")));
    }

    failures
}
