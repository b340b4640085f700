//! Configuration types for the WeaviateClient.

use std::time::Duration;

/// Configuration for the WeaviateClient.
#[derive(Debug, Clone)]
pub struct WeaviateConfig {
    /// Base URL of the Weaviate instance.
    pub url: String,
    /// API key sent as a bearer token. Local instances usually run without one.
    pub api_key: Option<String>,
    /// Extra headers sent with every request, e.g. vectorizer provider keys.
    pub headers: Vec<(String, String)>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            api_key: None,
            headers: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl WeaviateConfig {
    /// Create a config pointing at `url` with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
