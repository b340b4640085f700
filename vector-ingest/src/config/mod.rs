//! Configuration and dependency wiring.

mod dependencies;
mod settings;

pub use dependencies::{provider_api_key_from_env, Dependencies};
pub use settings::{IngestConfig, Provider, DEFAULT_MULTI_TENANCY, DEFAULT_WEAVIATE_URL};
