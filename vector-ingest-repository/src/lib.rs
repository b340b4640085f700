//! # Vector Ingest Repository
//!
//! This crate provides the trait the ingest pipeline writes through and a
//! concrete implementation for Weaviate's batch object endpoint.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod weaviate;

pub use config::WeaviateConfig;
pub use errors::StoreError;
pub use interfaces::{BatchInsertResult, StoreObject, VectorStoreClient};
pub use weaviate::WeaviateClient;
