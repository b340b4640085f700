//! Interface definitions for the vector store client.
//!
//! This module defines the abstract `VectorStoreClient` trait so the loader
//! can be driven against Weaviate in production and a mock in tests.

mod vector_store_client;

pub use vector_store_client::{BatchInsertResult, StoreObject, VectorStoreClient};
