//! Weaviate implementation of the vector store client.

mod client;

pub use client::WeaviateClient;
