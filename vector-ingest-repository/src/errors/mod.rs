//! Error types for the vector ingest repository.

mod store_error;

pub use store_error::StoreError;
