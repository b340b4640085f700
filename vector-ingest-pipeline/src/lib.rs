//! # Vector Ingest Pipeline
//!
//! This crate loads a pre-vectorized archive into a vector store.
//!
//! ## Architecture
//!
//! The pipeline follows the Source-Router-Loader pattern:
//!
//! 1. **Source**: Reads records lazily from the archive
//! 2. **Router**: Assigns each record a tenant when multi-tenancy is on
//! 3. **Loader**: Batches records and flushes them to the store
//! 4. **Orchestrator**: Drives the run and collects store-side failures

pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod router;
pub mod source;

pub use errors::IngestError;
