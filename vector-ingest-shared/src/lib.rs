//! # Vector Ingest Shared
//!
//! Plain data types passed between the source, router, loader and driver of
//! the vector ingest pipeline.

mod record;
mod summary;

pub use record::{IngestionRecord, PropertyMap, PropertyValue, VectorMap};
pub use summary::{FailureRecord, ImportSummary, RunOutcome};
