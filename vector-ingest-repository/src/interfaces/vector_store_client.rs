//! Vector store client trait definition.
//!
//! This module defines the abstract interface for batch-inserting objects
//! into a vector store.

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::StoreError;
use vector_ingest_shared::{FailureRecord, PropertyMap, VectorMap};

/// One object in a batch-insert call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreObject {
    /// Object key.
    pub id: String,
    /// Scalar properties.
    pub properties: PropertyMap,
    /// Named vectors to store with the object.
    pub vectors: VectorMap,
    /// Tenant the object belongs to, for multi-tenant collections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl StoreObject {
    pub fn new(
        id: impl Into<String>,
        properties: PropertyMap,
        vectors: VectorMap,
        tenant: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            properties,
            vectors,
            tenant,
        }
    }
}

/// Outcome of a single batch-insert call.
///
/// A batch that reached the store always produces a result, even when some
/// or all of its objects were rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchInsertResult {
    /// Number of objects sent in the call.
    pub submitted: usize,
    /// Objects the store rejected, with the reason it gave.
    pub failures: Vec<FailureRecord>,
}

impl BatchInsertResult {
    /// Create a result where every submitted object was accepted.
    pub fn accepted(submitted: usize) -> Self {
        Self {
            submitted,
            failures: Vec::new(),
        }
    }

    /// Create a result with the given rejections.
    pub fn with_failures(submitted: usize, failures: Vec<FailureRecord>) -> Self {
        Self {
            submitted,
            failures,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Check whether the store accepted every object.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Abstract interface for vector store operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// `Err(StoreError)` means the store could not take the batch at all.
/// Per-object rejections are returned in `BatchInsertResult::failures`.
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    /// Insert a batch of objects into `collection`.
    ///
    /// # Arguments
    ///
    /// * `collection` - Target collection name
    /// * `objects` - Objects to insert, in submission order
    ///
    /// # Returns
    ///
    /// * `Ok(BatchInsertResult)` - The batch reached the store; see `failures`
    /// * `Err(StoreError)` - The store could not accept the batch
    async fn batch_insert(
        &self,
        collection: &str,
        objects: &[StoreObject],
    ) -> Result<BatchInsertResult, StoreError>;

    /// Check if the store is ready to accept writes.
    async fn health_check(&self) -> Result<bool, StoreError>;

    /// Whether `collection` is configured for multi-tenancy.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(enabled))` - The collection exists and reports its setting
    /// * `Ok(None)` - The collection does not exist or the store cannot tell
    /// * `Err(StoreError)` - The store could not be queried
    async fn collection_multi_tenancy(&self, _collection: &str) -> Result<Option<bool>, StoreError> {
        Ok(None)
    }

    /// Release the connection.
    ///
    /// Called once when the run is over, on every exit path.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
