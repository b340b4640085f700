//! Loader module for the vector ingest pipeline.
//!
//! Batches records and inserts them into the vector store.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::errors::IngestError;
use vector_ingest_repository::{StoreObject, VectorStoreClient};
use vector_ingest_shared::{FailureRecord, IngestionRecord, VectorMap};

/// Default number of records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Default vector slot submitted to the store.
pub const DEFAULT_VECTOR_SLOT: &str = "text_with_metadata";

/// Default target collection.
pub const DEFAULT_COLLECTION: &str = "SupportChat";

/// Configuration for the batch assembler.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Collection the objects are inserted into.
    pub collection: String,
    /// Number of records to batch before flushing.
    pub batch_size: usize,
    /// Vector slot sent to the store. Other slots on the record are not sent.
    pub vector_slot: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            vector_slot: DEFAULT_VECTOR_SLOT.to_string(),
        }
    }
}

/// What a single flush sent and what the store rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// 1-based sequence number of the batch in this run. 0 if nothing was sent.
    pub batch: usize,
    /// Number of records sent.
    pub submitted: usize,
    /// Records the store rejected.
    pub failures: Vec<FailureRecord>,
}

impl FlushReport {
    fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.submitted == 0
    }
}

/// Accumulates records into fixed-size batches and flushes them to the store.
///
/// Holds at most one open batch. `add` flushes synchronously once the batch
/// is full, so callers never get more than one batch ahead of the store.
/// Not safe for concurrent use; callers feed it from a single stream.
pub struct BatchAssembler {
    client: Arc<dyn VectorStoreClient>,
    config: LoaderConfig,
    pending: Vec<StoreObject>,
    flushes: usize,
    sent: usize,
}

impl BatchAssembler {
    /// Create a new assembler.
    ///
    /// A batch size of 0 is treated as 1.
    pub fn with_config(client: Arc<dyn VectorStoreClient>, mut config: LoaderConfig) -> Self {
        config.batch_size = config.batch_size.max(1);
        let batch_size = config.batch_size;
        Self {
            client,
            config,
            pending: Vec::with_capacity(batch_size),
            flushes: 0,
            sent: 0,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of records in the open batch.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of batch-insert calls issued so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Number of records sent to the store so far.
    pub fn sent_count(&self) -> usize {
        self.sent
    }

    /// Add a record to the open batch, flushing it if it becomes full.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The record was buffered
    /// * `Ok(Some(report))` - The record filled the batch and the batch was flushed
    /// * `Err(IngestError::MissingVectorSlot)` - The record has no vector in the configured slot
    /// * `Err(IngestError::StoreUnavailable)` - The store could not take the batch
    pub async fn add(&mut self, record: IngestionRecord) -> Result<Option<FlushReport>, IngestError> {
        let object = self.to_store_object(record)?;
        self.pending.push(object);

        if self.pending.len() >= self.config.batch_size {
            return self.flush().await.map(Some);
        }

        Ok(None)
    }

    /// Send every buffered record to the store as one batch.
    ///
    /// The buffer is cleared whatever the outcome. Does nothing when the
    /// buffer is empty.
    #[instrument(skip(self), fields(collection = %self.config.collection, count = self.pending.len()))]
    pub async fn flush(&mut self) -> Result<FlushReport, IngestError> {
        if self.pending.is_empty() {
            return Ok(FlushReport::empty());
        }

        let batch = std::mem::replace(
            &mut self.pending,
            Vec::with_capacity(self.config.batch_size),
        );
        self.flushes += 1;
        let sequence = self.flushes;

        debug!(batch = sequence, count = batch.len(), "Flushing batch to store");

        let result = self
            .client
            .batch_insert(&self.config.collection, &batch)
            .await?;
        self.sent += batch.len();

        if !result.all_succeeded() {
            warn!(
                batch = sequence,
                count = batch.len(),
                failed = result.failed_count(),
                "Store rejected objects in batch"
            );
        }

        Ok(FlushReport {
            batch: sequence,
            submitted: batch.len(),
            failures: result.failures,
        })
    }

    /// Flush whatever is left and release the assembler.
    pub async fn close(mut self) -> Result<FlushReport, IngestError> {
        self.flush().await
    }

    /// Keep only the configured vector slot.
    fn to_store_object(&self, record: IngestionRecord) -> Result<StoreObject, IngestError> {
        let IngestionRecord {
            id,
            properties,
            mut vectors,
            tenant,
        } = record;

        let slot = &self.config.vector_slot;
        let vector = match vectors.remove(slot) {
            Some(vector) if !vector.is_empty() => vector,
            _ => {
                return Err(IngestError::MissingVectorSlot {
                    id,
                    slot: slot.clone(),
                })
            }
        };

        let mut submitted = VectorMap::new();
        submitted.insert(slot.clone(), vector);

        Ok(StoreObject::new(id, properties, submitted, tenant))
    }
}
