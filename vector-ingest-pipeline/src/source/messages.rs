//! Message types for the source.
//!
//! Defines what flows from the archive reader thread to the driver.

use crate::errors::IngestError;
use vector_ingest_shared::IngestionRecord;

/// Messages sent by the archive reader.
#[derive(Debug)]
pub enum SourceMessage {
    /// A decoded record, in archive order.
    Record(IngestionRecord),
    /// Decoding failed; the reader stops after sending this.
    Error(IngestError),
    /// The archive has been read to the end.
    End,
}
