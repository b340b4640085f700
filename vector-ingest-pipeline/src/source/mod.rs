//! Source module for the vector ingest pipeline.
//!
//! Reads ingestion records from an on-disk archive.

mod archive;
mod messages;
mod writer;

pub use archive::{decode_vector, encode_vector, ArchiveReader, OBJECT_ENTRY, VECTOR_ENTRY_PREFIX};
pub use messages::SourceMessage;
pub use writer::ArchiveWriter;
