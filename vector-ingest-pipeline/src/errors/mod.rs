//! Error types for the vector ingest pipeline.
//!
//! Everything here aborts the run. Objects the store rejects one by one are
//! not errors; they are collected as `FailureRecord`s and reported in the
//! summary.

use thiserror::Error;
use vector_ingest_repository::StoreError;

/// Errors that abort an ingest run.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The archive file could not be opened or is not a container.
    #[error("Archive open error: {0}")]
    ArchiveOpenError(String),

    /// A properties blob or the archive layout is malformed.
    #[error("Archive format error: {0}")]
    ArchiveFormatError(String),

    /// A vector entry could not be decoded into a fixed-length array.
    #[error("Vector decode error for {id}/{slot}: {reason}")]
    VectorDecodeError {
        id: String,
        slot: String,
        reason: String,
    },

    /// A record has no vector under the slot the loader submits.
    #[error("Record {id} has no vector in slot '{slot}'")]
    MissingVectorSlot { id: String, slot: String },

    /// The property used to derive the tenant is absent.
    #[error("Routing key missing: property '{0}' is not set")]
    RoutingKeyMissingError(String),

    /// Writing an archive failed.
    #[error("Archive write error: {0}")]
    ArchiveWriteError(String),

    /// The run configuration is unusable.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The store could not accept a batch at all.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Channel communication error between the reader and the driver.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl IngestError {
    /// Create an archive open error.
    pub fn archive_open(msg: impl Into<String>) -> Self {
        Self::ArchiveOpenError(msg.into())
    }

    /// Create an archive format error.
    pub fn archive_format(msg: impl Into<String>) -> Self {
        Self::ArchiveFormatError(msg.into())
    }

    /// Create a vector decode error.
    pub fn vector_decode(
        id: impl Into<String>,
        slot: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::VectorDecodeError {
            id: id.into(),
            slot: slot.into(),
            reason: reason.into(),
        }
    }

    /// Create a routing key missing error.
    pub fn routing_key_missing(property: impl Into<String>) -> Self {
        Self::RoutingKeyMissingError(property.into())
    }

    /// Create an archive write error.
    pub fn archive_write(msg: impl Into<String>) -> Self {
        Self::ArchiveWriteError(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }

    /// The stage of the run that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ArchiveOpenError(_) => "open",
            Self::ArchiveFormatError(_)
            | Self::VectorDecodeError { .. }
            | Self::MissingVectorSlot { .. } => "decode",
            Self::RoutingKeyMissingError(_) => "route",
            Self::StoreUnavailable(_) => "store-connect",
            Self::ConfigError(_) => "config",
            Self::ArchiveWriteError(_) | Self::ChannelError(_) => "internal",
        }
    }
}
