//! Store error types.
//!
//! These are connection-level failures: the store could not take a batch at
//! all. Objects the store rejects individually are reported through
//! `BatchInsertResult` instead.

use thiserror::Error;

/// Errors that can occur while talking to the vector store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to reach the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The store refused the whole batch.
    #[error("Batch rejected with status {status}: {body}")]
    BatchRejected { status: u16, body: String },

    /// Failed to parse a response from the store.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The client configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a batch rejected error.
    pub fn batch_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::BatchRejected {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::ConnectionError(err.to_string())
        }
    }
}
