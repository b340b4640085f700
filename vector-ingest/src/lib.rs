//! # Vector Ingest
//!
//! Entry point and configuration for loading a pre-vectorized archive into
//! a Weaviate collection.

pub mod config;
pub mod telemetry;

pub use config::{Dependencies, IngestConfig, Provider};

use thiserror::Error;
use tracing::{info, warn};

use vector_ingest_shared::ImportSummary;

/// Errors that can occur during setup or an import run.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error(transparent)]
    IngestError(#[from] vector_ingest_pipeline::IngestError),

    /// Store error outside of a run (connect, health check, close).
    #[error("Store error: {0}")]
    StoreError(#[from] vector_ingest_repository::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// The stage the run aborted at.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "config",
            Self::IngestError(e) => e.stage(),
            Self::StoreError(_) => "store-connect",
            Self::IoError(_) => "open",
        }
    }
}

/// Run one import and release the store connection afterwards.
///
/// Ctrl-C cancels the run: the open batch is flushed and the summary comes
/// back marked incomplete.
pub async fn run_import(
    mut deps: Dependencies,
    config: &IngestConfig,
) -> Result<ImportSummary, AppError> {
    let handle = deps.orchestrator.shutdown_handle();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            handle.shutdown();
        }
    });

    let result = deps
        .orchestrator
        .run(&config.archive_path, deps.multi_tenancy)
        .await;

    signal_task.abort();

    if let Err(e) = deps.close().await {
        warn!(error = %e, "Failed to close store connection");
    }

    Ok(result?)
}
