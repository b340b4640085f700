//! Orchestrator module for the vector ingest pipeline.
//!
//! Drives a run: archive reader, tenant router and batch assembler.

mod failures;

pub use failures::FailureCollector;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::errors::IngestError;
use crate::loader::{BatchAssembler, FlushReport, LoaderConfig};
use crate::router::TenantRouter;
use crate::source::{ArchiveReader, SourceMessage};
use vector_ingest_repository::VectorStoreClient;
use vector_ingest_shared::{ImportSummary, IngestionRecord, RunOutcome};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Records buffered between the reader thread and the driver.
    pub channel_buffer_size: usize,
    /// Number of store rejections kept for the summary.
    pub failure_preview: usize,
    /// Log progress every this many records. 0 disables progress lines.
    pub progress_every: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1,
            failure_preview: 3,
            progress_every: 1000,
        }
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Opening,
    Streaming,
    Draining,
    Done,
    Failed,
}

/// Cloneable handle that cancels a running orchestrator.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Ask the orchestrator to stop reading and drain.
    pub fn shutdown(&self) {
        let _ = self.sender.send(());
    }
}

/// Orchestrator that runs one archive through the pipeline.
///
/// The store client is passed in by the caller, which owns its lifetime.
/// The archive is opened at the start of `run` and closed on every exit path.
pub struct Orchestrator {
    client: Arc<dyn VectorStoreClient>,
    router: TenantRouter,
    loader_config: LoaderConfig,
    config: OrchestratorConfig,
    state: DriverState,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator with default configuration.
    pub fn new(client: Arc<dyn VectorStoreClient>, router: TenantRouter) -> Self {
        Self::with_config(
            client,
            router,
            LoaderConfig::default(),
            OrchestratorConfig::default(),
        )
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        client: Arc<dyn VectorStoreClient>,
        router: TenantRouter,
        loader_config: LoaderConfig,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            client,
            router,
            loader_config,
            config,
            state: DriverState::Idle,
            shutdown_tx,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Handle for cancelling the run from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: self.shutdown_tx.clone(),
        }
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Load every record in `archive_path` into the store.
    ///
    /// Records are processed in archive order with no retries. Store-side
    /// rejections are collected into the summary. Decode, routing and
    /// store-connection errors abort the run; the open batch is dropped.
    ///
    /// On cancellation the open batch is flushed and the summary is marked
    /// `Incomplete`.
    #[instrument(skip(self, archive_path), fields(archive = %archive_path.as_ref().display()))]
    pub async fn run(
        &mut self,
        archive_path: impl AsRef<Path>,
        multi_tenancy: bool,
    ) -> Result<ImportSummary, IngestError> {
        let started = Instant::now();
        let result = self
            .run_inner(archive_path.as_ref().to_path_buf(), multi_tenancy, started)
            .await;

        match &result {
            Ok(summary) => {
                self.state = DriverState::Done;
                info!(
                    processed = summary.processed,
                    failed = summary.failed,
                    batches = summary.batches,
                    complete = summary.is_complete(),
                    "Ingest run finished"
                );
            }
            Err(e) => {
                self.state = DriverState::Failed;
                error!(stage = e.stage(), error = %e, "Ingest run aborted");
            }
        }

        result
    }

    async fn run_inner(
        &mut self,
        archive_path: PathBuf,
        multi_tenancy: bool,
        started: Instant,
    ) -> Result<ImportSummary, IngestError> {
        if multi_tenancy {
            self.router.validate()?;
        }

        // Subscribing here ignores cancellations sent before the run started
        let shutdown_rx = self.shutdown_tx.subscribe();

        self.state = DriverState::Opening;
        let reader = tokio::task::spawn_blocking(move || ArchiveReader::open(archive_path))
            .await
            .map_err(|e| IngestError::channel(e.to_string()))??;
        let total = reader.len();

        info!(
            records = total,
            multi_tenancy = multi_tenancy,
            batch_size = self.loader_config.batch_size,
            collection = %self.loader_config.collection,
            "Starting import"
        );

        if reader.is_empty() {
            warn!("Archive contains no records");
        }

        let (tx, rx) = mpsc::channel::<SourceMessage>(self.config.channel_buffer_size.max(1));
        let reader_handle = tokio::task::spawn_blocking(move || reader.stream_into(tx));

        self.drive(rx, shutdown_rx, reader_handle, total, multi_tenancy, started)
            .await
    }

    /// Stream records from `rx` through the router and assembler, then drain.
    ///
    /// `rx` must end with `SourceMessage::End`. A channel that closes without
    /// it, or a reader task that fails, aborts the run.
    async fn drive(
        &mut self,
        mut rx: mpsc::Receiver<SourceMessage>,
        mut shutdown_rx: broadcast::Receiver<()>,
        reader_handle: JoinHandle<()>,
        total: usize,
        multi_tenancy: bool,
        started: Instant,
    ) -> Result<ImportSummary, IngestError> {
        let mut assembler =
            BatchAssembler::with_config(self.client.clone(), self.loader_config.clone());
        let mut failures = FailureCollector::new(self.config.failure_preview);
        let mut processed = 0usize;
        let mut cancelled = false;

        self.state = DriverState::Streaming;
        let streamed: Result<(), IngestError> = loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    warn!(processed = processed, total = total, "Import cancelled, draining open batch");
                    cancelled = true;
                    break Ok(());
                }
                message = rx.recv() => {
                    match message {
                        Some(SourceMessage::Record(record)) => {
                            match self.route_and_add(&mut assembler, record, multi_tenancy).await {
                                Ok(report) => {
                                    processed += 1;
                                    if let Some(report) = report {
                                        failures.record(report.failures);
                                    }
                                    self.log_progress(processed, total, &failures);
                                }
                                Err(e) => break Err(e),
                            }
                        }
                        Some(SourceMessage::Error(e)) => break Err(e),
                        Some(SourceMessage::End) => break Ok(()),
                        None => {
                            break Err(IngestError::channel(
                                "archive reader stopped before end of archive",
                            ))
                        }
                    }
                }
            }
        };

        // Stops the reader thread if it is still running, which closes the archive
        drop(rx);
        let joined = reader_handle.await;

        let streamed = match (streamed, joined) {
            (Err(e), joined) => {
                if let Err(join_error) = joined {
                    warn!(error = %join_error, "Archive reader task failed");
                }
                Err(e)
            }
            (Ok(()), Err(join_error)) => Err(IngestError::channel(format!(
                "archive reader task failed: {}",
                join_error
            ))),
            (Ok(()), Ok(())) => Ok(()),
        };

        if let Err(e) = streamed {
            if assembler.pending_len() > 0 {
                warn!(
                    discarded = assembler.pending_len(),
                    "Discarding open batch after fatal error"
                );
            }
            return Err(e);
        }

        self.state = DriverState::Draining;
        let batches_before_drain = assembler.flush_count();
        let report = assembler.close().await?;
        if !report.is_empty() {
            failures.record(report.failures);
        }
        let batches = batches_before_drain + usize::from(report.batch > 0);

        let outcome = if cancelled {
            RunOutcome::Incomplete
        } else {
            RunOutcome::Completed
        };

        Ok(failures.into_summary(processed, batches, started.elapsed(), outcome, Utc::now()))
    }

    /// Tag a record with its tenant and hand it to the assembler.
    async fn route_and_add(
        &self,
        assembler: &mut BatchAssembler,
        record: IngestionRecord,
        multi_tenancy: bool,
    ) -> Result<Option<FlushReport>, IngestError> {
        let tenant = self
            .router
            .route(&record.properties, multi_tenancy)
            .map_err(|e| {
                error!(id = %record.id, error = %e, "Failed to route record");
                e
            })?;

        assembler.add(record.with_tenant(tenant)).await
    }

    fn log_progress(&self, processed: usize, total: usize, failures: &FailureCollector) {
        let every = self.config.progress_every;
        if every > 0 && processed % every == 0 {
            info!(
                processed = processed,
                total = total,
                failed = failures.count(),
                "Importing objects"
            );
        }
    }
}
