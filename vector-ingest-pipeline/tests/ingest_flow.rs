//! End-to-end runs of the pipeline against a recording store.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use vector_ingest_pipeline::loader::LoaderConfig;
use vector_ingest_pipeline::orchestrator::{DriverState, Orchestrator, OrchestratorConfig};
use vector_ingest_pipeline::router::TenantRouter;
use vector_ingest_pipeline::source::{encode_vector, ArchiveWriter};
use vector_ingest_pipeline::IngestError;
use vector_ingest_repository::{BatchInsertResult, StoreError, StoreObject, VectorStoreClient};
use vector_ingest_shared::{FailureRecord, PropertyMap, VectorMap};

#[derive(Default)]
struct RecordingStore {
    batches: Mutex<Vec<Vec<String>>>,
    reject: Vec<String>,
    unavailable: bool,
}

impl RecordingStore {
    fn rejecting(ids: &[&str]) -> Self {
        Self {
            reject: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStoreClient for RecordingStore {
    async fn batch_insert(
        &self,
        collection: &str,
        objects: &[StoreObject],
    ) -> Result<BatchInsertResult, StoreError> {
        assert_eq!(collection, "SupportChat");
        if self.unavailable {
            return Err(StoreError::batch_rejected(503, "service unavailable"));
        }

        self.batches
            .lock()
            .unwrap()
            .push(objects.iter().map(|o| o.id.clone()).collect());

        let failures = objects
            .iter()
            .filter(|o| self.reject.contains(&o.id))
            .map(|o| FailureRecord::new(o.id.clone(), "vector lengths don't match"))
            .collect();
        Ok(BatchInsertResult::with_failures(objects.len(), failures))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.unavailable)
    }
}

fn record_parts(author: &str, dims: usize) -> (PropertyMap, VectorMap) {
    let mut properties = PropertyMap::new();
    properties.insert("company_author".to_string(), author.into());
    let mut vectors = VectorMap::new();
    vectors.insert("text_with_metadata".to_string(), vec![0.5; dims]);
    (properties, vectors)
}

fn archive_with(dir: &TempDir, count: usize) -> PathBuf {
    let path = dir.path().join("support.zip");
    let mut writer = ArchiveWriter::create(&path).unwrap();
    for i in 0..count {
        let (properties, vectors) = record_parts("AppleSupport", 4);
        writer
            .add_object(&format!("obj-{:04}", i), &properties, &vectors)
            .unwrap();
    }
    writer.finish().unwrap();
    path
}

fn driver(store: Arc<RecordingStore>, batch_size: usize) -> Orchestrator {
    Orchestrator::with_config(
        store,
        TenantRouter::default(),
        LoaderConfig {
            batch_size,
            ..LoaderConfig::default()
        },
        OrchestratorConfig::default(),
    )
}

#[tokio::test]
async fn flush_count_is_ceil_of_records_over_batch_size() {
    for (count, batch_size) in [(0, 3), (1, 3), (6, 3), (7, 3), (10, 1), (5, 200)] {
        let dir = TempDir::new().unwrap();
        let path = archive_with(&dir, count);
        let store = Arc::new(RecordingStore::default());

        let summary = driver(store.clone(), batch_size).run(&path, false).await.unwrap();

        let batches = store.batches();
        assert_eq!(batches.len(), count.div_ceil(batch_size), "count={count} batch_size={batch_size}");
        assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), count);
        assert_eq!(summary.processed, count);
        assert_eq!(summary.batches, batches.len());
    }
}

#[tokio::test]
async fn records_are_sent_in_archive_order() {
    let dir = TempDir::new().unwrap();
    let path = archive_with(&dir, 5);
    let store = Arc::new(RecordingStore::default());

    driver(store.clone(), 2).run(&path, false).await.unwrap();

    let ids: Vec<String> = store.batches().into_iter().flatten().collect();
    assert_eq!(ids, vec!["obj-0000", "obj-0001", "obj-0002", "obj-0003", "obj-0004"]);
}

#[tokio::test]
async fn partial_failure_is_isolated() {
    let dir = TempDir::new().unwrap();
    let path = archive_with(&dir, 5);
    let store = Arc::new(RecordingStore::rejecting(&["obj-0002"]));

    let summary = driver(store.clone(), 5).run(&path, false).await.unwrap();

    assert_eq!(summary.processed, 5);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded(), 4);
    assert_eq!(
        summary.failure_preview,
        vec![FailureRecord::new("obj-0002", "vector lengths don't match")]
    );
    // one call, nothing re-sent
    assert_eq!(store.batches().len(), 1);
}

#[tokio::test]
async fn final_short_batch_is_flushed_on_drain() {
    let dir = TempDir::new().unwrap();
    let path = archive_with(&dir, 7);
    let store = Arc::new(RecordingStore::default());

    driver(store.clone(), 3).run(&path, false).await.unwrap();

    let sizes: Vec<usize> = store.batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[tokio::test]
async fn dimension_mismatch_aborts_before_reaching_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("support.zip");
    let mut writer = ArchiveWriter::create(&path).unwrap();
    let (properties, vectors) = record_parts("Acme", 4);
    writer.add_object("a", &properties, &vectors).unwrap();
    let (properties, vectors) = record_parts("Acme", 3);
    writer.add_object("b", &properties, &vectors).unwrap();
    writer.finish().unwrap();

    let store = Arc::new(RecordingStore::default());
    let mut driver = driver(store.clone(), 1);
    let result = driver.run(&path, false).await;

    match result {
        Err(e @ IngestError::VectorDecodeError { .. }) => assert_eq!(e.stage(), "decode"),
        other => panic!("expected vector decode error, got {:?}", other),
    }
    assert_eq!(driver.state(), DriverState::Failed);
    // "a" was flushed on its own, "b" never left the client
    assert_eq!(store.batches(), vec![vec!["a".to_string()]]);
}

#[tokio::test]
async fn missing_vector_slot_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("support.zip");
    let mut writer = ArchiveWriter::create(&path).unwrap();
    writer.add_raw_entry("a/object", br#"{"company_author": "Acme"}"#).unwrap();
    writer.add_raw_entry("a/vector_text", &encode_vector(&[1.0, 2.0])).unwrap();
    writer.finish().unwrap();

    let store = Arc::new(RecordingStore::default());
    let result = driver(store.clone(), 2).run(&path, false).await;

    assert!(matches!(result, Err(IngestError::MissingVectorSlot { .. })));
    assert!(store.batches().is_empty());
}

#[tokio::test]
async fn store_unavailable_aborts_run() {
    let dir = TempDir::new().unwrap();
    let path = archive_with(&dir, 3);
    let store = Arc::new(RecordingStore {
        unavailable: true,
        ..RecordingStore::default()
    });

    let result = driver(store, 2).run(&path, false).await;

    match result {
        Err(e @ IngestError::StoreUnavailable(_)) => assert_eq!(e.stage(), "store-connect"),
        other => panic!("expected store unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn three_record_scenario() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("support.zip");
    let mut writer = ArchiveWriter::create(&path).unwrap();
    for (id, author) in [("a", "Acme"), ("b", "Globex"), ("c", "")] {
        let (properties, vectors) = record_parts(author, 4);
        writer.add_object(id, &properties, &vectors).unwrap();
    }
    writer.finish().unwrap();

    let store = Arc::new(RecordingStore::default());
    let summary = driver(store.clone(), 2).run(&path, false).await.unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 0);
    assert!(summary.is_complete());
    assert_eq!(
        store.batches(),
        vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string()],
        ]
    );
}

#[tokio::test]
async fn archive_can_be_read_again_by_reopening() {
    let dir = TempDir::new().unwrap();
    let path = archive_with(&dir, 4);
    let store = Arc::new(RecordingStore::default());
    let mut driver = driver(store.clone(), 4);

    let first = driver.run(&path, true).await.unwrap();
    let second = driver.run(&path, true).await.unwrap();

    assert_eq!(first.processed, 4);
    assert_eq!(second.processed, 4);
    assert_eq!(store.batches().len(), 2);
}
