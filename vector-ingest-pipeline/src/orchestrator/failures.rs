//! Collector for objects the store rejected.

use std::time::Duration;

use chrono::{DateTime, Utc};
use vector_ingest_shared::{FailureRecord, ImportSummary, RunOutcome};

/// Counts every rejection and keeps the first few for the summary.
#[derive(Debug)]
pub struct FailureCollector {
    count: usize,
    preview: Vec<FailureRecord>,
    preview_limit: usize,
}

impl FailureCollector {
    pub fn new(preview_limit: usize) -> Self {
        Self {
            count: 0,
            preview: Vec::with_capacity(preview_limit),
            preview_limit,
        }
    }

    /// Add the rejections from one flush.
    pub fn record(&mut self, failures: Vec<FailureRecord>) {
        self.count += failures.len();
        let room = self.preview_limit.saturating_sub(self.preview.len());
        self.preview.extend(failures.into_iter().take(room));
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn preview(&self) -> &[FailureRecord] {
        &self.preview
    }

    /// Build the run summary.
    pub fn into_summary(
        self,
        processed: usize,
        batches: usize,
        elapsed: Duration,
        outcome: RunOutcome,
        completed_at: DateTime<Utc>,
    ) -> ImportSummary {
        ImportSummary {
            processed,
            failed: self.count,
            failure_preview: self.preview,
            batches,
            elapsed,
            outcome,
            completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failures(ids: &[&str]) -> Vec<FailureRecord> {
        ids.iter().map(|id| FailureRecord::new(*id, "rejected")).collect()
    }

    #[test]
    fn test_counts_all_keeps_first() {
        let mut collector = FailureCollector::new(3);
        collector.record(failures(&["a", "b"]));
        collector.record(Vec::new());
        collector.record(failures(&["c", "d", "e"]));

        assert_eq!(collector.count(), 5);
        let ids: Vec<&str> = collector.preview().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_preview() {
        let mut collector = FailureCollector::new(0);
        collector.record(failures(&["a"]));

        let summary = collector.into_summary(
            1,
            1,
            Duration::ZERO,
            RunOutcome::Completed,
            Utc::now(),
        );
        assert_eq!(summary.failed, 1);
        assert!(summary.failure_preview.is_empty());
    }
}
