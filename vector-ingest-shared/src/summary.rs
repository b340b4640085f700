//! Run summary types.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An object the store rejected during a flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Id of the rejected object.
    pub id: String,
    /// Reason reported by the store.
    pub reason: String,
}

impl FailureRecord {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The archive was read to the end and every batch was flushed.
    Completed,
    /// The run was cancelled; only records up to the cancel point were sent.
    Incomplete,
}

/// Summary produced by the ingestion driver at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Records handed to the store, including the ones it rejected.
    pub processed: usize,
    /// Records the store rejected.
    pub failed: usize,
    /// The first few rejections, in the order they were reported.
    pub failure_preview: Vec<FailureRecord>,
    /// Number of batch-insert calls issued.
    pub batches: usize,
    /// Wall-clock time spent in the run.
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub outcome: RunOutcome,
    pub completed_at: DateTime<Utc>,
}

impl ImportSummary {
    /// Whether the run read the whole archive.
    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    /// Records the store accepted.
    pub fn succeeded(&self) -> usize {
        self.processed.saturating_sub(self.failed)
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            RunOutcome::Completed => write!(
                f,
                "Import completed. {} objects imported in {:.1}s.",
                self.processed,
                self.elapsed.as_secs_f64()
            )?,
            RunOutcome::Incomplete => write!(
                f,
                "Import interrupted. {} objects processed before cancellation.",
                self.processed
            )?,
        }

        if self.failed > 0 {
            let banner = "*".repeat(80);
            writeln!(f)?;
            writeln!(f, "{}", banner)?;
            writeln!(f, "***** Failed to add {} objects *****", self.failed)?;
            writeln!(f, "{}", banner)?;
            for failure in &self.failure_preview {
                writeln!(f, "  {}", failure)?;
            }
        }

        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(failed: usize, outcome: RunOutcome) -> ImportSummary {
        ImportSummary {
            processed: 5,
            failed,
            failure_preview: (0..failed.min(3))
                .map(|i| FailureRecord::new(format!("id-{}", i), "invalid vector"))
                .collect(),
            batches: 1,
            elapsed: Duration::from_millis(1500),
            outcome,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_without_failures() {
        let text = summary(0, RunOutcome::Completed).to_string();
        assert_eq!(text, "Import completed. 5 objects imported in 1.5s.");
    }

    #[test]
    fn test_display_lists_preview() {
        let text = summary(4, RunOutcome::Completed).to_string();
        assert!(text.contains("***** Failed to add 4 objects *****"));
        assert!(text.contains("id-0: invalid vector"));
        assert!(text.contains("id-2: invalid vector"));
        assert!(!text.contains("id-3"));
    }

    #[test]
    fn test_incomplete_run() {
        let s = summary(1, RunOutcome::Incomplete);
        assert!(!s.is_complete());
        assert_eq!(s.succeeded(), 4);
        assert!(s.to_string().starts_with("Import interrupted."));
    }
}
