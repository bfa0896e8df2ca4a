//! Audit trail of generation calls.
//!
//! Every structured generation, successful or not, leaves one record with
//! the task, the backend that served it and how many attempts it took.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Maximum records retained before the oldest are dropped.
const MAX_AUDIT_ENTRIES: usize = 10_000;

/// How a generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    Succeeded,
    /// Output never matched the schema
    SchemaRejected,
    BackendFailed,
    TimedOut,
    NoBackend,
}

/// One generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub record_id: String,
    /// Task label, e.g. `behavioral_notification`
    pub task: String,
    pub backend_id: Option<String>,
    pub attempts: u32,
    pub outcome: GenerationOutcome,
    /// Last error message, if any
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Bounded in-memory log of generation calls, newest first.
pub struct AuditLog {
    entries: Arc<RwLock<VecDeque<GenerationRecord>>>,
    max_entries: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(MAX_AUDIT_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            max_entries,
        }
    }

    pub async fn record(&self, record: GenerationRecord) {
        let mut entries = self.entries.write().await;
        entries.push_front(record);

        while entries.len() > self.max_entries {
            entries.pop_back();
        }
    }

    pub async fn recent(&self, limit: usize) -> Vec<GenerationRecord> {
        let entries = self.entries.read().await;
        entries.iter().take(limit).cloned().collect()
    }

    /// Most recent records for one task label.
    pub async fn by_task(&self, task: &str, limit: usize) -> Vec<GenerationRecord> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.task == task)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn stats(&self) -> AuditStats {
        let entries = self.entries.read().await;

        let total = entries.len();
        let count = |outcome: GenerationOutcome| entries.iter().filter(|e| e.outcome == outcome).count();

        let (avg_attempts, avg_duration_ms) = if total > 0 {
            let attempts: u64 = entries.iter().map(|e| u64::from(e.attempts)).sum();
            let duration: u64 = entries.iter().map(|e| e.duration_ms).sum();
            (attempts as f64 / total as f64, duration / total as u64)
        } else {
            (0.0, 0)
        };

        AuditStats {
            total,
            succeeded: count(GenerationOutcome::Succeeded),
            schema_rejected: count(GenerationOutcome::SchemaRejected),
            backend_failed: count(GenerationOutcome::BackendFailed),
            timed_out: count(GenerationOutcome::TimedOut),
            avg_attempts,
            avg_duration_ms,
        }
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary over the retained records.
#[derive(Debug, Clone, Serialize)]
pub struct AuditStats {
    pub total: usize,
    pub succeeded: usize,
    pub schema_rejected: usize,
    pub backend_failed: usize,
    pub timed_out: usize,
    pub avg_attempts: f64,
    pub avg_duration_ms: u64,
}
