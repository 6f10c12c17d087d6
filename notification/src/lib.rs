//! Run summaries and the completion notifier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub name: String,
    pub status: StageStatus,
    pub attempts: u32,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub pipeline: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub status: RunStatus,
    pub stages: Vec<StageReport>,
    pub source_digest: Option<String>,
    pub table_rows: BTreeMap<String, usize>,
}

impl RunSummary {
    /// Derives the run status from the stage reports: any failed or skipped
    /// stage fails the run.
    pub fn new(
        run_id: Uuid,
        pipeline: &str,
        started_at: DateTime<Utc>,
        stages: Vec<StageReport>,
    ) -> Self {
        let finished_at = Utc::now();
        let status = if stages
            .iter()
            .all(|stage| stage.status == StageStatus::Succeeded)
        {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };

        Self {
            run_id,
            pipeline: pipeline.to_string(),
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            status,
            stages,
            source_digest: None,
            table_rows: BTreeMap::new(),
        }
    }

    pub fn with_source_digest(mut self, digest: Option<String>) -> Self {
        self.source_digest = digest;
        self
    }

    pub fn with_table_rows(mut self, table_rows: BTreeMap<String, usize>) -> Self {
        self.table_rows = table_rows;
        self
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn failed_stages(&self) -> impl Iterator<Item = &StageReport> {
        self.stages
            .iter()
            .filter(|stage| stage.status == StageStatus::Failed)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &RunSummary) -> Result<()>;
}

/// Reports the run through the log; e-mail or chat delivery plugs in as
/// another [`Notifier`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, summary: &RunSummary) -> Result<()> {
        let payload = serde_json::to_string(summary)?;

        match summary.status {
            RunStatus::Succeeded => info!(
                run_id = %summary.run_id,
                pipeline = %summary.pipeline,
                duration_ms = summary.duration_ms,
                tables = ?summary.table_rows,
                summary = %payload,
                "Pipeline finished successfully"
            ),
            RunStatus::Failed => {
                for stage in summary.failed_stages() {
                    error!(
                        run_id = %summary.run_id,
                        stage = %stage.name,
                        attempts = stage.attempts,
                        error = stage.error.as_deref().unwrap_or("unknown"),
                        "Stage failed"
                    );
                }
                error!(
                    run_id = %summary.run_id,
                    pipeline = %summary.pipeline,
                    summary = %payload,
                    "Pipeline failed"
                );
            }
        }

        Ok(())
    }
}
