//! Job lifecycle: explicit run context and the commit-or-abort guard.

use opendal::Operator;
use sales2parquet_config::RuntimeConfig;
use sales2parquet_core::Result;
use sales2parquet_writer::PartitionedWriter;
use serde::Serialize;
use std::time::Instant;

/// Everything a run needs, built once at startup and passed explicitly
#[derive(Clone)]
pub struct JobContext {
    pub job_name: String,
    pub run_id: String,
    pub config: RuntimeConfig,
    pub operator: Operator,
}

impl JobContext {
    pub fn new(job_name: impl Into<String>, config: RuntimeConfig, operator: Operator) -> Self {
        Self {
            job_name: job_name.into(),
            run_id: uuid::Uuid::new_v4().to_string(),
            config,
            operator,
        }
    }

    /// Use an orchestrator-supplied run id instead of a generated one.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("job_name", &self.job_name)
            .field("run_id", &self.run_id)
            .field("storage", &self.config.storage.backend)
            .finish_non_exhaustive()
    }
}

/// Outcome of a committed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job_name: String,
    pub run_id: String,
    pub rows_read: usize,
    pub rows_written: usize,
    pub partitions: usize,
    pub files: Vec<String>,
}

/// Guard for one run.
///
/// `commit` writes the `_SUCCESS` marker. Dropping the guard without a
/// successful commit logs the run as aborted.
pub struct JobRun<'a> {
    ctx: &'a JobContext,
    started: Instant,
    committed: bool,
}

impl<'a> JobRun<'a> {
    pub fn start(ctx: &'a JobContext) -> Self {
        tracing::info!(job = %ctx.job_name, run_id = %ctx.run_id, "Job started");
        Self {
            ctx,
            started: Instant::now(),
            committed: false,
        }
    }

    pub async fn commit(mut self, writer: &PartitionedWriter, summary: &JobSummary) -> Result<()> {
        let marker = writer.write_success_marker().await?;
        self.committed = true;

        tracing::info!(
            job = %self.ctx.job_name,
            run_id = %self.ctx.run_id,
            rows_read = summary.rows_read,
            rows_written = summary.rows_written,
            partitions = summary.partitions,
            files = summary.files.len(),
            marker = %marker,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Job committed"
        );
        Ok(())
    }
}

impl Drop for JobRun<'_> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::error!(
                job = %self.ctx.job_name,
                run_id = %self.ctx.run_id,
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Job aborted before commit; destination may be partial"
            );
        }
    }
}
