//! Partitioned dataset writes
//!
//! Each partition is encoded in memory (hashing while encoding), then uploaded
//! under its Hive-style directory. Encoding is deterministic, so file names
//! derived from the content hash are stable across reruns.

use crate::path::{base_dir, file_name, partition_dir, success_marker};
use opendal::{ErrorKind, Operator};
use parquet::file::properties::WriterProperties;
use sales2parquet_config::{OutputConfig, WriteMode};
use sales2parquet_core::parquet::{encode_parquet, writer_properties};
use sales2parquet_core::{EtlError, Partition, Result};

/// What a write produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub partitions: usize,
    pub rows: usize,
    /// Written object paths, in write order
    pub files: Vec<String>,
}

/// Writes partitions under a destination directory
pub struct PartitionedWriter {
    operator: Operator,
    base: String,
    mode: WriteMode,
    max_rows_per_file: usize,
    props: WriterProperties,
}

impl PartitionedWriter {
    pub fn new(operator: Operator, base_path: &str) -> Self {
        Self {
            operator,
            base: base_dir(base_path),
            mode: WriteMode::default(),
            max_rows_per_file: usize::MAX,
            props: writer_properties(sales2parquet_core::parquet::DEFAULT_ROW_GROUP_SIZE),
        }
    }

    pub fn from_config(operator: Operator, output: &OutputConfig) -> Self {
        Self::new(operator, &output.path)
            .with_mode(output.write_mode)
            .with_max_rows_per_file(output.max_rows_per_file)
            .with_row_group_size(output.parquet_row_group_size)
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_rows_per_file(mut self, max_rows: usize) -> Self {
        self.max_rows_per_file = max_rows.max(1);
        self
    }

    pub fn with_row_group_size(mut self, rows: usize) -> Self {
        self.props = writer_properties(rows);
        self
    }

    /// Replace the destination contents with `partitions` according to the
    /// write mode.
    ///
    /// Any `_SUCCESS` marker from an earlier run is removed first, so the
    /// destination is only marked committed again by `write_success_marker`.
    pub async fn write(&self, partitions: &[Partition]) -> Result<WriteSummary> {
        self.retract_success_marker().await?;

        match self.mode {
            WriteMode::Overwrite => {
                self.clear(&self.base).await?;
            }
            WriteMode::OverwritePartitions => {
                for partition in partitions {
                    self.clear(&partition_dir(&self.base, &partition.key)).await?;
                }
            }
        }

        let mut summary = WriteSummary::default();
        for partition in partitions {
            let written = self.write_partition(partition).await?;
            summary.partitions += 1;
            summary.rows += partition.batch.num_rows();
            summary.files.extend(written);
        }

        tracing::info!(
            destination = %self.base,
            mode = %self.mode,
            partitions = summary.partitions,
            files = summary.files.len(),
            rows = summary.rows,
            "Wrote partitioned dataset"
        );
        Ok(summary)
    }

    /// Write the empty `_SUCCESS` marker at the destination root.
    pub async fn write_success_marker(&self) -> Result<String> {
        let path = success_marker(&self.base);
        self.operator
            .write(&path, Vec::<u8>::new())
            .await
            .map_err(|e| EtlError::destination_write_failure(&path, e.to_string()))?;
        Ok(path)
    }

    async fn retract_success_marker(&self) -> Result<()> {
        let path = success_marker(&self.base);
        match self.operator.delete(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EtlError::destination_write_failure(&path, e.to_string())),
        }
    }

    async fn write_partition(&self, partition: &Partition) -> Result<Vec<String>> {
        let dir = partition_dir(&self.base, &partition.key);
        let batch = &partition.batch;
        let mut files = Vec::new();

        let mut offset = 0;
        let mut index = 0;
        while offset < batch.num_rows() {
            let len = self.max_rows_per_file.min(batch.num_rows() - offset);
            let slice = batch.slice(offset, len);
            let encoded = encode_parquet(&slice, &self.props)?;

            let path = format!("{}{}", dir, file_name(index, &encoded.hash_prefix()));
            let size = encoded.bytes.len();
            self.operator
                .write(&path, encoded.bytes)
                .await
                .map_err(|e| EtlError::destination_write_failure(&path, e.to_string()))?;

            tracing::debug!(path = %path, rows = len, bytes = size, "Wrote parquet file");
            files.push(path);
            offset += len;
            index += 1;
        }

        Ok(files)
    }

    /// Delete everything under `dir`, deepest entries first so directories on
    /// filesystem backends are empty by the time they are removed. A missing
    /// directory is not an error.
    async fn clear(&self, dir: &str) -> Result<()> {
        let failure = |e: opendal::Error| EtlError::destination_write_failure(dir, e.to_string());

        let entries = match self.operator.list_with(dir).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(failure(e)),
        };

        let mut paths: Vec<String> = entries
            .into_iter()
            .map(|entry| entry.path().to_string())
            .filter(|path| path != dir && !path.is_empty())
            .collect();
        paths.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        for path in &paths {
            match self.operator.delete(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(failure(e)),
            }
        }

        if !paths.is_empty() {
            tracing::debug!(dir = %dir, removed = paths.len(), "Cleared destination");
        }
        Ok(())
    }
}
