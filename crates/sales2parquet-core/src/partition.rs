//! Splitting an enriched batch into `(year, month)` partitions.
//!
//! Partition values are carried by the Hive-style path
//! (`year=2023/month=5`), so the partition columns are removed from the
//! partition batches.

use crate::error::{EtlError, Result};
use crate::schema::{MONTH, PARTITION_COLUMNS, YEAR};
use arrow::array::{Array, AsArray, RecordBatch, RecordBatchOptions, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::Int32Type;
use std::collections::BTreeMap;

/// One output partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub year: i32,
    pub month: i32,
}

impl PartitionKey {
    pub fn new(year: i32, month: i32) -> Self {
        Self { year, month }
    }

    /// Relative directory for this partition, e.g. `year=2023/month=5`
    pub fn path(&self) -> String {
        format!("{}={}/{}={}", YEAR, self.year, MONTH, self.month)
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Rows of one partition, without the partition columns
#[derive(Debug, Clone)]
pub struct Partition {
    pub key: PartitionKey,
    pub batch: RecordBatch,
}

/// Group rows by distinct `(year, month)`.
///
/// Partitions come back in ascending key order; rows inside a partition keep
/// their input order.
pub fn split_partitions(batch: &RecordBatch) -> Result<Vec<Partition>> {
    let years = int32_column(batch, YEAR)?;
    let months = int32_column(batch, MONTH)?;

    let mut groups: BTreeMap<PartitionKey, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        if years.is_null(row) || months.is_null(row) {
            return Err(EtlError::schema_mismatch(format!(
                "row {} has a null partition value",
                row
            )));
        }
        let key = PartitionKey::new(years.value(row), months.value(row));
        let row = u32::try_from(row).map_err(|_| {
            EtlError::schema_mismatch("batch too large to partition in one pass")
        })?;
        groups.entry(key).or_default().push(row);
    }

    let data_columns: Vec<usize> = batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !PARTITION_COLUMNS.contains(&f.name().as_str()))
        .map(|(i, _)| i)
        .collect();
    let data = batch.project(&data_columns)?;

    groups
        .into_iter()
        .map(|(key, rows)| {
            let indices = UInt32Array::from(rows);
            let columns = data
                .columns()
                .iter()
                .map(|c| take(c.as_ref(), &indices, None))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let options = RecordBatchOptions::new().with_row_count(Some(indices.len()));
            let batch = RecordBatch::try_new_with_options(data.schema(), columns, &options)?;
            Ok(Partition { key, batch })
        })
        .collect()
}

fn int32_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a arrow::array::PrimitiveArray<Int32Type>> {
    crate::schema::column(batch, name)?
        .as_primitive_opt::<Int32Type>()
        .ok_or_else(|| {
            EtlError::schema_mismatch(format!("partition column '{}' must be Int32", name))
        })
}
