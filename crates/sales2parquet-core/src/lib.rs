// sales2parquet-core - Pure record-batch logic for the sales ETL job
//
// Cleaning, enrichment, partitioning and Parquet encoding. No I/O, no
// async: loading from the catalog and writing to object storage live in
// sibling crates so these functions stay testable with small fixtures.

pub mod error;
pub mod parquet;
pub mod partition;
pub mod schema;
pub mod transform;

pub use error::{ErrorCode, EtlError, Result};
pub use partition::{split_partitions, Partition, PartitionKey};
pub use schema::validate_source_schema;
pub use transform::{DropNulls, Pipeline, PositiveFilter, Transform, YearMonth};

use arrow::array::RecordBatch;

/// Run the sales cleaning pipeline and split the result into partitions.
///
/// Returns the partitions in ascending `(year, month)` order together with the
/// number of retained rows.
pub fn clean_and_partition(batch: RecordBatch) -> Result<(Vec<Partition>, usize)> {
    let cleaned = Pipeline::sales_cleaning().run(batch)?;
    let retained = cleaned.num_rows();
    let partitions = split_partitions(&cleaned)?;
    Ok((partitions, retained))
}
