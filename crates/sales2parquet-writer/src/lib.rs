// sales2parquet-writer - Partitioned Parquet output
//
// Builds the storage operator and writes `(year, month)` partitions as a
// Hive-style dataset with overwrite semantics and a `_SUCCESS` marker.

pub mod path;
pub mod storage;
pub mod write;

pub use path::SUCCESS_MARKER;
pub use storage::build_operator;
pub use write::{PartitionedWriter, WriteSummary};
