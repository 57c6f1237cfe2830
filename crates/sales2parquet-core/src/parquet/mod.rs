// Parquet file writing
//
// This module handles encoding Arrow RecordBatches to Parquet bytes.

pub mod writer;

pub use writer::{encode_parquet, writer_properties, EncodedParquet, DEFAULT_ROW_GROUP_SIZE};
