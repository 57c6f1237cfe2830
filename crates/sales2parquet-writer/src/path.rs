//! Hive-style destination paths
//!
//! `<base>/year=<Y>/month=<M>/part-<NNNNN>-<hash16>.snappy.parquet`

use sales2parquet_core::PartitionKey;

pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Normalize a destination to directory form: no leading slash, one trailing
/// slash. The storage root itself normalizes to the empty string.
pub fn base_dir(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

pub fn partition_dir(base: &str, key: &PartitionKey) -> String {
    format!("{}{}/", base, key.path())
}

pub fn file_name(index: usize, hash_prefix: &str) -> String {
    format!("part-{:05}-{}.snappy.parquet", index, hash_prefix)
}

pub fn success_marker(base: &str) -> String {
    format!("{}{}", base, SUCCESS_MARKER)
}
