//! Storage operator construction
//!
//! The operator is built once per job and handed to both the table reader and
//! the partitioned writer.

use sales2parquet_config::{StorageBackend, StorageConfig};
use sales2parquet_core::{EtlError, Result};

/// Build an OpenDAL operator for the configured backend.
///
/// For S3, a configured prefix becomes the operator root so every key the
/// job touches lives under it.
pub fn build_operator(config: &StorageConfig) -> Result<opendal::Operator> {
    let operator = match config.backend {
        StorageBackend::Fs => {
            let fs = config.fs.as_ref().ok_or_else(|| {
                EtlError::invalid_config("fs config required for filesystem backend")
            })?;

            let fs_builder = opendal::services::Fs::default().root(&fs.path);
            opendal::Operator::new(fs_builder)
                .map_err(|e| {
                    EtlError::invalid_config(format!(
                        "Failed to create filesystem operator: {}",
                        e
                    ))
                })?
                .finish()
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| EtlError::invalid_config("s3 config required for S3 backend"))?;

            let mut s3_builder = opendal::services::S3::default()
                .bucket(&s3.bucket)
                .region(&s3.region);

            if let Some(endpoint) = &s3.endpoint {
                s3_builder = s3_builder.endpoint(endpoint);
            }
            if let Some(prefix) = &s3.prefix {
                s3_builder = s3_builder.root(&format!("/{}", prefix.trim_matches('/')));
            }

            opendal::Operator::new(s3_builder)
                .map_err(|e| {
                    EtlError::invalid_config(format!("Failed to create S3 operator: {}", e))
                })?
                .finish()
        }
    };

    tracing::debug!(backend = %config.backend, "Storage operator initialized");
    Ok(operator)
}
