// Initialization utilities
//
// Storage backend and logging/tracing setup

use anyhow::Result;
use opendal::Operator;
use sales2parquet_config::{LogFormat, LoggingConfig, RuntimeConfig, StorageBackend};
use tracing::info;

/// Build the storage operator from RuntimeConfig
pub fn init_storage(config: &RuntimeConfig) -> Result<Operator> {
    info!(
        "Initializing storage with backend: {}",
        config.storage.backend
    );

    match config.storage.backend {
        StorageBackend::Fs => {
            if let Some(fs) = config.storage.fs.as_ref() {
                info!("Using filesystem storage at: {}", fs.path);
            }
        }
        StorageBackend::S3 => {
            if let Some(s3) = config.storage.s3.as_ref() {
                info!(
                    "Using S3 storage: bucket={}, region={}, prefix={}",
                    s3.bucket,
                    s3.region,
                    s3.prefix.as_deref().unwrap_or("")
                );
            }
        }
    }

    sales2parquet_writer::build_operator(&config.storage)
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))
}

/// Initialize tracing/logging from the logging config
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Ignore the error if a subscriber is already set (idempotent)
    let _ = match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}
