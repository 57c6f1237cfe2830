// Platform detection based on environment variables
//
// Auto-detects runtime environment:
// - AWS: AWS_EXECUTION_ENV or GLUE_VERSION present
// - Local: neither present (default)

use crate::LogFormat;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Local,
    Aws,
}

impl Platform {
    /// Auto-detect the current platform based on environment variables
    pub fn detect() -> Self {
        if env::var("AWS_EXECUTION_ENV").is_ok() || env::var("GLUE_VERSION").is_ok() {
            Platform::Aws
        } else {
            Platform::Local
        }
    }

    /// Get platform-specific defaults
    pub fn defaults(&self) -> PlatformDefaults {
        match self {
            Platform::Local => PlatformDefaults {
                storage_backend: "fs",
                s3_bucket: "",
                max_rows_per_file: 1_000_000,
                log_format: LogFormat::Text,
            },
            Platform::Aws => PlatformDefaults {
                storage_backend: "s3",
                s3_bucket: "zs-pharma-etl",
                max_rows_per_file: 1_000_000,
                log_format: LogFormat::Json,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlatformDefaults {
    pub storage_backend: &'static str,
    pub s3_bucket: &'static str,
    pub max_rows_per_file: usize,
    pub log_format: LogFormat,
}
