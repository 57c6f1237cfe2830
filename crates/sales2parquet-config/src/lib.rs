// sales2parquet-config - Runtime configuration for the sales ETL job
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from SALES2PARQUET_CONFIG env var
// 3. Config file contents from SALES2PARQUET_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.sales2parquet.toml)
// 5. Platform-specific defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod env_overrides;
mod platform;
mod sources;
mod validation;

pub use platform::{Platform, PlatformDefaults};

/// Main runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub job: JobConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub output: OutputConfig,

    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Job identity. The name is normally supplied by the orchestrator via `--JOB_NAME`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Catalog table the job reads from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub database: String,
    pub table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database: "zs-pharma-db".to_string(),
            table: "raw".to_string(),
        }
    }
}

/// Tables known to the static catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub tables: Vec<CatalogTable>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tables: vec![CatalogTable {
                database: "zs-pharma-db".to_string(),
                name: "raw".to_string(),
                location: "raw/sales/".to_string(),
                format: TableFormat::Parquet,
            }],
        }
    }
}

impl CatalogConfig {
    /// Look up a registered table by database and name.
    pub fn find(&self, database: &str, name: &str) -> Option<&CatalogTable> {
        self.tables
            .iter()
            .find(|t| t.database == database && t.name == name)
    }
}

/// A single catalog entry: where a table lives and how it is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub database: String,
    pub name: String,
    /// Location relative to the storage root (e.g., "raw/sales/")
    pub location: String,
    #[serde(default)]
    pub format: TableFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Parquet,
    Jsonl,
}

impl TableFormat {
    /// File extensions recognized as data files for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            TableFormat::Parquet => &[".parquet"],
            TableFormat::Jsonl => &[".jsonl", ".json", ".ndjson"],
        }
    }
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableFormat::Parquet => write!(f, "parquet"),
            TableFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl std::str::FromStr for TableFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "parquet" => Ok(TableFormat::Parquet),
            "jsonl" | "json" | "ndjson" => Ok(TableFormat::Jsonl),
            _ => anyhow::bail!("Unsupported table format: {}. Supported: parquet, jsonl", s),
        }
    }
}

/// Output dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination relative to the storage root
    pub path: String,
    #[serde(default)]
    pub write_mode: WriteMode,
    #[serde(default = "default_max_rows_per_file")]
    pub max_rows_per_file: usize,
    #[serde(default = "default_parquet_row_group_size")]
    pub parquet_row_group_size: usize,
}

fn default_max_rows_per_file() -> usize {
    1_000_000
}

fn default_parquet_row_group_size() -> usize {
    32 * 1024
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "processed/sales_parquet/".to_string(),
            write_mode: WriteMode::default(),
            max_rows_per_file: default_max_rows_per_file(),
            parquet_row_group_size: default_parquet_row_group_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Replace everything under the destination
    #[default]
    Overwrite,
    /// Replace only the partitions written by this run
    OverwritePartitions,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Overwrite => write!(f, "overwrite"),
            WriteMode::OverwritePartitions => write!(f, "overwrite_partitions"),
        }
    }
}

impl std::str::FromStr for WriteMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "overwrite" => Ok(WriteMode::Overwrite),
            "overwrite_partitions" | "dynamic" => Ok(WriteMode::OverwritePartitions),
            _ => anyhow::bail!(
                "Unsupported write mode: {}. Supported: overwrite, overwrite_partitions",
                s
            ),
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Optional path prefix applied to every key (e.g., "staging/")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config(Platform::detect())
    }

    /// Load configuration from a specific file path (for the `--config` flag).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Construct a config that contains only platform defaults (no env or files).
    pub fn from_platform_defaults(platform: Platform) -> Self {
        platform_defaults(platform)
    }

    /// Merge another config into this one (used for TOML layering).
    pub fn merge(&mut self, other: RuntimeConfig) {
        if other.job.name.is_some() {
            self.job = other.job;
        }
        self.source = other.source;
        self.catalog = other.catalog;
        self.output = other.output;
        self.storage = other.storage;
        self.logging = other.logging;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

fn platform_defaults(platform: Platform) -> RuntimeConfig {
    let defaults = platform.defaults();

    let storage_backend = defaults
        .storage_backend
        .parse::<StorageBackend>()
        .unwrap_or(StorageBackend::Fs);

    let storage = match storage_backend {
        StorageBackend::Fs => StorageConfig {
            backend: StorageBackend::Fs,
            fs: Some(FsConfig::default()),
            s3: None,
        },
        StorageBackend::S3 => StorageConfig {
            backend: StorageBackend::S3,
            fs: None,
            s3: Some(S3Config {
                bucket: defaults.s3_bucket.to_string(),
                region: "us-east-1".to_string(),
                endpoint: None,
                prefix: None,
            }),
        },
    };

    RuntimeConfig {
        job: JobConfig::default(),
        source: SourceConfig::default(),
        catalog: CatalogConfig::default(),
        output: OutputConfig {
            max_rows_per_file: defaults.max_rows_per_file,
            ..OutputConfig::default()
        },
        storage,
        logging: LoggingConfig {
            level: "info".to_string(),
            format: defaults.log_format,
        },
    }
}
