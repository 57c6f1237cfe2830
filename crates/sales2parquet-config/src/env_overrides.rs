use super::{FsConfig, LogFormat, RuntimeConfig, S3Config, StorageBackend, WriteMode};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "SALES2PARQUET_";

/// Abstraction over environment-variable lookups so tests and embedders
/// can supply their own source of overrides.
pub trait EnvSource {
    /// Get a variable by its name without the SALES2PARQUET_ prefix
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    if let Some(name) = get_env_string(env, "JOB_NAME") {
        config.job.name = Some(name);
    }

    // Source table
    if let Some(database) = get_env_string(env, "SOURCE_DATABASE") {
        config.source.database = database;
    }
    if let Some(table) = get_env_string(env, "SOURCE_TABLE") {
        config.source.table = table;
    }

    // Output
    if let Some(path) = get_env_string(env, "OUTPUT_PATH") {
        config.output.path = path;
    }
    if let Some(mode) = get_env_string(env, "WRITE_MODE") {
        config.output.write_mode = mode
            .parse::<WriteMode>()
            .context("Invalid SALES2PARQUET_WRITE_MODE value")?;
    }
    if let Some(val) = get_env_usize(env, "MAX_ROWS_PER_FILE")? {
        config.output.max_rows_per_file = val;
    }
    if let Some(val) = get_env_usize(env, "PARQUET_ROW_GROUP_SIZE")? {
        config.output.parquet_row_group_size = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.logging.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    // Storage backend
    if let Some(backend) = get_env_string(env, "STORAGE_BACKEND") {
        config.storage.backend = backend
            .parse::<StorageBackend>()
            .context("Invalid SALES2PARQUET_STORAGE_BACKEND value")?;
    }

    // Filesystem storage
    if let Some(path) = get_env_string(env, "STORAGE_PATH") {
        config.storage.fs.get_or_insert_with(FsConfig::default).path = path;
    }

    // S3 storage
    if let Some(bucket) = get_env_string(env, "S3_BUCKET") {
        ensure_s3(config).bucket = bucket;
    }
    if let Some(region) = get_env_string(env, "S3_REGION") {
        ensure_s3(config).region = region;
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT") {
        ensure_s3(config).endpoint = Some(endpoint);
    }
    if let Some(prefix) = get_env_string(env, "S3_PREFIX") {
        ensure_s3(config).prefix = normalize_prefix(prefix);
    }

    Ok(())
}

fn ensure_s3(config: &mut RuntimeConfig) -> &mut S3Config {
    config.storage.s3.get_or_insert_with(|| S3Config {
        bucket: String::new(),
        region: String::new(),
        endpoint: None,
        prefix: None,
    })
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn normalize_prefix(prefix: String) -> Option<String> {
    if prefix.is_empty() {
        None
    } else if prefix.ends_with('/') {
        Some(prefix)
    } else {
        Some(format!("{}/", prefix))
    }
}
