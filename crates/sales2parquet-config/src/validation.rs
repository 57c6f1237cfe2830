// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_output_config(&config.output)?;
    validate_storage_config(&config.storage)?;
    validate_catalog_config(&config.catalog, &config.source)?;

    if config.logging.level.trim().is_empty() {
        bail!("logging.level must not be empty");
    }

    if let Some(name) = &config.job.name {
        if name.trim().is_empty() {
            bail!("job.name must not be empty when set");
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<()> {
    if config.path.trim_matches('/').is_empty() {
        bail!("output.path must name a directory below the storage root");
    }

    if config.max_rows_per_file == 0 {
        bail!("output.max_rows_per_file must be greater than 0");
    }

    if config.parquet_row_group_size == 0 {
        bail!("output.parquet_row_group_size must be greater than 0");
    }

    if config.parquet_row_group_size > config.max_rows_per_file {
        warn!(
            row_group_size = config.parquet_row_group_size,
            max_rows_per_file = config.max_rows_per_file,
            "output.parquet_row_group_size exceeds max_rows_per_file; files will hold a single row group"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::Fs => {
            let fs = config
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs storage backend requires 'fs' configuration"))?;

            if fs.path.is_empty() {
                bail!("storage.fs.path must not be empty");
            }
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 storage backend requires 's3' configuration"))?;

            if s3.bucket.is_empty() {
                bail!("storage.s3.bucket is required for S3 backend");
            }

            if s3.region.is_empty() {
                bail!("storage.s3.region is required for S3 backend");
            }
        }
    }

    Ok(())
}

fn validate_catalog_config(catalog: &CatalogConfig, source: &SourceConfig) -> Result<()> {
    for (i, table) in catalog.tables.iter().enumerate() {
        if table.database.is_empty() || table.name.is_empty() {
            bail!("catalog.tables[{}] requires database and name", i);
        }
        if table.location.trim_matches('/').is_empty() {
            bail!(
                "catalog.tables[{}] ({}.{}) requires a non-root location",
                i,
                table.database,
                table.name
            );
        }
        if catalog.tables[..i]
            .iter()
            .any(|t| t.database == table.database && t.name == table.name)
        {
            bail!(
                "catalog table {}.{} is registered more than once",
                table.database,
                table.name
            );
        }
    }

    if catalog.find(&source.database, &source.table).is_none() {
        bail!(
            "source table {}.{} is not registered in [[catalog.tables]]",
            source.database,
            source.table
        );
    }

    Ok(())
}
