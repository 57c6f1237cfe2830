//! Materializes a catalog table into a single record batch.

use crate::catalog::{TableIdent, TableLocation};
use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::json::reader::{infer_json_schema, ReaderBuilder};
use bytes::Bytes;
use opendal::{ErrorKind, Operator};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use sales2parquet_config::TableFormat;
use sales2parquet_core::{EtlError, Result};
use std::io::Cursor;
use std::sync::Arc;

/// Reads table files through an OpenDAL operator
#[derive(Clone)]
pub struct TableReader {
    operator: Operator,
}

impl TableReader {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Load every data file under `location` and concatenate them.
    ///
    /// Hidden and bookkeeping files (`_SUCCESS`, `.crc`, ...) are skipped.
    /// Files are read in lexical path order so row order is stable across runs.
    pub async fn load(&self, ident: &TableIdent, location: &TableLocation) -> Result<RecordBatch> {
        let unavailable = |reason: String| EtlError::source_unavailable(ident.to_string(), reason);

        let files = self.data_files(location).await.map_err(|e| {
            unavailable(format!("cannot list '{}': {}", location.location, e))
        })?;
        if files.is_empty() {
            return Err(unavailable(format!(
                "no {} files under '{}'",
                location.format, location.location
            )));
        }

        let mut contents = Vec::with_capacity(files.len());
        for path in &files {
            let buffer = self
                .operator
                .read(path)
                .await
                .map_err(|e| unavailable(format!("cannot read '{}': {}", path, e)))?;
            contents.push((path.as_str(), buffer.to_bytes()));
        }

        let (schema, batches) = match location.format {
            TableFormat::Parquet => decode_parquet(&contents),
            TableFormat::Jsonl => decode_jsonl(&contents),
        }
        .map_err(unavailable)?;

        let batch = concat_batches(&schema, &batches)
            .map_err(|e| unavailable(format!("table files disagree on schema: {}", e)))?;

        tracing::info!(
            table = %ident,
            location = %location.location,
            files = files.len(),
            rows = batch.num_rows(),
            "Loaded source table"
        );
        Ok(batch)
    }

    async fn data_files(&self, location: &TableLocation) -> opendal::Result<Vec<String>> {
        let root = dir_path(&location.location);
        let entries = match self.operator.list_with(&root).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let extensions = location.format.extensions();
        let mut files: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().is_file())
            .map(|entry| entry.path().to_string())
            .filter(|path| is_data_file(path.strip_prefix(root.as_str()).unwrap_or(path), extensions))
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Directory form of a location: no leading slash, exactly one trailing slash
fn dir_path(location: &str) -> String {
    let trimmed = location.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// `path` is relative to the table location.
fn is_data_file(path: &str, extensions: &[&str]) -> bool {
    let hidden = path
        .split('/')
        .any(|segment| segment.starts_with('_') || segment.starts_with('.'));
    let name = path.rsplit('/').next().unwrap_or(path);
    !hidden && extensions.iter().any(|ext| name.ends_with(ext))
}

type Decoded = std::result::Result<(SchemaRef, Vec<RecordBatch>), String>;

fn decode_parquet(files: &[(&str, Bytes)]) -> Decoded {
    let mut schema = None;
    let mut batches = Vec::new();

    for (path, bytes) in files {
        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes.clone())
            .map_err(|e| format!("cannot decode '{}': {}", path, e))?;
        schema.get_or_insert_with(|| builder.schema().clone());

        let reader = builder
            .build()
            .map_err(|e| format!("cannot decode '{}': {}", path, e))?;
        for batch in reader {
            batches.push(batch.map_err(|e| format!("cannot decode '{}': {}", path, e))?);
        }
    }

    let schema = schema.ok_or_else(|| "no parquet files".to_string())?;
    Ok((schema, batches))
}

/// Newline-delimited JSON. The schema is inferred over every file so that a
/// column missing from one file still lines up with the others.
fn decode_jsonl(files: &[(&str, Bytes)]) -> Decoded {
    let mut combined = Vec::new();
    for (_, bytes) in files {
        combined.extend_from_slice(bytes);
        if !bytes.ends_with(b"\n") {
            combined.push(b'\n');
        }
    }

    let (schema, _) = infer_json_schema(Cursor::new(&combined), None)
        .map_err(|e| format!("cannot infer json schema: {}", e))?;
    let schema = Arc::new(schema);

    let reader = ReaderBuilder::new(schema.clone())
        .build(Cursor::new(&combined))
        .map_err(|e| format!("cannot decode json lines: {}", e))?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("cannot decode json lines: {}", e))?;

    Ok((schema, batches))
}
