//! End-to-end job runs against in-memory and local filesystem stores.
//!
//! Seeds `raw/sales/` with Parquet files, runs the whole job and reads the
//! partitioned output back.

use arrow::array::{
    Array, AsArray, Float64Array, Int64Array, RecordBatch, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Int64Type, Schema, TimeUnit};
use opendal::{services, Operator};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use sales2parquet::init::init_storage;
use sales2parquet::{run_job, JobContext};
use sales2parquet_config::{FsConfig, Platform, RuntimeConfig, StorageBackend, WriteMode};
use sales2parquet_core::ErrorCode;
use sales2parquet_source::StaticCatalog;
use std::sync::Arc;

// 2023-05-10T08:00:00Z
const MAY_10_2023: i64 = 1_683_705_600_000_000;
// 2023-06-01T00:00:00Z
const JUNE_1_2023: i64 = 1_685_577_600_000_000;
// 2024-01-15T00:00:00Z
const JAN_15_2024: i64 = 1_705_276_800_000_000;

const OUTPUT: &str = "processed/sales_parquet/";

fn raw_sales() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(
            "sale_datetime",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
        Field::new("quantity", DataType::Int64, true),
        Field::new("revenue", DataType::Float64, true),
        Field::new("product_id", DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(TimestampMicrosecondArray::from(vec![
                Some(MAY_10_2023),
                Some(MAY_10_2023),
                None,
                Some(JUNE_1_2023),
                Some(JUNE_1_2023),
            ])),
            Arc::new(Int64Array::from(vec![Some(5), Some(0), Some(3), Some(2), Some(-1)])),
            Arc::new(Float64Array::from(vec![
                Some(99.50),
                Some(50.00),
                Some(10.00),
                Some(20.00),
                Some(4.00),
            ])),
            Arc::new(StringArray::from(vec!["p-1", "p-2", "p-3", "p-4", "p-5"])),
        ],
    )
    .unwrap()
}

fn sale_at(micros: i64) -> RecordBatch {
    let schema = raw_sales().schema();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(TimestampMicrosecondArray::from(vec![micros])),
            Arc::new(Int64Array::from(vec![1])),
            Arc::new(Float64Array::from(vec![12.5])),
            Arc::new(StringArray::from(vec!["p-9"])),
        ],
    )
    .unwrap()
}

fn parquet_bytes(batch: &RecordBatch) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
    buffer
}

async fn seeded_context() -> JobContext {
    let op = Operator::new(services::Memory::default()).unwrap().finish();
    op.write("raw/sales/part-00000.parquet", parquet_bytes(&raw_sales()))
        .await
        .unwrap();

    let config = RuntimeConfig::from_platform_defaults(Platform::Local);
    JobContext::new("sales-etl", config, op)
}

/// Context backed by a local directory through the configured fs backend.
async fn fs_context(root: &std::path::Path, mode: WriteMode) -> JobContext {
    let mut config = RuntimeConfig::from_platform_defaults(Platform::Local);
    config.storage.backend = StorageBackend::Fs;
    config.storage.fs = Some(FsConfig {
        path: root.to_str().unwrap().to_string(),
    });
    config.output.write_mode = mode;

    let op = init_storage(&config).unwrap();
    op.write("raw/sales/part-00000.parquet", parquet_bytes(&raw_sales()))
        .await
        .unwrap();
    JobContext::new("sales-etl", config, op)
}

fn catalog(ctx: &JobContext) -> StaticCatalog {
    StaticCatalog::from_config(&ctx.config.catalog)
}

async fn output_files(op: &Operator) -> Vec<String> {
    let mut files: Vec<String> = op
        .list_with(OUTPUT)
        .recursive(true)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.metadata().is_file())
        .map(|e| e.path().to_string())
        .collect();
    files.sort();
    files
}

async fn read_parquet(op: &Operator, path: &str) -> RecordBatch {
    let bytes = op.read(path).await.unwrap().to_bytes();
    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
    arrow::compute::concat_batches(&batches[0].schema(), &batches).unwrap()
}

#[tokio::test]
async fn job_writes_partitioned_dataset_and_commits() {
    let ctx = seeded_context().await;
    let summary = run_job(&ctx, &catalog(&ctx)).await.unwrap();

    assert_eq!(summary.job_name, "sales-etl");
    assert_eq!(summary.rows_read, 5);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.partitions, 2);

    let files = output_files(&ctx.operator).await;
    assert_eq!(files.len(), 3);
    assert_eq!(files[0], "processed/sales_parquet/_SUCCESS");
    assert!(files[1].starts_with("processed/sales_parquet/year=2023/month=5/part-00000-"));
    assert!(files[2].starts_with("processed/sales_parquet/year=2023/month=6/part-00000-"));

    let may = read_parquet(&ctx.operator, &files[1]).await;
    assert_eq!(may.num_rows(), 1);
    assert!(may.schema().field_with_name("year").is_err());
    assert_eq!(may.column_by_name("product_id").unwrap().as_string::<i32>().value(0), "p-1");
    let quantity = may.column_by_name("quantity").unwrap().as_primitive::<Int64Type>();
    assert_eq!(quantity.value(0), 5);
    assert_eq!(may.column_by_name("sale_datetime").unwrap().null_count(), 0);
}

#[tokio::test]
async fn rerun_produces_identical_output() {
    let ctx = seeded_context().await;
    let catalog = catalog(&ctx);

    let first = run_job(&ctx, &catalog).await.unwrap();
    let before = output_files(&ctx.operator).await;
    let second = run_job(&ctx, &catalog).await.unwrap();
    let after = output_files(&ctx.operator).await;

    assert_eq!(first.files, second.files);
    assert_eq!(before, after);
}

#[tokio::test]
async fn overwrite_replaces_previous_dataset() {
    let ctx = seeded_context().await;
    ctx.operator
        .write("processed/sales_parquet/year=2019/month=1/part-00000-old.snappy.parquet", b"old".to_vec())
        .await
        .unwrap();

    run_job(&ctx, &catalog(&ctx)).await.unwrap();

    let files = output_files(&ctx.operator).await;
    assert!(files.iter().all(|f| !f.contains("year=2019")));
}

#[tokio::test]
async fn overwrite_partitions_keeps_other_months() {
    let mut ctx = seeded_context().await;
    ctx.config.output.write_mode = WriteMode::OverwritePartitions;
    ctx.operator
        .write("processed/sales_parquet/year=2019/month=1/part-00000-old.snappy.parquet", b"old".to_vec())
        .await
        .unwrap();

    run_job(&ctx, &catalog(&ctx)).await.unwrap();

    let files = output_files(&ctx.operator).await;
    assert!(files.iter().any(|f| f.contains("year=2019/month=1/")));
    assert_eq!(files.len(), 4);
}

#[tokio::test]
async fn missing_source_fails_without_commit() {
    let op = Operator::new(services::Memory::default()).unwrap().finish();
    let ctx = JobContext::new(
        "sales-etl",
        RuntimeConfig::from_platform_defaults(Platform::Local),
        op,
    );

    let err = run_job(&ctx, &catalog(&ctx)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::E001SourceUnavailable);
    assert!(ctx
        .operator
        .stat("processed/sales_parquet/_SUCCESS")
        .await
        .is_err());
}

#[tokio::test]
async fn malformed_timestamp_fails_without_commit() {
    let op = Operator::new(services::Memory::default()).unwrap().finish();
    let schema = Arc::new(Schema::new(vec![
        Field::new("sale_datetime", DataType::Utf8, true),
        Field::new("quantity", DataType::Int64, true),
        Field::new("revenue", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["2023-05-10 08:00:00", "yesterday"])),
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(Float64Array::from(vec![1.0, 2.0])),
        ],
    )
    .unwrap();
    op.write("raw/sales/part-00000.parquet", parquet_bytes(&batch))
        .await
        .unwrap();

    let ctx = JobContext::new(
        "sales-etl",
        RuntimeConfig::from_platform_defaults(Platform::Local),
        op,
    )
    .with_run_id("jr_0001");

    let err = run_job(&ctx, &catalog(&ctx)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::E002MalformedTimestamp);
    assert!(output_files(&ctx.operator).await.is_empty());
}

#[tokio::test]
async fn overwrite_on_filesystem_removes_old_partition_directories() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = fs_context(dir.path(), WriteMode::Overwrite).await;
    let catalog = catalog(&ctx);
    let output = dir.path().join("processed/sales_parquet");

    run_job(&ctx, &catalog).await.unwrap();
    assert!(output.join("year=2023/month=5").is_dir());
    assert!(output.join("year=2023/month=6").is_dir());

    ctx.operator
        .write("raw/sales/part-00000.parquet", parquet_bytes(&sale_at(JAN_15_2024)))
        .await
        .unwrap();
    let summary = run_job(&ctx, &catalog).await.unwrap();

    assert_eq!(summary.partitions, 1);
    assert!(!output.join("year=2023").exists());
    assert!(output.join("year=2024/month=1").is_dir());
    assert!(output.join("_SUCCESS").is_file());
}

#[tokio::test]
async fn failed_partition_write_leaves_no_marker() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = fs_context(dir.path(), WriteMode::OverwritePartitions).await;
    let catalog = catalog(&ctx);
    let output = dir.path().join("processed/sales_parquet");

    run_job(&ctx, &catalog).await.unwrap();
    assert!(output.join("_SUCCESS").is_file());

    // a plain file where the June partition directory belongs
    let june = output.join("year=2023/month=6");
    std::fs::remove_dir_all(&june).unwrap();
    std::fs::write(&june, b"not a directory").unwrap();

    let err = run_job(&ctx, &catalog).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::E003DestinationWriteFailure);
    assert!(!output.join("_SUCCESS").exists());
}
