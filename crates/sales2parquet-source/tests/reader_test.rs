// Integration tests for table loading against in-memory and filesystem storage

use arrow::array::{Array, AsArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use opendal::{services, Operator};
use parquet::arrow::ArrowWriter;
use sales2parquet_config::{CatalogConfig, CatalogTable, TableFormat};
use sales2parquet_core::ErrorCode;
use sales2parquet_source::{load_table, StaticCatalog, TableIdent, TableReader};
use std::sync::Arc;

fn memory_operator() -> Operator {
    Operator::new(services::Memory::default()).unwrap().finish()
}

fn sales_batch(quantities: Vec<i64>) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("sale_datetime", DataType::Utf8, true),
        Field::new("quantity", DataType::Int64, true),
        Field::new("revenue", DataType::Float64, true),
    ]));
    let n = quantities.len();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["2023-05-10 08:00:00"; n])),
            Arc::new(Int64Array::from(quantities)),
            Arc::new(Float64Array::from(vec![1.0; n])),
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

fn catalog(format: TableFormat) -> StaticCatalog {
    StaticCatalog::from_config(&CatalogConfig {
        tables: vec![CatalogTable {
            database: "zs-pharma-db".to_string(),
            name: "raw".to_string(),
            location: "raw/sales/".to_string(),
            format,
        }],
    })
}

fn raw() -> TableIdent {
    TableIdent::new("zs-pharma-db", "raw")
}

#[tokio::test]
async fn loads_parquet_files_in_path_order() {
    let op = memory_operator();
    op.write("raw/sales/b/part-1.parquet", parquet_bytes(&sales_batch(vec![3, 4])))
        .await
        .unwrap();
    op.write("raw/sales/a/part-0.parquet", parquet_bytes(&sales_batch(vec![1, 2])))
        .await
        .unwrap();
    op.write("raw/sales/_SUCCESS", Vec::<u8>::new()).await.unwrap();
    op.write("raw/sales/README.md", b"not data".to_vec()).await.unwrap();

    let reader = TableReader::new(op);
    let batch = load_table(&catalog(TableFormat::Parquet), &reader, &raw())
        .await
        .unwrap();

    let quantity = batch.column_by_name("quantity").unwrap().as_primitive::<Int64Type>();
    assert_eq!(quantity.values().to_vec(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn loads_json_lines() {
    let op = memory_operator();
    op.write(
        "raw/sales/day1.jsonl",
        b"{\"sale_datetime\":\"2023-05-10T08:00:00\",\"quantity\":5,\"revenue\":99.5}\n\
          {\"sale_datetime\":null,\"quantity\":3,\"revenue\":10.0}\n"
            .to_vec(),
    )
    .await
    .unwrap();

    let reader = TableReader::new(op);
    let batch = load_table(&catalog(TableFormat::Jsonl), &reader, &raw())
        .await
        .unwrap();

    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.column_by_name("sale_datetime").unwrap().null_count(), 1);
}

#[tokio::test]
async fn empty_location_is_source_unavailable() {
    let op = memory_operator();
    op.write("raw/sales/_SUCCESS", Vec::<u8>::new()).await.unwrap();

    let reader = TableReader::new(op);
    let err = load_table(&catalog(TableFormat::Parquet), &reader, &raw())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::E001SourceUnavailable);
}

#[tokio::test]
async fn corrupt_file_is_source_unavailable() {
    let op = memory_operator();
    op.write("raw/sales/part-0.parquet", b"definitely not parquet".to_vec())
        .await
        .unwrap();

    let reader = TableReader::new(op);
    let err = load_table(&catalog(TableFormat::Parquet), &reader, &raw())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::E001SourceUnavailable);
    assert!(err.to_string().contains("part-0.parquet"));
}

#[tokio::test]
async fn unregistered_table_is_source_unavailable() {
    let reader = TableReader::new(memory_operator());
    let err = load_table(
        &catalog(TableFormat::Parquet),
        &reader,
        &TableIdent::new("zs-pharma-db", "curated"),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::E001SourceUnavailable);
}

#[tokio::test]
async fn loads_from_local_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let table_dir = dir.path().join("raw/sales");
    std::fs::create_dir_all(&table_dir).unwrap();
    std::fs::write(table_dir.join("part-0.parquet"), parquet_bytes(&sales_batch(vec![7]))).unwrap();

    let root = dir.path().to_str().unwrap();
    let op = Operator::new(services::Fs::default().root(root)).unwrap().finish();

    let batch = load_table(&catalog(TableFormat::Parquet), &TableReader::new(op), &raw())
        .await
        .unwrap();
    assert_eq!(batch.num_rows(), 1);
}
