// sales2parquet - Batch job cleaning catalog sales data into partitioned Parquet
//
// Load -> drop nulls -> keep positive quantities -> derive year/month ->
// write year=/month= partitions -> commit.

pub mod init;
mod job;

pub use job::{JobContext, JobRun, JobSummary};

use sales2parquet_core::{clean_and_partition, validate_source_schema, Result};
use sales2parquet_source::{load_table, Catalog, TableIdent, TableReader};
use sales2parquet_writer::PartitionedWriter;

/// Run the job once against `catalog`.
///
/// The `_SUCCESS` marker is written only when every step succeeded. On error
/// the destination may hold a partial write and no marker.
pub async fn run_job(ctx: &JobContext, catalog: &dyn Catalog) -> Result<JobSummary> {
    let run = JobRun::start(ctx);

    let ident = TableIdent::new(&ctx.config.source.database, &ctx.config.source.table);
    let reader = TableReader::new(ctx.operator.clone());
    let batch = load_table(catalog, &reader, &ident).await?;
    let rows_read = batch.num_rows();

    validate_source_schema(batch.schema_ref())?;
    let (partitions, retained) = clean_and_partition(batch)?;
    tracing::info!(
        table = %ident,
        rows_read,
        rows_retained = retained,
        partitions = partitions.len(),
        "Cleaned source table"
    );

    let writer = PartitionedWriter::from_config(ctx.operator.clone(), &ctx.config.output);
    let written = writer.write(&partitions).await?;

    let summary = JobSummary {
        job_name: ctx.job_name.clone(),
        run_id: ctx.run_id.clone(),
        rows_read,
        rows_written: written.rows,
        partitions: written.partitions,
        files: written.files,
    };
    run.commit(&writer, &summary).await?;
    Ok(summary)
}
