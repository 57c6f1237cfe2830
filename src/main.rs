use anyhow::{Context, Result};
use clap::Parser;
use sales2parquet::init::{init_storage, init_tracing};
use sales2parquet::{run_job, JobContext};
use sales2parquet_config::RuntimeConfig;
use sales2parquet_source::StaticCatalog;
use std::path::PathBuf;

/// Clean the raw sales table and write it as year/month partitioned Parquet
#[derive(Parser)]
#[command(name = "sales2parquet")]
#[command(version)]
#[command(about = "Clean the raw sales table and write it as year/month partitioned Parquet", long_about = None)]
struct Cli {
    /// Job name assigned by the orchestrator
    #[arg(long = "JOB_NAME", value_name = "NAME")]
    job_name: Option<String>,

    /// Run id assigned by the orchestrator (generated when absent)
    #[arg(long = "JOB_RUN_ID", value_name = "ID")]
    job_run_id: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load().context("Failed to load configuration")?
    };

    // --JOB_NAME wins over the config file and environment
    if let Some(name) = cli.job_name {
        config.job.name = Some(name);
    }
    let job_name = config
        .job
        .name
        .clone()
        .context("A job name is required: pass --JOB_NAME <name>")?;

    init_tracing(&config.logging);

    let operator = init_storage(&config)?;
    let catalog = StaticCatalog::from_config(&config.catalog);

    let mut ctx = JobContext::new(job_name, config, operator);
    if let Some(run_id) = cli.job_run_id {
        ctx = ctx.with_run_id(run_id);
    }

    let summary = run_job(&ctx, &catalog)
        .await
        .with_context(|| format!("Job '{}' failed", ctx.job_name))?;

    // Machine-readable run summary for the orchestrator
    println!(
        "{}",
        serde_json::to_string(&summary).context("Failed to serialize job summary")?
    );
    Ok(())
}
