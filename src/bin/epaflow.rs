//! epaflow - EPA Envirofacts ingest and publish
//!
//! Usage:
//!   epaflow                     # ingest, then transform
//!   epaflow --ingest-only       # fetch raw snapshots only
//!   epaflow --transform-only    # rebuild datasets from existing snapshots
//!   epaflow --job tri_facilities --ingest-only
//!
//! Environment variables (a `.env` file is honored):
//!   EPA_BASE_URL, EPAFLOW_DATA_DIR, EPAFLOW_DB_PATH, EPA_RATE_LIMIT_CALLS,
//!   EPA_RATE_LIMIT_PERIOD_MS, EPA_MAX_RETRIES, EPA_BACKOFF_BASE_MS,
//!   EPA_REQUEST_TIMEOUT_SECS, EPA_PAGE_SIZE, EPA_PARTITION_PAGE_SIZE,
//!   GHG_FIRST_YEAR, GHG_LAST_YEAR, RUN_ID, RUST_LOG

use clap::Parser;
use dotenv::dotenv;
use log::{error, info};

use epaflow::phases::{run_ingest, run_transform};
use epaflow::{PipelineConfig, PipelineError, RunContext};

#[derive(Parser, Debug)]
#[command(name = "epaflow")]
#[command(about = "Ingest EPA Envirofacts tables and publish validated datasets")]
#[command(version)]
struct Cli {
    /// Only fetch data from the API
    #[arg(long, conflicts_with = "transform_only")]
    ingest_only: bool,

    /// Only transform existing raw data
    #[arg(long)]
    transform_only: bool,

    /// Restrict ingest to these jobs (repeatable)
    #[arg(long = "job", value_name = "NAME")]
    jobs: Vec<String>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    let config = PipelineConfig::from_env()?;
    config.validate()?;
    let ctx = RunContext::from_config(&config);

    info!("🚀 Starting epaflow");
    info!("   ├─ Run: {}", ctx.run_id);
    info!("   ├─ API: {}", config.base_url);
    info!("   ├─ Raw data: {}", config.data_dir.display());
    info!("   ├─ Database: {}", config.db_path.display());
    info!(
        "   └─ Rate limit: {} calls / {}ms",
        config.rate_limit_calls, config.rate_limit_period_ms
    );

    if !cli.transform_only {
        info!("");
        info!("=== Phase 1: Ingest ===");
        let reports = run_ingest(&config, &ctx, &cli.jobs).await?;
        for report in &reports {
            info!(
                "   ├─ {}: {} records in {} requests",
                report.name, report.records, report.requests
            );
        }
    }

    if !cli.ingest_only {
        info!("");
        info!("=== Phase 2: Transform ===");
        let reports = run_transform(&config, &ctx).await?;
        for report in &reports {
            info!("   ├─ {}: {} rows", report.dataset_id, report.rows);
        }
    }

    info!("✅ Run {} complete", ctx.run_id);
    Ok(())
}
