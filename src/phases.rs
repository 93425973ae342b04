//! Wiring for the two CLI phases

use crate::config::{ConfigError, PipelineConfig};
use crate::context::RunContext;
use crate::error::PipelineError;
use crate::fetcher::EnvirofactsClient;
use crate::ingest::{default_jobs, IngestJob, IngestRunner, JobReport};
use crate::storage::{RawStore, SqlitePublisher};
use crate::transform::{DatasetLimits, PublishReport, TransformRunner};

/// Restrict the default jobs to `names`; an empty list keeps all of them
pub fn select_jobs(
    config: &PipelineConfig,
    names: &[String],
) -> Result<Vec<IngestJob>, ConfigError> {
    let jobs = default_jobs(config);
    if names.is_empty() {
        return Ok(jobs);
    }

    if let Some(unknown) = names.iter().find(|n| !jobs.iter().any(|j| &j.name == *n)) {
        let known: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
        return Err(ConfigError::InvalidValue(format!(
            "unknown job '{}' (expected one of: {})",
            unknown,
            known.join(", ")
        )));
    }

    Ok(jobs.into_iter().filter(|j| names.contains(&j.name)).collect())
}

pub async fn run_ingest(
    config: &PipelineConfig,
    ctx: &RunContext,
    job_names: &[String],
) -> Result<Vec<JobReport>, PipelineError> {
    let jobs = select_jobs(config, job_names)?;
    let client = EnvirofactsClient::from_config(config)?;
    let store = RawStore::new(&config.data_dir);

    IngestRunner::new(&client, &store, ctx).run_all(&jobs).await
}

pub async fn run_transform(
    config: &PipelineConfig,
    ctx: &RunContext,
) -> Result<Vec<PublishReport>, PipelineError> {
    let store = RawStore::new(&config.data_dir);
    let sink = SqlitePublisher::new(&config.db_path)?;
    let limits = DatasetLimits::from_config(config);

    TransformRunner::new(&store, &sink, ctx, limits).run_all().await
}
