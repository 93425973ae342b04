//! Drives ingest jobs through the fetcher and into the raw store

use crate::context::RunContext;
use crate::error::PipelineError;
use crate::fetcher::{EnvirofactsClient, RowRange};
use crate::records::RawRecord;
use crate::storage::RawStore;

use super::jobs::{IngestJob, Partitioning};
use super::pagination::scan_pages;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub name: String,
    pub records: usize,
    pub requests: usize,
    /// Partitions that returned no rows
    pub empty_partitions: Vec<i32>,
}

pub struct IngestRunner<'a> {
    client: &'a EnvirofactsClient,
    store: &'a RawStore,
    ctx: &'a RunContext,
}

impl<'a> IngestRunner<'a> {
    pub fn new(client: &'a EnvirofactsClient, store: &'a RawStore, ctx: &'a RunContext) -> Self {
        Self { client, store, ctx }
    }

    /// Run jobs one after another; the first failure aborts the rest
    pub async fn run_all(&self, jobs: &[IngestJob]) -> Result<Vec<JobReport>, PipelineError> {
        let mut reports = Vec::with_capacity(jobs.len());
        for job in jobs {
            log::info!("Processing {} ({})...", job.name, job.table.name());
            reports.push(self.run_job(job).await?);
        }
        Ok(reports)
    }

    /// Fetch every partition of one job, then save the whole result at once
    pub async fn run_job(&self, job: &IngestJob) -> Result<JobReport, PipelineError> {
        log::info!("  Fetching {} (run {})...", job.name, self.ctx.run_id);

        let mut all_records: Vec<RawRecord> = Vec::new();
        let mut requests = 0;
        let mut empty_partitions = Vec::new();

        match &job.partitioning {
            Partitioning::FullScan => {
                let (batch, batch_requests) = self.scan(job, None).await?;
                requests += batch_requests;
                all_records.extend(batch);
            }
            Partitioning::ByYear(years) => {
                for year in years.clone() {
                    log::info!("    Fetching {}...", year);
                    let (batch, batch_requests) = self.scan(job, Some(year)).await?;
                    requests += batch_requests;

                    if batch.is_empty() {
                        log::info!("      No data for {}", year);
                        empty_partitions.push(year);
                        continue;
                    }

                    log::info!("      Got {} records for {}", batch.len(), year);
                    all_records.extend(batch);
                }
            }
        }

        log::info!("  Total: {} {} records", all_records.len(), job.name);
        let path = self.store.save_raw(&all_records, &job.name)?;
        log::info!("  Saved raw {} data to {}", job.name, path.display());

        Ok(JobReport {
            name: job.name.clone(),
            records: all_records.len(),
            requests,
            empty_partitions,
        })
    }

    async fn scan(
        &self,
        job: &IngestJob,
        year: Option<i32>,
    ) -> Result<(Vec<RawRecord>, usize), PipelineError> {
        let label = match year {
            Some(year) => format!("{} {}", job.table.name(), year),
            None => job.table.name().to_string(),
        };
        let base = job.table.query(year, None, RowRange::window(0, job.page_size));
        let client = self.client;

        let outcome = scan_pages(job.page_size, &label, |rows| {
            let query = base.with_rows(rows);
            async move { client.fetch_rows(&query).await }
        })
        .await?;

        Ok((outcome.records, outcome.requests))
    }
}
