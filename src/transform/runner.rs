//! Loads raw snapshots, builds each dataset, validates and publishes it

use crate::aggregate::{aggregate_by_gas, aggregate_by_sector, aggregate_by_state};
use crate::context::RunContext;
use crate::error::PipelineError;
use crate::ingest::{GHG_EMISSIONS, GHG_EMISSIONS_BY_SECTOR, TRI_FACILITIES};
use crate::records::RawRecord;
use crate::storage::{DatasetMetadata, PublishSink, RawStore, UploadMode};
use crate::table::Table;
use crate::validation::ValidationError;

use super::datasets::{
    ghg_by_gas_metadata, ghg_by_sector_metadata, ghg_by_state_metadata, tri_facilities_metadata,
    DatasetLimits,
};
use super::ghg_emissions::{check_by_gas, check_by_sector, check_by_state};
use super::tri_facilities;

type Check = fn(&Table, &DatasetLimits) -> Result<(), ValidationError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub dataset_id: String,
    pub rows: usize,
}

pub struct TransformRunner<'a> {
    store: &'a RawStore,
    sink: &'a dyn PublishSink,
    ctx: &'a RunContext,
    limits: DatasetLimits,
}

impl<'a> TransformRunner<'a> {
    pub fn new(
        store: &'a RawStore,
        sink: &'a dyn PublishSink,
        ctx: &'a RunContext,
        limits: DatasetLimits,
    ) -> Self {
        Self {
            store,
            sink,
            ctx,
            limits,
        }
    }

    /// Publish every dataset that passes its checks
    ///
    /// A dataset that fails is skipped and reported at the end through
    /// `PipelineError::DatasetsFailed`. Missing TRI records and raw-store read
    /// errors abort immediately.
    pub async fn run_all(&self) -> Result<Vec<PublishReport>, PipelineError> {
        let mut reports = Vec::new();
        let mut failures = Vec::new();

        log::info!("Transforming TRI facilities...");
        let outcome = self.run_tri_facilities().await;
        record_outcome(outcome, tri_facilities_metadata().id, &mut reports, &mut failures)?;

        log::info!("Transforming GHG emissions...");
        log::info!("  Loading raw GHG emissions data...");
        let raw_gas = self.store.load_raw(GHG_EMISSIONS)?;
        let raw_sector = self.store.load_raw(GHG_EMISSIONS_BY_SECTOR)?;

        let outcome = self.run_ghg_by_state(&raw_gas).await;
        record_outcome(outcome, ghg_by_state_metadata().id, &mut reports, &mut failures)?;

        let outcome = self.run_ghg_by_sector(&raw_sector).await;
        record_outcome(outcome, ghg_by_sector_metadata().id, &mut reports, &mut failures)?;

        let outcome = self.run_ghg_by_gas(&raw_gas).await;
        record_outcome(outcome, ghg_by_gas_metadata().id, &mut reports, &mut failures)?;

        if !failures.is_empty() {
            return Err(PipelineError::DatasetsFailed(failures));
        }

        log::info!("  Done!");
        Ok(reports)
    }

    pub async fn run_tri_facilities(&self) -> Result<PublishReport, PipelineError> {
        let records = self.store.load_raw(TRI_FACILITIES)?;
        if records.is_empty() {
            return Err(PipelineError::NoRecords(TRI_FACILITIES.to_string()));
        }

        let table = tri_facilities::normalize(&records);
        log::info!("  Transformed {} TRI facilities", table.num_rows());

        self.publish_checked(
            &table,
            &tri_facilities_metadata(),
            UploadMode::Overwrite,
            tri_facilities::check,
        )
        .await
    }

    pub async fn run_ghg_by_state(
        &self,
        raw: &[RawRecord],
    ) -> Result<PublishReport, PipelineError> {
        log::info!("  Aggregating by state...");
        let table = Table::from_rows(&aggregate_by_state(raw)?);
        log::info!("    {} state-year combinations", table.num_rows());

        let metadata = ghg_by_state_metadata();
        self.publish_checked(&table, &metadata, UploadMode::Append, check_by_state)
            .await
    }

    pub async fn run_ghg_by_sector(
        &self,
        raw: &[RawRecord],
    ) -> Result<PublishReport, PipelineError> {
        log::info!("  Aggregating by sector...");
        let table = Table::from_rows(&aggregate_by_sector(raw)?);
        log::info!("    {} sector-year combinations", table.num_rows());

        let metadata = ghg_by_sector_metadata();
        self.publish_checked(&table, &metadata, UploadMode::Append, check_by_sector)
            .await
    }

    pub async fn run_ghg_by_gas(&self, raw: &[RawRecord]) -> Result<PublishReport, PipelineError> {
        log::info!("  Aggregating by gas type...");
        let table = Table::from_rows(&aggregate_by_gas(raw)?);
        log::info!("    {} gas-year combinations", table.num_rows());

        self.publish_checked(&table, &ghg_by_gas_metadata(), UploadMode::Append, check_by_gas)
            .await
    }

    /// Nothing reaches the sink unless `check` passes
    async fn publish_checked(
        &self,
        table: &Table,
        metadata: &DatasetMetadata,
        mode: UploadMode,
        check: Check,
    ) -> Result<PublishReport, PipelineError> {
        check(table, &self.limits)?;

        let rows = self.sink.upload(table, &metadata.id, mode, self.ctx).await?;
        self.sink.publish(&metadata.id, metadata, self.ctx).await?;
        log::info!("  ✅ Published {} ({} rows, {:?})", metadata.id, rows, mode);

        Ok(PublishReport {
            dataset_id: metadata.id.clone(),
            rows,
        })
    }
}

/// Keep going past a failed dataset unless the failure is fatal to the run
fn record_outcome(
    outcome: Result<PublishReport, PipelineError>,
    dataset_id: String,
    reports: &mut Vec<PublishReport>,
    failures: &mut Vec<(String, String)>,
) -> Result<(), PipelineError> {
    match outcome {
        Ok(report) => reports.push(report),
        Err(err @ (PipelineError::NoRecords(_) | PipelineError::Storage(_))) => return Err(err),
        Err(err) => {
            log::error!("❌ {} not published: {}", dataset_id, err);
            failures.push((dataset_id, err.to_string()));
        }
    }
    Ok(())
}
