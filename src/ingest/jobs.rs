//! Ingest job catalog

use std::ops::RangeInclusive;

use crate::config::PipelineConfig;
use crate::fetcher::UpstreamTable;

/// Snapshot names shared by ingest (writer) and transform (reader)
pub const TRI_FACILITIES: &str = "tri_facilities";
pub const GHG_EMISSIONS: &str = "ghg_emissions";
pub const GHG_EMISSIONS_BY_SECTOR: &str = "ghg_emissions_by_sector";

/// How a job covers its upstream table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partitioning {
    /// Page through the whole table from row 0
    FullScan,
    /// Page through each reporting year separately
    ByYear(RangeInclusive<i32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestJob {
    /// Raw snapshot name the job writes
    pub name: String,
    pub table: UpstreamTable,
    pub partitioning: Partitioning,
    /// Rows per request window
    pub page_size: u64,
}

impl IngestJob {
    pub fn full_scan(name: &str, table: UpstreamTable, page_size: u64) -> Self {
        Self {
            name: name.to_string(),
            table,
            partitioning: Partitioning::FullScan,
            page_size,
        }
    }

    pub fn by_year(
        name: &str,
        table: UpstreamTable,
        years: RangeInclusive<i32>,
        page_size: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            table,
            partitioning: Partitioning::ByYear(years),
            page_size,
        }
    }
}

/// TRI facilities, GHG emissions by gas, GHG emissions by sector
pub fn default_jobs(config: &PipelineConfig) -> Vec<IngestJob> {
    vec![
        IngestJob::full_scan(TRI_FACILITIES, UpstreamTable::TriFacility, config.page_size),
        IngestJob::by_year(
            GHG_EMISSIONS,
            UpstreamTable::GhgEmitterGas,
            config.years(),
            config.partition_page_size,
        ),
        IngestJob::by_year(
            GHG_EMISSIONS_BY_SECTOR,
            UpstreamTable::GhgEmitterSector,
            config.years(),
            config.partition_page_size,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_jobs_follow_config() {
        let jobs = default_jobs(&PipelineConfig::default());

        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].name, TRI_FACILITIES);
        assert_eq!(jobs[0].partitioning, Partitioning::FullScan);
        assert_eq!(jobs[0].page_size, 10_000);

        assert_eq!(jobs[1].table, UpstreamTable::GhgEmitterGas);
        assert_eq!(jobs[1].partitioning, Partitioning::ByYear(2010..=2023));
        assert_eq!(jobs[1].page_size, 30_000);

        assert_eq!(jobs[2].name, GHG_EMISSIONS_BY_SECTOR);
        assert_eq!(jobs[2].table, UpstreamTable::GhgEmitterSector);
    }
}
