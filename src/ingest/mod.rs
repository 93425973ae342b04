//! Ingestion jobs: fetch full upstream tables and persist raw snapshots
//!
//! Every job accumulates all of its pages in memory and writes one snapshot
//! at the end. Jobs run sequentially so they share the limiter's budget.

pub mod jobs;
pub mod pagination;
pub mod runner;

pub use jobs::{
    default_jobs, IngestJob, Partitioning, GHG_EMISSIONS, GHG_EMISSIONS_BY_SECTOR, TRI_FACILITIES,
};
pub use pagination::{scan_pages, ScanOutcome};
pub use runner::{IngestRunner, JobReport};
