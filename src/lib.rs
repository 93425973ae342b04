//! epaflow: EPA Envirofacts ingest and publish pipeline
//!
//! Phase 1 pages every upstream table through a rate-limited client and
//! saves raw JSON snapshots. Phase 2 reloads those snapshots, aggregates the
//! GHG records, validates every dataset and publishes it to SQLite.


pub mod aggregate;
pub mod config;
pub mod context;
pub mod error;
pub mod fetcher;
pub mod ingest;
pub mod phases;
pub mod records;
pub mod storage;
pub mod table;
pub mod transform;
pub mod validation;

pub use config::PipelineConfig;
pub use context::RunContext;
pub use error::PipelineError;
