use chrono::{DateTime, Utc};

use crate::config::PipelineConfig;

/// Identity of a single ingest/transform run
///
/// Passed explicitly to every job that tags its output.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.run_id.clone())
    }

    /// Unix timestamp of the run start
    pub fn started_at_ts(&self) -> i64 {
        self.started_at.timestamp()
    }
}
