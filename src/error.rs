//! Error types shared across the ingest and transform phases

use crate::aggregate::AggregateError;
use crate::config::ConfigError;
use crate::table::TableError;
use crate::validation::ValidationError;

/// Failure talking to the upstream API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// Status code carried by a non-2xx failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reading or writing raw snapshots and published datasets
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid dataset id '{0}' (expected [a-z0-9_]+)")]
    InvalidDatasetId(String),
}

/// Top-level error surfaced by the CLI
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no records found for {0}")]
    NoRecords(String),

    #[error("{} dataset(s) failed: {}", .0.len(), format_failures(.0))]
    DatasetsFailed(Vec<(String, String)>),
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(id, message)| format!("{id} ({message})"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasets_failed_message_lists_every_dataset() {
        let err = PipelineError::DatasetsFailed(vec![
            ("epa_ghg_emissions_by_state".to_string(), "too few rows".to_string()),
            ("epa_ghg_emissions_by_gas".to_string(), "missing CO2".to_string()),
        ]);

        let message = err.to_string();
        assert!(message.starts_with("2 dataset(s) failed"));
        assert!(message.contains("epa_ghg_emissions_by_state (too few rows)"));
        assert!(message.contains("epa_ghg_emissions_by_gas (missing CO2)"));
    }

    #[test]
    fn test_fetch_error_status() {
        let err = FetchError::Status {
            status: 404,
            url: "https://example.test/x".to_string(),
            body: String::new(),
        };
        assert_eq!(err.status(), Some(404));

        let err = FetchError::Decode {
            url: "u".to_string(),
            message: "m".to_string(),
        };
        assert_eq!(err.status(), None);
    }
}
