//! Pipeline configuration from environment variables

use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Configuration for the ingest and transform runtime
///
/// Loaded from environment variables with the reference defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Envirofacts REST base (no trailing slash)
    pub base_url: String,

    /// Root directory for raw snapshots
    pub data_dir: PathBuf,

    /// SQLite database the publish sink writes to
    pub db_path: PathBuf,

    /// Requests admitted per rate-limit window
    pub rate_limit_calls: u32,

    /// Rate-limit window length in milliseconds
    pub rate_limit_period_ms: u64,

    /// Attempts per request (first try included)
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled per retry
    pub backoff_base_ms: u64,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Row window for unbounded full scans
    pub page_size: u64,

    /// Row window for each year partition
    pub partition_page_size: u64,

    pub first_year: i32,
    pub last_year: i32,

    /// Identifier stamped on published rows and metadata
    pub run_id: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.epa.gov/efservice".to_string(),
            data_dir: PathBuf::from("data"),
            db_path: PathBuf::from("data/epaflow.db"),
            rate_limit_calls: 5,
            rate_limit_period_ms: 1_000,
            max_retries: 3,
            backoff_base_ms: 1_000,
            request_timeout_secs: 120,
            page_size: 10_000,
            partition_page_size: 30_000,
            first_year: 2010,
            last_year: 2023,
            run_id: "local-run".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `EPA_BASE_URL` (default: https://data.epa.gov/efservice)
    /// - `EPAFLOW_DATA_DIR` (default: data)
    /// - `EPAFLOW_DB_PATH` (default: data/epaflow.db)
    /// - `EPA_RATE_LIMIT_CALLS` (default: 5)
    /// - `EPA_RATE_LIMIT_PERIOD_MS` (default: 1000)
    /// - `EPA_MAX_RETRIES` (default: 3)
    /// - `EPA_BACKOFF_BASE_MS` (default: 1000)
    /// - `EPA_REQUEST_TIMEOUT_SECS` (default: 120)
    /// - `EPA_PAGE_SIZE` (default: 10000)
    /// - `EPA_PARTITION_PAGE_SIZE` (default: 30000)
    /// - `GHG_FIRST_YEAR` / `GHG_LAST_YEAR` (default: 2010 / 2023)
    /// - `RUN_ID` (default: local-run)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            base_url: lookup("EPA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            data_dir: lookup("EPAFLOW_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            db_path: lookup("EPAFLOW_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            rate_limit_calls: parse_var(
                &lookup,
                "EPA_RATE_LIMIT_CALLS",
                defaults.rate_limit_calls,
            )?,
            rate_limit_period_ms: parse_var(
                &lookup,
                "EPA_RATE_LIMIT_PERIOD_MS",
                defaults.rate_limit_period_ms,
            )?,
            max_retries: parse_var(&lookup, "EPA_MAX_RETRIES", defaults.max_retries)?,
            backoff_base_ms: parse_var(&lookup, "EPA_BACKOFF_BASE_MS", defaults.backoff_base_ms)?,
            request_timeout_secs: parse_var(
                &lookup,
                "EPA_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            page_size: parse_var(&lookup, "EPA_PAGE_SIZE", defaults.page_size)?,
            partition_page_size: parse_var(
                &lookup,
                "EPA_PARTITION_PAGE_SIZE",
                defaults.partition_page_size,
            )?,
            first_year: parse_var(&lookup, "GHG_FIRST_YEAR", defaults.first_year)?,
            last_year: parse_var(&lookup, "GHG_LAST_YEAR", defaults.last_year)?,
            run_id: lookup("RUN_ID")
                .filter(|id| !id.trim().is_empty())
                .unwrap_or(defaults.run_id),
        })
    }

    /// Check the loaded values before any phase touches the network or disk
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "EPA_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let positive = [
            ("EPA_RATE_LIMIT_CALLS", self.rate_limit_calls as u64),
            ("EPA_RATE_LIMIT_PERIOD_MS", self.rate_limit_period_ms),
            ("EPA_MAX_RETRIES", self.max_retries as u64),
            ("EPA_REQUEST_TIMEOUT_SECS", self.request_timeout_secs),
            ("EPA_PAGE_SIZE", self.page_size),
            ("EPA_PARTITION_PAGE_SIZE", self.partition_page_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{name} must be greater than 0")));
            }
        }

        if self.first_year > self.last_year {
            return Err(ConfigError::InvalidValue(format!(
                "GHG_FIRST_YEAR ({}) is after GHG_LAST_YEAR ({})",
                self.first_year, self.last_year
            )));
        }

        Ok(())
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_millis(self.rate_limit_period_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{key}='{raw}' is not a valid number"))
        }),
    }
}
