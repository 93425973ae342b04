//! Envirofacts client: rate limited, retrying GETs against the tabular API

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::FetchError;
use crate::records::RawRecord;

use super::backoff::RetryPolicy;
use super::limiter::FixedWindowLimiter;
use super::query::{ResponseFormat, TableQuery};
use super::transport::{HttpResponse, HttpTransport, ReqwestTransport};

/// Longest body excerpt carried in a status error
const ERROR_BODY_EXCERPT: usize = 300;

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutput {
    Rows(Vec<RawRecord>),
    Text(String),
}

pub struct EnvirofactsClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<FixedWindowLimiter>,
    retry: RetryPolicy,
}

impl EnvirofactsClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        limiter: Arc<FixedWindowLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            limiter,
            retry,
        }
    }

    /// Production client built from configuration, with its own limiter
    pub fn from_config(config: &PipelineConfig) -> Result<Self, FetchError> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        let limiter = Arc::new(FixedWindowLimiter::new(
            config.rate_limit_calls,
            config.rate_limit_period(),
        ));
        let retry = RetryPolicy::new(config.max_retries, config.backoff_base());

        Ok(Self::new(config.base_url.clone(), transport, limiter, retry))
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path`, retrying 5xx responses with exponential backoff
    ///
    /// Every attempt takes a limiter slot. Returns the last response whatever
    /// its status; only transport failures are errors here.
    pub async fn send_with_retry(&self, path: &str) -> Result<HttpResponse, FetchError> {
        let url = self.url_for(path);
        let mut backoff = self.retry.backoff();
        let mut attempt = 1;

        loop {
            self.limiter.acquire().await;
            let response = self.transport.get(&url).await?;

            if response.is_server_error() && attempt < self.retry.max_attempts {
                log::warn!(
                    "      API returned {} for {} (attempt {}/{})",
                    response.status,
                    path,
                    attempt,
                    self.retry.max_attempts
                );
                if backoff.sleep().await.is_err() {
                    return Ok(response);
                }
                attempt += 1;
                continue;
            }

            if response.is_server_error() {
                log::error!(
                    "❌ API returned {} for {} after {} attempts",
                    response.status,
                    path,
                    attempt
                );
            }

            return Ok(response);
        }
    }

    /// Fetch one query and decode the body according to its format
    pub async fn fetch(&self, query: &TableQuery) -> Result<FetchOutput, FetchError> {
        let path = query.path();
        let response = self.send_with_retry(&path).await?;

        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                url: self.url_for(&path),
                body: excerpt(&response.body),
            });
        }

        match query.format {
            ResponseFormat::Json => {
                decode_rows(&self.url_for(&path), &response.body).map(FetchOutput::Rows)
            }
            ResponseFormat::Csv | ResponseFormat::Xml => Ok(FetchOutput::Text(response.body)),
        }
    }

    /// Fetch one query as JSON rows
    pub async fn fetch_rows(&self, query: &TableQuery) -> Result<Vec<RawRecord>, FetchError> {
        let query = query.clone().format(ResponseFormat::Json);
        match self.fetch(&query).await? {
            FetchOutput::Rows(rows) => Ok(rows),
            FetchOutput::Text(_) => Err(FetchError::Decode {
                url: self.url_for(&query.path()),
                message: "expected JSON rows".to_string(),
            }),
        }
    }
}

fn decode_rows(url: &str, body: &str) -> Result<Vec<RawRecord>, FetchError> {
    // An empty partition can come back as an empty body
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str::<Vec<RawRecord>>(body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::fetcher::query::RowRange;

    /// Replays a fixed list of responses and records requested URLs
    struct ScriptedTransport {
        responses: Mutex<VecDeque<HttpResponse>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.urls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.urls.lock().unwrap().push(url.to_string());
            let next = self.responses.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| HttpResponse::new(500, "script exhausted")))
        }
    }

    fn client(transport: Arc<ScriptedTransport>, attempts: u32) -> EnvirofactsClient {
        EnvirofactsClient::new(
            "https://example.test/efservice/",
            transport,
            Arc::new(FixedWindowLimiter::new(5, Duration::from_secs(1))),
            RetryPolicy::new(attempts, Duration::from_secs(1)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_is_attempted_exactly_max_times() {
        let transport = ScriptedTransport::new(vec![
            HttpResponse::new(500, "a"),
            HttpResponse::new(502, "b"),
            HttpResponse::new(503, "c"),
            HttpResponse::new(200, "[]"),
        ]);
        let client = client(transport.clone(), 3);

        let response = client.send_with_retry("tri_facility/rows/0:9/JSON").await.unwrap();

        assert_eq!(transport.calls(), 3);
        assert_eq!(response, HttpResponse::new(503, "c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_second_attempt_stops_retrying() {
        let transport = ScriptedTransport::new(vec![
            HttpResponse::new(500, ""),
            HttpResponse::new(200, r#"[{"id": 1}]"#),
        ]);
        let client = client(transport.clone(), 3);

        let start = tokio::time::Instant::now();
        let response = client.send_with_retry("x").await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(response.status, 200);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_take_their_own_limiter_slot() {
        let transport = ScriptedTransport::new(vec![
            HttpResponse::new(500, ""),
            HttpResponse::new(200, "[]"),
        ]);
        let client = EnvirofactsClient::new(
            "https://example.test/efservice",
            transport.clone(),
            Arc::new(FixedWindowLimiter::new(1, Duration::from_secs(10))),
            RetryPolicy::new(2, Duration::ZERO),
        );

        let start = tokio::time::Instant::now();
        let response = client.send_with_retry("x").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.calls(), 2);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let transport = ScriptedTransport::new(vec![HttpResponse::new(404, "no such table")]);
        let client = client(transport.clone(), 3);
        let query = TableQuery::new("nope", RowRange::window(0, 10));

        let err = client.fetch(&query).await.unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_as_status_error() {
        let transport = ScriptedTransport::new(vec![]);
        let client = client(transport.clone(), 2);
        let query = TableQuery::new("tri_facility", RowRange::window(0, 10));

        let err = client.fetch(&query).await.unwrap_err();

        assert_eq!(transport.calls(), 2);
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_builds_url_and_decodes_rows() {
        let transport = ScriptedTransport::new(vec![HttpResponse::new(
            200,
            r#"[{"state": "CA", "co2e_emission": 12.5}, {"state": "TX", "co2e_emission": null}]"#,
        )]);
        let client = client(transport.clone(), 3);
        let query =
            TableQuery::new("ghg_emitter_gas", RowRange::window(0, 30_000)).filter("year", 2020);

        let rows = client.fetch_rows(&query).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["state"], "CA");
        assert_eq!(
            transport.urls.lock().unwrap()[0],
            "https://example.test/efservice/ghg_emitter_gas/year/=/2020/rows/0:29999/JSON"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_formats_are_returned_raw() {
        let transport = ScriptedTransport::new(vec![HttpResponse::new(200, "a,b\n1,2\n")]);
        let client = client(transport, 3);
        let query =
            TableQuery::new("tri_facility", RowRange::window(0, 1)).format(ResponseFormat::Csv);

        let output = client.fetch(&query).await.unwrap();
        assert_eq!(output, FetchOutput::Text("a,b\n1,2\n".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_json_is_a_decode_error() {
        let transport = ScriptedTransport::new(vec![HttpResponse::new(200, "<html>oops</html>")]);
        let client = client(transport, 3);
        let query = TableQuery::new("tri_facility", RowRange::window(0, 1));

        let err = client.fetch_rows(&query).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let body = "x".repeat(1_000);
        let short = excerpt(&body);
        assert_eq!(short.len(), ERROR_BODY_EXCERPT + 3);
        assert_eq!(excerpt("short"), "short");
    }
}
