//! Rate-limited fetcher for the EPA Envirofacts tabular API
//!
//! ```text
//! TableQuery ──path()──▶ EnvirofactsClient
//!                           │  FixedWindowLimiter (shared, per attempt)
//!                           │  ExponentialBackoff (5xx only)
//!                           ▼
//!                        HttpTransport (reqwest in production)
//! ```

pub mod backoff;
pub mod client;
pub mod limiter;
pub mod query;
pub mod transport;

pub use backoff::{ExponentialBackoff, RetryPolicy};
pub use client::{EnvirofactsClient, FetchOutput};
pub use limiter::FixedWindowLimiter;
pub use query::{ResponseFormat, RowRange, TableQuery, UpstreamTable};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
