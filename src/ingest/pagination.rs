//! Bounded-window scan over a result set of unknown size

use std::future::Future;

use crate::error::FetchError;
use crate::fetcher::RowRange;
use crate::records::RawRecord;

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub records: Vec<RawRecord>,
    pub requests: usize,
}

/// Request `[0, W-1]`, `[W, 2W-1]`, ... until a page comes back empty or short
///
/// Windows never overlap and never leave a gap. A page holding more rows than
/// requested means the upstream does not honor inclusive ranges; it is kept
/// but logged, since later windows may then repeat rows.
pub async fn scan_pages<F, Fut>(
    page_size: u64,
    label: &str,
    mut fetch_page: F,
) -> Result<ScanOutcome, FetchError>
where
    F: FnMut(RowRange) -> Fut,
    Fut: Future<Output = Result<Vec<RawRecord>, FetchError>>,
{
    let mut outcome = ScanOutcome::default();
    let mut range = RowRange::window(0, page_size);

    loop {
        log::info!("    Fetching {} rows {} to {}...", label, range.start, range.end);
        let batch = fetch_page(range).await?;
        outcome.requests += 1;

        if batch.is_empty() {
            break;
        }

        let received = batch.len() as u64;
        if received > range.len() {
            log::warn!(
                "⚠️  {} returned {} rows for a {}-row window {}; pages may overlap",
                label,
                received,
                range.len(),
                range
            );
        }

        outcome.records.extend(batch);
        log::info!("      Got {} records", received);

        if received < range.len() {
            break;
        }

        range = range.next();
    }

    Ok(outcome)
}
