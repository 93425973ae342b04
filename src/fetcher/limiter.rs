//! Fixed-window request limiter
//!
//! One instance guards one upstream. Share it with `Arc` to make several
//! clients draw from the same budget.

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

#[derive(Debug)]
struct WindowState {
    window_start: Instant,
    calls: u32,
}

/// Admits at most `max_calls` acquisitions per `period`
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_calls: u32,
    period: Duration,
    state: Mutex<WindowState>,
}

impl FixedWindowLimiter {
    pub fn new(max_calls: u32, period: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            period,
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                calls: 0,
            }),
        }
    }

    /// Wait for a slot in the current window
    ///
    /// The lock is held while sleeping so waiters are admitted in order.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        let now = Instant::now();
        if now.duration_since(state.window_start) >= self.period {
            state.window_start = now;
            state.calls = 0;
        }

        if state.calls >= self.max_calls {
            let next_window = state.window_start + self.period;
            log::debug!(
                "⏳ Rate limit reached ({} calls / {:?}), waiting {:?}",
                self.max_calls,
                self.period,
                next_window.saturating_duration_since(now)
            );
            sleep_until(next_window).await;
            state.window_start = Instant::now();
            state.calls = 0;
        }

        state.calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_admits_max_calls_without_waiting() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_over_budget_waits_for_next_window() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..6 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_holds_over_many_calls() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(1));
        let start = Instant::now();

        // 21 calls need the first window plus four more
        for _ in 0..21 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_limiter_counts_all_callers() {
        let limiter = Arc::new(FixedWindowLimiter::new(2, Duration::from_secs(1)));
        let start = Instant::now();

        let a = limiter.clone();
        let b = limiter.clone();
        a.acquire().await;
        b.acquire().await;
        a.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
