use std::time::Duration;
use tokio::time::sleep;

/// How many times a request is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    pub fn backoff(&self) -> ExponentialBackoff {
        let retries = self.max_attempts.saturating_sub(1);
        ExponentialBackoff::new(self.base_delay, self.max_delay, retries)
    }
}

#[derive(Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
    current_attempt: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("Maximum retry attempts exceeded")]
pub struct MaxRetriesExceeded;

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, retries: u32) -> Self {
        Self {
            initial_delay: initial,
            max_delay: max,
            max_retries: retries,
            current_attempt: 0,
        }
    }

    /// Delay before the next retry: 1x, 2x, 4x ... the initial delay
    pub fn next_delay(&self) -> Option<Duration> {
        if self.current_attempt >= self.max_retries {
            return None;
        }

        let factor = 2_u32.saturating_pow(self.current_attempt);
        Some(std::cmp::min(
            self.initial_delay.saturating_mul(factor),
            self.max_delay,
        ))
    }

    pub async fn sleep(&mut self) -> Result<(), MaxRetriesExceeded> {
        let delay = self.next_delay().ok_or(MaxRetriesExceeded)?;

        log::warn!(
            "⏳ Retry attempt {} of {} in {:?}",
            self.current_attempt + 1,
            self.max_retries,
            delay
        );

        sleep(delay).await;
        self.current_attempt += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 3);

        let mut delays = Vec::new();
        while let Some(delay) = backoff.next_delay() {
            delays.push(delay);
            backoff.current_attempt += 1;
        }

        assert_eq!(
            delays,
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[test]
    fn test_delay_capped_at_max() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(15), 5);
        backoff.current_attempt = 3;
        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(15)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_errors_after_max_retries() {
        let mut backoff = RetryPolicy::new(3, Duration::from_secs(1)).backoff();

        assert!(backoff.sleep().await.is_ok());
        assert!(backoff.sleep().await.is_ok());
        assert!(backoff.sleep().await.is_err());
        assert_eq!(backoff.next_delay(), None);
    }
}
