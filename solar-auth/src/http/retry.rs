//! Backoff for the application client's transient failures.

use std::time::{Duration, SystemTime};

use reqwest_retry::{RetryDecision, RetryPolicy};

use crate::settings::HttpClientConfig;

const BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Doubling backoff bounded by a retry count and by the total time spent on one request.
///
/// The time budget is the client's request timeout, so retrying never keeps a caller waiting
/// much longer than a single timed-out attempt would.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    max_retries: u32,
    budget: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, budget: Duration) -> Self {
        Self {
            max_retries,
            budget,
        }
    }

    pub fn from_config(config: &HttpClientConfig) -> Self {
        Self::new(config.max_retries, config.timeout)
    }

    fn delay_for(n_past_retries: u32) -> Duration {
        BASE_DELAY
            .checked_mul(2u32.saturating_pow(n_past_retries))
            .map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
    }

    fn decide(&self, elapsed: Duration, n_past_retries: u32) -> Option<Duration> {
        if n_past_retries >= self.max_retries {
            return None;
        }
        let delay = Self::delay_for(n_past_retries);
        (elapsed + delay <= self.budget).then_some(delay)
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        let elapsed = request_start_time.elapsed().unwrap_or_default();
        match self.decide(elapsed, n_past_retries) {
            Some(delay) => RetryDecision::Retry {
                execute_after: SystemTime::now() + delay,
            },
            None => RetryDecision::DoNotRetry,
        }
    }
}
