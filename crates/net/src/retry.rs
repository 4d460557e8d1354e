//! Retry policy and backoff calculations

use reqwest::{Method, StatusCode};
use std::time::Duration;

/// Bounded retry policy shared by every request issued through one client
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Backoff multiplier
    pub multiplier: f64,
    /// Maximum backoff delay
    pub max_delay: Duration,
    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,
    pub retryable_statuses: Vec<StatusCode>,
    pub retryable_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.1,
            retryable_statuses: vec![
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
            retryable_methods: vec![Method::GET, Method::HEAD],
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn allows_method(&self, method: &Method) -> bool {
        self.retryable_methods.contains(method)
    }

    #[must_use]
    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Calculate exponential backoff delay with jitter
    ///
    /// `retry` is 1 for the delay before the second attempt.
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        // Precision loss acceptable for backoff calculations
        #[allow(clippy::cast_precision_loss)]
        let base_delay = self.initial_delay.as_millis().min(u128::from(u64::MAX)) as f64;
        #[allow(clippy::cast_precision_loss)]
        let max_delay = self.max_delay.as_millis().min(u128::from(u64::MAX)) as f64;

        // Retry counts are small, so this cast is safe
        #[allow(clippy::cast_possible_wrap)]
        let exponent = retry.saturating_sub(1).min(64) as i32;
        let delay = (base_delay * self.multiplier.powi(exponent)).min(max_delay);

        let jitter = delay * self.jitter * (rand::random::<f64>() - 0.5);

        // max(0.0) ensures non-negative, round() handles the fractional part
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let final_delay = (delay + jitter).max(0.0).round() as u64;

        Duration::from_millis(final_delay)
    }

    /// Delay to wait before retrying after `status`, honouring `Retry-After`
    /// seconds when the server sent them (capped at `max_delay`)
    #[must_use]
    pub(crate) fn delay_for_response(&self, retry: u32, retry_after: Option<u64>) -> Duration {
        let backoff = self.backoff_delay(retry);
        match retry_after {
            Some(secs) => backoff.max(Duration::from_secs(secs)).min(self.max_delay),
            None => backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(20), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let d = policy.backoff_delay(2).as_millis();
            // 1000ms +/- 5%
            assert!((950..=1050).contains(&d), "{d}");
        }
    }

    #[test]
    fn test_retryable_sets() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(policy.is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!policy.is_retryable_status(StatusCode::NOT_FOUND));
        assert!(policy.allows_method(&Method::HEAD));
        assert!(!policy.allows_method(&Method::POST));
    }

    #[test]
    fn test_retry_after_is_respected_and_capped() {
        let policy = RetryPolicy {
            jitter: 0.0,
            max_delay: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for_response(1, Some(2)), Duration::from_secs(2));
        assert_eq!(policy.delay_for_response(1, Some(60)), Duration::from_secs(5));
        assert_eq!(policy.delay_for_response(1, None), Duration::from_millis(500));
    }
}
