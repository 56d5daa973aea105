//! Retry policy for idempotent GraphQL requests.

use std::time::Duration;

/// Upper bound on any single backoff wait.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Bounded exponential backoff for retryable failures.
///
/// Only applied to queries. Mutations are sent exactly once because a
/// resend after an ambiguous failure could apply the change twice.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u8,
    /// Wait before the first retry.
    pub base_wait: Duration,
    /// The wait before retry N is `base_wait * backoff_factor^N`.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_wait: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_wait: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Wait before the retry with the given zero-based index.
    ///
    /// Capped at [`MAX_BACKOFF`]. A factor that is negative or NaN, or
    /// that overflows, also yields the cap.
    pub fn backoff(&self, retry: u8) -> Duration {
        let secs = self.base_wait.as_secs_f64() * self.backoff_factor.powi(i32::from(retry));
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_wait: Duration::from_secs(1),
            backoff_factor: 1e20,
        };
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), MAX_BACKOFF);
        assert_eq!(policy.backoff(u8::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_backoff_with_invalid_factor() {
        for factor in [f64::NAN, f64::INFINITY, -3.0] {
            let policy = RetryPolicy {
                max_retries: 3,
                base_wait: Duration::from_secs(1),
                backoff_factor: factor,
            };
            assert_eq!(policy.backoff(1), MAX_BACKOFF);
        }
    }

    #[test]
    fn test_none_policy() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.backoff(3), Duration::ZERO);
    }
}
