// ABOUTME: Bounded retry policy with exponential backoff for transient fetch failures.
// ABOUTME: Default is a single attempt; callers opt into retries explicitly.

use std::time::Duration;

/// Bounded retry policy for transient fetch failures.
///
/// `max_attempts` counts total attempts, so `1` means no retry. The delay
/// before attempt `n + 1` is `backoff_base * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Policy performing exactly one attempt.
    pub fn no_retry() -> Self {
        Self::default()
    }

    /// Delay to sleep after the given failed attempt (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1u32 << exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_single_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn max_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100));
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(4, Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(800));
    }

    #[test]
    fn backoff_shift_is_capped() {
        // Very large attempt numbers must not overflow the shift.
        let policy = RetryPolicy::new(u32::MAX, Duration::from_millis(1));
        let _ = policy.backoff_delay(u32::MAX);
    }
}
