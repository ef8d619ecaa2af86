//! Bounded linear-backoff reconnect policy.

use std::time::Duration;

/// Attempts made before the client gives up for the session.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Base delay; attempt `n` waits `n * base`.
pub const DEFAULT_BASE_DELAY_MS: u64 = 2_000;

/// Reconnect state machine. The attempt counter is only mutated through
/// [`ReconnectPolicy::next_delay`] and [`ReconnectPolicy::reset`], which
/// keeps the bounded-retry invariant enforceable: once the ceiling is
/// reached no further attempt can be scheduled.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        )
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Attempts consumed since the last successful connect.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the ceiling has been reached.
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Consume one attempt. Returns the linear-backoff delay to wait
    /// before reconnecting, or `None` once the ceiling is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.base_delay * self.attempts)
    }

    /// Reset the counter after a successful connect.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_linear_in_the_attempt_number() {
        let mut policy = ReconnectPolicy::default();
        for attempt in 1..=5u32 {
            assert_eq!(
                policy.next_delay(),
                Some(Duration::from_millis(2_000 * u64::from(attempt))),
                "attempt {attempt}"
            );
            assert_eq!(policy.attempts(), attempt);
        }
    }

    #[test]
    fn no_sixth_attempt_after_five_consecutive_failures() {
        let mut policy = ReconnectPolicy::default();
        for _ in 0..5 {
            assert!(policy.next_delay().is_some());
        }
        assert!(policy.exhausted());
        assert_eq!(policy.next_delay(), None);
        assert_eq!(policy.attempts(), 5);
    }

    #[test]
    fn reset_clears_the_counter_regardless_of_prior_count() {
        let mut policy = ReconnectPolicy::default();
        for _ in 0..4 {
            let _ = policy.next_delay();
        }
        assert_eq!(policy.attempts(), 4);

        policy.reset();
        assert_eq!(policy.attempts(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2_000)));
    }

    #[test]
    fn custom_ceiling_and_base_delay_are_honored() {
        let mut policy = ReconnectPolicy::new(2, Duration::from_millis(10));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(10)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(20)));
        assert_eq!(policy.next_delay(), None);
    }
}
