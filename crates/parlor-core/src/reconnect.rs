//! Reconnect backoff for the live channel.
//!
//! Exponential backoff with equal jitter: the delay for attempt `n` is drawn
//! from `[base / 2, base]` where `base = min(initial * 2^n, max)`. The caller
//! supplies the random value so the schedule is reproducible under
//! simulation.

use std::time::Duration;

/// Reconnect schedule for an unexpectedly closed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Attempts allowed before giving up. Zero disables reconnection.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 8,
        }
    }
}

impl ReconnectPolicy {
    /// Policy that never reconnects.
    pub fn disabled() -> Self {
        Self { max_attempts: 0, ..Self::default() }
    }

    /// Whether attempt number `attempt` (zero-based) may be made.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before attempt number `attempt`, using `jitter` as the random
    /// source.
    pub fn delay(&self, attempt: u32, jitter: u64) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let base = self.initial_delay.saturating_mul(factor).min(self.max_delay);

        let half = base / 2;
        let spread = (base - half).as_millis() as u64;
        if spread == 0 {
            return base;
        }
        half + Duration::from_millis(jitter % (spread + 1))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn first_delay_is_within_initial_band() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(0, 0), Duration::from_millis(250));
        assert_eq!(policy.delay(0, 250), Duration::from_millis(500));
    }

    #[test]
    fn delay_caps_at_max() {
        let policy = ReconnectPolicy::default();
        let delay = policy.delay(40, u64::MAX);
        assert!(delay <= policy.max_delay);
        assert!(delay >= policy.max_delay / 2);
    }

    #[test]
    fn disabled_policy_allows_nothing() {
        assert!(!ReconnectPolicy::disabled().allows(0));
    }

    #[test]
    fn attempts_stop_at_limit() {
        let policy = ReconnectPolicy::default();
        assert!(policy.allows(7));
        assert!(!policy.allows(8));
    }

    proptest! {
        #[test]
        fn delay_stays_in_equal_jitter_band(attempt in 0u32..64, jitter in any::<u64>()) {
            let policy = ReconnectPolicy::default();
            let base = policy
                .initial_delay
                .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
                .min(policy.max_delay);

            let delay = policy.delay(attempt, jitter);

            prop_assert!(delay >= base / 2);
            prop_assert!(delay <= base);
        }
    }
}
