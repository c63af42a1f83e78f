//! Retry policies for remote operations
//!
//! Every call site instantiates a policy instead of re-implementing its own
//! backoff loop. Delays grow exponentially from `base_delay` with bounded
//! random jitter so concurrent callers do not retry in lockstep.

use rand::Rng;
use std::time::Duration;

/// Configuration for retry behavior of a single remote invocation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (>= 1, the first attempt included)
    pub max_attempts: u32,
    /// Base delay the exponential backoff grows from
    pub base_delay: Duration,
    /// Each attempt is raced against this budget; exceeding it is a timeout
    pub timeout_per_attempt: Duration,
    /// Ceiling on the deterministic part of the backoff delay
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the random jitter added to every delay
    pub jitter: Duration,
}

impl RetryPolicy {
    /// Standard policy for function invocations
    pub fn standard() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            timeout_per_attempt: Duration::from_secs(30),
            max_delay: Duration::from_secs(120),
            jitter: Duration::from_millis(1000),
        }
    }

    /// Tighter per-attempt budget for status queries driven by polling loops
    pub fn query() -> Self {
        Self {
            timeout_per_attempt: Duration::from_secs(10),
            ..Self::standard()
        }
    }

    /// Single attempt, no backoff. Used for the preferred transport probe.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::standard()
        }
    }

    /// Deterministic part of the delay scheduled after `failed_attempts`
    /// attempts have failed: `base_delay * 2^failed_attempts`, capped.
    pub fn backoff_floor(&self, failed_attempts: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let floor = match 2u64.checked_pow(failed_attempts) {
            Some(factor) => base_ms.saturating_mul(factor),
            None => u64::MAX,
        };
        Duration::from_millis(floor).min(self.max_delay)
    }

    /// Full backoff delay including jitter.
    pub fn backoff_delay(&self, failed_attempts: u32) -> Duration {
        let floor = self.backoff_floor(failed_attempts);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return floor;
        }
        let jitter = rand::thread_rng().gen_range(0..jitter_ms);
        floor + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_defaults() {
        let policy = RetryPolicy::standard();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
        assert_eq!(policy.timeout_per_attempt, Duration::from_secs(30));
        assert_eq!(policy.jitter, Duration::from_millis(1000));
    }

    #[test]
    fn backoff_floor_doubles_per_failed_attempt() {
        let policy = RetryPolicy::standard();
        assert_eq!(policy.backoff_floor(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff_floor(2), Duration::from_millis(4000));
        assert_eq!(policy.backoff_floor(3), Duration::from_millis(8000));
    }

    #[test]
    fn backoff_floor_is_capped() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(5),
            ..RetryPolicy::standard()
        };
        assert_eq!(policy.backoff_floor(30), Duration::from_secs(5));
        // absurd attempt counts must not overflow
        assert_eq!(policy.backoff_floor(200), Duration::from_secs(5));
    }

    #[test]
    fn backoff_delay_jitter_stays_in_bounds() {
        let policy = RetryPolicy::standard();
        for _ in 0..100 {
            let delay = policy.backoff_delay(1);
            assert!(delay >= Duration::from_millis(2000), "delay {:?}", delay);
            assert!(delay < Duration::from_millis(3000), "delay {:?}", delay);

            let delay = policy.backoff_delay(2);
            assert!(delay >= Duration::from_millis(4000), "delay {:?}", delay);
            assert!(delay < Duration::from_millis(5000), "delay {:?}", delay);
        }
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let policy = RetryPolicy {
            jitter: Duration::ZERO,
            ..RetryPolicy::standard()
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(2000));
    }
}
