//! Remote invocation client
//!
//! Runs a single remote operation under a `RetryPolicy`: every attempt is
//! raced against the per-attempt timeout, transient failures back off
//! exponentially with jitter, and fatal classifications short-circuit the
//! remaining attempts. The operation must be idempotent from the caller's
//! perspective; this layer never mutates business state on its own.

use std::future::Future;

use tokio::time::{sleep, timeout, Instant};

use crate::shared::errors::{classify, AppError, AppResult, ClassifiedError};
use crate::shared::utils::logger::LogContext;

use super::retry_policy::RetryPolicy;

/// Execute `op` under `policy`, classifying every failure.
///
/// Returns the value of the first successful attempt, the fatal error that
/// short-circuited the loop, or the classified error of the final attempt
/// once the policy is exhausted.
pub async fn invoke<T, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, ClassifiedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let outcome = match timeout(policy.timeout_per_attempt, op()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} exceeded the {:?} per-attempt budget",
                operation, policy.timeout_per_attempt
            ))),
        };

        let error = match outcome {
            Ok(value) => {
                LogContext::invocation(operation, attempt, started.elapsed());
                return Ok(value);
            }
            Err(error) => error,
        };

        let classification = classify(&error);
        // Unmapped failures get a single defensive retry; everything else is
        // either transient (full policy budget) or fatal (stop now).
        let may_retry = classification.is_retryable()
            || (classification.allows_defensive_retry() && attempt < 2);

        if !may_retry || attempt >= max_attempts {
            let classified = ClassifiedError {
                classification,
                error,
                attempts: attempt,
            };
            LogContext::invocation_failed(
                operation,
                attempt,
                started.elapsed(),
                &classified.error,
                classified.classification.is_incident(),
            );
            return Err(classified);
        }

        let delay = policy.backoff_delay(attempt);
        LogContext::retry_scheduled(operation, attempt, max_attempts, delay);
        sleep(delay).await;
    }
}
