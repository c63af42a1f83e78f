//! Remote invocation client tests
//!
//! Exercises the retry loop's observable contract: backoff growth with
//! bounded jitter, fatal short-circuiting, attempt exhaustion, and the
//! per-attempt timeout. Timing assertions run under tokio's paused clock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pitchline::{invoke, AppError, ErrorKind, RecommendedAction, RetryPolicy};
use tokio::time::Instant;

#[test]
fn backoff_delays_grow_exponentially_with_bounded_jitter() {
    let policy = RetryPolicy::standard();

    for _ in 0..200 {
        let before_second_attempt = policy.backoff_delay(1);
        assert!(before_second_attempt >= Duration::from_millis(2000));
        assert!(before_second_attempt < Duration::from_millis(3000));

        let before_third_attempt = policy.backoff_delay(2);
        assert!(before_third_attempt >= Duration::from_millis(4000));
        assert!(before_third_attempt < Duration::from_millis(5000));
    }
}

#[tokio::test(start_paused = true)]
async fn fatal_error_on_first_attempt_makes_exactly_one_attempt() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let started = Instant::now();

    let result: Result<(), _> = invoke("login_probe", &RetryPolicy::standard(), move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AppError::PermissionDenied("row-level security".into()))
        }
    })
    .await;

    let err = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.attempts, 1);
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(
        err.classification.recommended_action,
        RecommendedAction::Reauthenticate
    );
    // no backoff delay was consumed
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn retryable_errors_exhaust_all_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let result: Result<(), _> = invoke("flaky_endpoint", &RetryPolicy::standard(), move || {
        let counter = Arc::clone(&counter);
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Err(AppError::ConnectionFailure(format!("attempt {} failed", n)))
        }
    })
    .await;

    let err = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(err.attempts, 3);
    assert_eq!(err.error.message(), "attempt 3 failed");
    assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
}

#[tokio::test(start_paused = true)]
async fn backoff_sleeps_between_retryable_attempts() {
    let attempt_times: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&attempt_times);

    let _result: Result<(), _> = invoke("flaky_endpoint", &RetryPolicy::standard(), move || {
        let recorder = Arc::clone(&recorder);
        async move {
            recorder.lock().unwrap().push(Instant::now());
            Err(AppError::ConnectionFailure("down".into()))
        }
    })
    .await;

    let times = attempt_times.lock().unwrap();
    assert_eq!(times.len(), 3);

    let first_gap = times[1] - times[0];
    assert!(first_gap >= Duration::from_millis(2000), "gap {:?}", first_gap);
    assert!(first_gap < Duration::from_millis(3000), "gap {:?}", first_gap);

    let second_gap = times[2] - times[1];
    assert!(second_gap >= Duration::from_millis(4000), "gap {:?}", second_gap);
    assert!(second_gap < Duration::from_millis(5000), "gap {:?}", second_gap);
}

#[tokio::test(start_paused = true)]
async fn per_attempt_timeout_is_classified_as_retryable() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let policy = RetryPolicy::query();

    let result: Result<(), _> = invoke("hung_endpoint", &policy, move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    })
    .await;

    let err = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(err.error, AppError::Timeout(_)));
    assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
}

#[tokio::test(start_paused = true)]
async fn not_found_is_surfaced_immediately_as_absence_signal() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let result: Result<(), _> = invoke("profile_lookup", &RetryPolicy::standard(), move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AppError::NotFound("no profile row".into()))
        }
    })
    .await;

    let err = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!err.classification.is_incident());
}

#[tokio::test(start_paused = true)]
async fn recovery_mid_policy_returns_the_value() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let result = invoke("recovering_endpoint", &RetryPolicy::standard(), move || {
        let counter = Arc::clone(&counter);
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::Timeout("first one slow".into()))
            } else {
                Ok("payload".to_string())
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "payload");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
