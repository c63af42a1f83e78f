use log::{debug, error, info, warn};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

/// Initialize the logging system
/// This should be called once by the embedding application
pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info) // Default level
            .filter_module("pitchline", log::LevelFilter::Debug) // More verbose for our crate
            .filter_module("reqwest", log::LevelFilter::Warn) // Reduce HTTP noise
            .filter_module("tokio", log::LevelFilter::Warn) // Reduce tokio noise
            .format_timestamp_secs()
            .format_target(false)
            .format_module_path(false)
            .init();

        info!("Logging system initialized");
    });
}

/// Macro for structured logging with context
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

/// Structured logging helpers for common patterns
pub struct LogContext;

impl LogContext {
    /// Log a completed remote invocation
    pub fn invocation(operation: &str, attempts: u32, elapsed: Duration) {
        info!(
            "Invoke: {} succeeded after {} attempt(s) in {}ms",
            operation,
            attempts,
            elapsed.as_millis()
        );
    }

    /// Log a retry being scheduled
    pub fn retry_scheduled(operation: &str, attempt: u32, max_attempts: u32, delay: Duration) {
        warn!(
            "Invoke: {} failed (attempt {}/{}), retrying in {:?}",
            operation, attempt, max_attempts, delay
        );
    }

    /// Log a remote invocation that was given up on. Only `error`-severity
    /// failures are escalated as incidents.
    pub fn invocation_failed(
        operation: &str,
        attempts: u32,
        elapsed: Duration,
        error: &dyn std::error::Error,
        incident: bool,
    ) {
        if incident {
            error!(
                "Invoke: {} failed after {} attempt(s) in {}ms: {}",
                operation,
                attempts,
                elapsed.as_millis(),
                error
            );
        } else {
            warn!(
                "Invoke: {} gave up after {} attempt(s) in {}ms: {}",
                operation,
                attempts,
                elapsed.as_millis(),
                error
            );
        }
    }

    /// Log transport activity
    pub fn transport_call(transport: &str, operation: &str, status: &str) {
        debug!("Transport: {} {} -> {}", transport, operation, status);
    }

    /// Log a poll observation
    pub fn poll_observation(entity_id: &str, status: &str) {
        debug!("Poll: {} observed status '{}'", entity_id, status);
    }

    /// Log errors with context
    pub fn error_with_context(error: &dyn std::error::Error, context: &str) {
        error!("{}: {}", context, error);
    }
}

/// Helper for timing operations
pub struct TimedOperation {
    start: std::time::Instant,
    operation: String,
}

impl TimedOperation {
    pub fn new(operation: &str) -> Self {
        debug!("Starting: {}", operation);
        Self {
            start: std::time::Instant::now(),
            operation: operation.to_string(),
        }
    }

    pub fn finish(self) -> u64 {
        let duration = self.start.elapsed().as_millis() as u64;
        info!("Performance: {} took {}ms", self.operation, duration);
        duration
    }
}
