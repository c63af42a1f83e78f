//! Failure classification for remote operations
//!
//! Maps every `AppError` onto a small taxonomy (kind, severity, recommended
//! action) that drives both the retry loop's fatal/retryable decision and the
//! message surfaced to the embedding application. Classification is keyed by
//! the structured error code first; errors that arrive through the function
//! gateway with mangled codes fall back to substring matching on the message.

use serde::Serialize;
use std::fmt;

use super::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Unauthenticated,
    SessionExpired,
    UnsupportedFormat,
    ConnectionFailure,
    InvalidRequest,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    None,
    Retry,
    Reauthenticate,
    RedirectToLogin,
}

/// Outcome of classifying a raw failure.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub user_message: String,
    pub recommended_action: RecommendedAction,
}

impl Classification {
    fn new(
        kind: ErrorKind,
        severity: Severity,
        recommended_action: RecommendedAction,
        user_message: &str,
    ) -> Self {
        Self {
            kind,
            severity,
            user_message: user_message.to_string(),
            recommended_action,
        }
    }

    /// Transient failures the invoker may retry up to the policy limit.
    pub fn is_retryable(&self) -> bool {
        self.recommended_action == RecommendedAction::Retry
    }

    /// Unmapped failures get a single defensive retry, nothing more.
    pub fn allows_defensive_retry(&self) -> bool {
        self.kind == ErrorKind::Unknown
    }

    /// Credential problems that retrying cannot fix.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.recommended_action,
            RecommendedAction::Reauthenticate | RecommendedAction::RedirectToLogin
        )
    }

    /// True when the failure must short-circuit the retry loop immediately.
    pub fn is_fatal(&self) -> bool {
        !self.is_retryable() && !self.allows_defensive_retry()
    }

    /// Only `error` severity is escalated as an incident.
    pub fn is_incident(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Classify a raw failure. Total: every error resolves to a classification.
pub fn classify(error: &AppError) -> Classification {
    match error {
        AppError::NotFound(_) => Classification::new(
            ErrorKind::NotFound,
            Severity::Info,
            RecommendedAction::None,
            "No data available yet.",
        ),
        AppError::PermissionDenied(_) => Classification::new(
            ErrorKind::PermissionDenied,
            Severity::Error,
            RecommendedAction::Reauthenticate,
            "You do not have access to this resource.",
        ),
        AppError::Unauthenticated(_) => Classification::new(
            ErrorKind::Unauthenticated,
            Severity::Error,
            RecommendedAction::RedirectToLogin,
            "Please sign in to continue.",
        ),
        AppError::SessionExpired(_) => Classification::new(
            ErrorKind::SessionExpired,
            Severity::Warning,
            RecommendedAction::Reauthenticate,
            "Your session has expired. Please sign in again.",
        ),
        AppError::UnsupportedFormat(_) => Classification::new(
            ErrorKind::UnsupportedFormat,
            Severity::Error,
            RecommendedAction::None,
            "This media format is not supported.",
        ),
        AppError::ConnectionFailure(_) | AppError::Timeout(_) | AppError::RateLimited(_) => {
            Classification::new(
                ErrorKind::ConnectionFailure,
                Severity::Warning,
                RecommendedAction::Retry,
                "Connection problem. Retrying...",
            )
        }
        AppError::InvalidInput(_) | AppError::SerializationError(_) => Classification::new(
            ErrorKind::InvalidRequest,
            Severity::Error,
            RecommendedAction::None,
            "The request could not be processed.",
        ),
        AppError::ApiError(message) | AppError::Unknown(message) => classify_message(message),
    }
}

/// Substring fallback for failures whose structured code was lost in transit
/// (gateways tend to flatten everything into a message string).
fn classify_message(message: &str) -> Classification {
    let lowered = message.to_lowercase();

    if contains_any(&lowered, &["jwt expired", "jwt", "refresh token", "session expired"]) {
        return Classification::new(
            ErrorKind::SessionExpired,
            Severity::Warning,
            RecommendedAction::Reauthenticate,
            "Your session has expired. Please sign in again.",
        );
    }
    if contains_any(
        &lowered,
        &["unauthenticated", "unauthorized", "invalid credential", "401"],
    ) {
        return Classification::new(
            ErrorKind::Unauthenticated,
            Severity::Error,
            RecommendedAction::RedirectToLogin,
            "Please sign in to continue.",
        );
    }
    if contains_any(
        &lowered,
        &["permission denied", "forbidden", "row-level security", "403"],
    ) {
        return Classification::new(
            ErrorKind::PermissionDenied,
            Severity::Error,
            RecommendedAction::Reauthenticate,
            "You do not have access to this resource.",
        );
    }
    if contains_any(&lowered, &["not found", "no rows", "pgrst116", "404"]) {
        return Classification::new(
            ErrorKind::NotFound,
            Severity::Info,
            RecommendedAction::None,
            "No data available yet.",
        );
    }
    if contains_any(
        &lowered,
        &[
            "timeout",
            "timed out",
            "connection",
            "network",
            "unreachable",
            "temporarily unavailable",
            "too many requests",
        ],
    ) {
        return Classification::new(
            ErrorKind::ConnectionFailure,
            Severity::Warning,
            RecommendedAction::Retry,
            "Connection problem. Retrying...",
        );
    }
    if contains_any(&lowered, &["unsupported format", "unsupported media", "mime", "codec"]) {
        return Classification::new(
            ErrorKind::UnsupportedFormat,
            Severity::Error,
            RecommendedAction::None,
            "This media format is not supported.",
        );
    }

    Classification::new(
        ErrorKind::Unknown,
        Severity::Error,
        RecommendedAction::None,
        "Something went wrong. Please try again later.",
    )
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// An error paired with its classification and the number of attempts the
/// invoker spent before giving up.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    pub error: AppError,
    pub classification: Classification,
    pub attempts: u32,
}

impl ClassifiedError {
    pub fn kind(&self) -> ErrorKind {
        self.classification.kind
    }

    pub fn user_message(&self) -> &str {
        &self.classification.user_message
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (kind: {:?}, attempts: {})",
            self.error, self.classification.kind, self.attempts
        )
    }
}

impl std::error::Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_failures_are_retryable() {
        let c = classify(&AppError::ConnectionFailure("down".into()));
        assert_eq!(c.kind, ErrorKind::ConnectionFailure);
        assert_eq!(c.severity, Severity::Warning);
        assert!(c.is_retryable());
        assert!(!c.is_fatal());
    }

    #[test]
    fn timeouts_classify_as_connection_failures() {
        let c = classify(&AppError::Timeout("slow".into()));
        assert_eq!(c.kind, ErrorKind::ConnectionFailure);
        assert!(c.is_retryable());
    }

    #[test]
    fn auth_failures_are_fatal() {
        let unauthenticated = classify(&AppError::Unauthenticated("no token".into()));
        assert!(unauthenticated.is_fatal());
        assert_eq!(
            unauthenticated.recommended_action,
            RecommendedAction::RedirectToLogin
        );

        let denied = classify(&AppError::PermissionDenied("rls".into()));
        assert!(denied.is_fatal());
        assert_eq!(denied.recommended_action, RecommendedAction::Reauthenticate);
    }

    #[test]
    fn not_found_is_info_and_never_retried() {
        let c = classify(&AppError::NotFound("no profile".into()));
        assert_eq!(c.kind, ErrorKind::NotFound);
        assert_eq!(c.severity, Severity::Info);
        assert_eq!(c.recommended_action, RecommendedAction::None);
        assert!(!c.is_retryable());
        assert!(!c.is_incident());
    }

    #[test]
    fn substring_fallback_recovers_mangled_codes() {
        let c = classify(&AppError::ApiError("Edge error: JWT expired".into()));
        assert_eq!(c.kind, ErrorKind::SessionExpired);

        let c = classify(&AppError::Unknown("PGRST116: no rows returned".into()));
        assert_eq!(c.kind, ErrorKind::NotFound);

        let c = classify(&AppError::ApiError("fetch failed: network unreachable".into()));
        assert_eq!(c.kind, ErrorKind::ConnectionFailure);
        assert!(c.is_retryable());
    }

    #[test]
    fn unmapped_errors_default_to_unknown() {
        let c = classify(&AppError::Unknown("???".into()));
        assert_eq!(c.kind, ErrorKind::Unknown);
        assert_eq!(c.severity, Severity::Error);
        assert_eq!(c.recommended_action, RecommendedAction::None);
        assert!(c.allows_defensive_retry());
        assert!(!c.is_fatal());
        assert!(c.is_incident());
    }
}
