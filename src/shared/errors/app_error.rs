use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Structured error code, stable across message wording changes.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not-found",
            AppError::PermissionDenied(_) => "permission-denied",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::SessionExpired(_) => "session-expired",
            AppError::UnsupportedFormat(_) => "unsupported-format",
            AppError::ConnectionFailure(_) => "connection-error",
            AppError::Timeout(_) => "timeout",
            AppError::RateLimited(_) => "rate-limited",
            AppError::InvalidInput(_) => "invalid-input",
            AppError::SerializationError(_) => "serialization-error",
            AppError::ApiError(_) => "api-error",
            AppError::Unknown(_) => "unknown",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound(m)
            | AppError::PermissionDenied(m)
            | AppError::Unauthenticated(m)
            | AppError::SessionExpired(m)
            | AppError::UnsupportedFormat(m)
            | AppError::ConnectionFailure(m)
            | AppError::Timeout(m)
            | AppError::RateLimited(m)
            | AppError::InvalidInput(m)
            | AppError::SerializationError(m)
            | AppError::ApiError(m)
            | AppError::Unknown(m) => m,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout("Request timeout".to_string())
        } else if err.is_connect() {
            AppError::ConnectionFailure("Failed to connect to pipeline backend".to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                401 => {
                    AppError::Unauthenticated("Not authenticated against the backend".to_string())
                }
                403 => AppError::PermissionDenied("Not authorized for this resource".to_string()),
                404 => AppError::NotFound("Remote resource not found".to_string()),
                408 => AppError::Timeout("Backend reported request timeout".to_string()),
                415 | 422 => AppError::UnsupportedFormat(format!("HTTP {}: {}", status, err)),
                429 => AppError::RateLimited("Too many requests".to_string()),
                500..=599 => AppError::ConnectionFailure(format!("Backend error: HTTP {}", status)),
                _ => AppError::ApiError(format!("HTTP {}: {}", status, err)),
            }
        } else {
            AppError::ApiError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::InvalidInput(format!("Invalid date/time: {}", err))
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
