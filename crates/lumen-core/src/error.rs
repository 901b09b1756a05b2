//! Error types module
//!
//! All domain errors are unified under [`AppError`]. Each variant carries
//! enough context to produce a machine-readable error code and an HTTP
//! status at the API boundary; the [`ErrorMetadata`] trait is how an error
//! self-describes its presentation without the core crate depending on any
//! HTTP framework.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the
//! `sqlx` feature so pure consumers can build without a database stack.

use chrono::{DateTime, Utc};

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as validation failures
    Debug,
    /// Recoverable issues such as rate limits
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "SESSION_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether the client can retry the same request
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether internal details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upload session not found or expired")]
    SessionNotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Account is not active")]
    AccountNotActive,

    #[error("File not uploaded to storage")]
    FileNotUploaded,

    #[error("File size mismatch: declared {declared} bytes, stored {actual} bytes")]
    SizeMismatch { declared: i64, actual: i64 },

    #[error("File type mismatch: expected {expected}, detected {}", detected.as_deref().unwrap_or("unknown"))]
    TypeMismatch {
        expected: String,
        detected: Option<String>,
    },

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge { size: i64, max: i64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Thumbnail required for video uploads")]
    ThumbnailRequired,

    #[error("Invalid thumbnail data URL")]
    InvalidThumbnail,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("This operation requires a {required} token")]
    WrongTokenKind { required: &'static str },

    #[error("Some media do not belong to this scope")]
    InvalidMedia,

    #[error("No approved media to download")]
    NoMedia,

    #[error("Rate limit exceeded, try again after {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => 500,
            AppError::Storage(_) | AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                500
            }
            AppError::Validation(_)
            | AppError::FileNotUploaded
            | AppError::SizeMismatch { .. }
            | AppError::TypeMismatch { .. }
            | AppError::EmptyFile
            | AppError::FileTooLarge { .. }
            | AppError::UnsupportedType(_)
            | AppError::ThumbnailRequired
            | AppError::InvalidThumbnail
            | AppError::InvalidMedia => 400,
            AppError::Unauthorized(_) | AppError::InvalidToken | AppError::TokenExpired => 401,
            AppError::Forbidden(_) | AppError::AccountNotActive | AppError::WrongTokenKind { .. } => {
                403
            }
            AppError::NotFound(_) | AppError::SessionNotFound | AppError::NoMedia => 404,
            AppError::RateLimited { .. } => 429,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::SessionNotFound => "SESSION_NOT_FOUND",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::AccountNotActive => "ACCOUNT_NOT_ACTIVE",
            AppError::FileNotUploaded => "FILE_NOT_FOUND",
            AppError::SizeMismatch { .. } => "SIZE_MISMATCH",
            AppError::TypeMismatch { .. } => "TYPE_MISMATCH",
            AppError::EmptyFile => "EMPTY_FILE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            AppError::ThumbnailRequired => "THUMBNAIL_REQUIRED",
            AppError::InvalidThumbnail => "INVALID_THUMBNAIL",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::WrongTokenKind { .. } => "WRONG_TOKEN_TYPE",
            AppError::InvalidMedia => "INVALID_MEDIA",
            AppError::NoMedia => "NO_MEDIA",
            AppError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Integrity failures destroy the upload session, so the same request
        // can never succeed on retry; rate limits and transient backend
        // errors can.
        matches!(
            self,
            AppError::RateLimited { .. }
                | AppError::Storage(_)
                | AppError::Internal(_)
                | AppError::InternalWithSource { .. }
        ) || self.is_database_error()
    }

    fn client_message(&self) -> String {
        if self.is_sensitive() {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        }
    }

    fn is_sensitive(&self) -> bool {
        matches!(
            self,
            AppError::Storage(_) | AppError::Internal(_) | AppError::InternalWithSource { .. }
        ) || self.is_database_error()
    }

    fn log_level(&self) -> LogLevel {
        match self.http_status_code() {
            500 => LogLevel::Error,
            429 => LogLevel::Warn,
            _ => LogLevel::Debug,
        }
    }
}

impl AppError {
    #[cfg(feature = "sqlx")]
    fn is_database_error(&self) -> bool {
        matches!(self, AppError::Database(_))
    }

    #[cfg(not(feature = "sqlx"))]
    fn is_database_error(&self) -> bool {
        false
    }

    /// Machine-readable details for the response body, when the error
    /// carries structured context the client needs (e.g. rate-limit reset).
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::RateLimited { reset_at } => Some(serde_json::json!({
                "resetAt": reset_at.to_rfc3339(),
            })),
            AppError::SizeMismatch { declared, actual } => Some(serde_json::json!({
                "declaredSize": declared,
                "actualSize": actual,
            })),
            AppError::TypeMismatch { expected, detected } => Some(serde_json::json!({
                "expectedType": expected,
                "detectedType": detected,
            })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_failures_are_terminal() {
        let err = AppError::SizeMismatch {
            declared: 1000,
            actual: 999,
        };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "SIZE_MISMATCH");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn token_errors_do_not_leak_detail() {
        assert_eq!(AppError::InvalidToken.http_status_code(), 401);
        assert_eq!(AppError::TokenExpired.http_status_code(), 401);
        assert_eq!(
            AppError::WrongTokenKind {
                required: "VALIDATOR"
            }
            .http_status_code(),
            403
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::Internal("pool exhausted".to_string());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "An internal error occurred");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn rate_limit_carries_reset_time() {
        let reset_at = Utc::now();
        let err = AppError::RateLimited { reset_at };
        assert_eq!(err.http_status_code(), 429);
        let details = err.details().unwrap();
        assert!(details.get("resetAt").is_some());
    }

    #[test]
    fn type_mismatch_surfaces_both_types() {
        let err = AppError::TypeMismatch {
            expected: "image/jpeg".to_string(),
            detected: Some("image/png".to_string()),
        };
        assert!(err.to_string().contains("image/jpeg"));
        assert!(err.to_string().contains("image/png"));
        let details = err.details().unwrap();
        assert_eq!(details["detectedType"], "image/png");
    }
}
