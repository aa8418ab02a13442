//! Error types for media-relay
//!
//! This module provides the error taxonomy for the library, including:
//! - Retrieval failures (extraction, timeout, missing artifact, fallback)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-relay
///
/// Parsing-level problems (malformed progress lines, unreadable sizes) never
/// become an `Error`; they degrade to "no event" or "0 bytes" where they occur.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "temp_dir")
        key: Option<String>,
    },

    /// The caller's request was rejected before any job started
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The extraction tool exited unsuccessfully
    #[error("extraction failed (exit code {code:?}): {detail}")]
    ExtractionFailed {
        /// Exit code of the tool, `None` if it was terminated by a signal
        code: Option<i32>,
        /// Most relevant diagnostic output of the tool
        detail: String,
    },

    /// The extraction tool exceeded its wall-clock bound and was killed
    #[error("extraction timed out after {seconds}s")]
    Timeout {
        /// The bound that was exceeded, in seconds
        seconds: u64,
    },

    /// The job was cancelled before it could finish
    #[error("job cancelled")]
    Cancelled,

    /// The tool reported success but the expected artifact is absent
    #[error("downloaded file not found at {path}")]
    ArtifactMissing {
        /// Where the artifact was expected
        path: PathBuf,
    },

    /// Both direct extraction and URL resolution failed
    ///
    /// This is the only failure a direct-mode caller sees as final. The
    /// original extraction failure is retained as the source.
    #[error("{original}")]
    FallbackFailed {
        /// The failure of the direct extraction attempt
        #[source]
        original: Box<Error>,
        /// Why the URL-resolution fallback failed
        fallback: String,
    },

    /// Artifact not found on disk
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    /// External tool could not be executed (missing binary, spawn failure)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Whether a direct-mode caller should try the URL-list fallback after this error
    ///
    /// Every extraction-level failure qualifies; request, admission and
    /// shutdown errors do not.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            Error::ExtractionFailed { .. }
                | Error::Timeout { .. }
                | Error::ArtifactMissing { .. }
                | Error::NotFound(_)
                | Error::ExternalTool(_)
                | Error::Io(_)
        )
    }
}

/// API error response format
///
/// Returned by the API whenever a request fails. Never carries partial
/// binary data.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": "Download failed",
///   "code": "fallback_failed",
///   "details": "extraction failed (exit code Some(1)): ERROR: Unsupported URL",
///   "suggestion": "Try a different quality or check if yt-dlp is installed"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Short human-readable summary
    pub error: String,

    /// Machine-readable error code (e.g., "invalid_request", "fallback_failed")
    pub code: String,

    /// Free-text detail of what went wrong
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// What the caller might try next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ApiError {
    /// Create a new API error with summary and code
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
            suggestion: None,
        }
    }

    /// Attach a detail string
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message, "invalid_request")
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 499-style client cancellation is reported as a conflict
            Error::Cancelled => 409,

            // 500 Internal Server Error - retrieval failed for good
            Error::ExtractionFailed { .. } => 500,
            Error::ArtifactMissing { .. } => 500,
            Error::FallbackFailed { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,

            // 503 Service Unavailable - the tool or the service is not available
            Error::ExternalTool(_) => 503,
            Error::ShuttingDown => 503,

            // 504 Gateway Timeout - the upstream extraction took too long
            Error::Timeout { .. } => 504,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::ExtractionFailed { .. } => "extraction_failed",
            Error::Timeout { .. } => "timeout",
            Error::Cancelled => "cancelled",
            Error::ArtifactMissing { .. } => "artifact_missing",
            Error::FallbackFailed { .. } => "fallback_failed",
            Error::NotFound(_) => "not_found",
            Error::ExternalTool(_) => "external_tool_error",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

/// Convert Error to ApiError for API responses
impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        match &error {
            Error::InvalidRequest(message) => ApiError::validation(message.clone()),
            Error::FallbackFailed { original, fallback } => {
                ApiError::new("Download failed", code)
                    .with_details(original.to_string())
                    .with_suggestion(format!(
                        "Try a different quality or check if yt-dlp is installed ({})",
                        fallback
                    ))
            }
            Error::ExternalTool(_) => ApiError::new("Extraction tool unavailable", code)
                .with_details(error.to_string())
                .with_suggestion("Install yt-dlp or set extractor.binary_path"),
            Error::ShuttingDown => ApiError::new("Service unavailable", code)
                .with_details(error.to_string()),
            Error::Timeout { .. } => ApiError::new("Download failed", code)
                .with_details(error.to_string())
                .with_suggestion("Try a lower quality"),
            _ => ApiError::new("Download failed", code).with_details(error.to_string()),
        }
    }
}
