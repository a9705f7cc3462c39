// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in a sync run.
//! `AppError` is what propagates to the top and ends the process;
//! `DownloadError` and `TransformError` are recovered per record and
//! never leave the mapping boundary on their own.

use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Instead of matching against magic strings like `"rate_limited"`,
/// the domain vocabulary is encoded in the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded; back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Classifies a failed response by the `code` field of its JSON body.
    pub fn classify(status: u16, body: &str) -> Self {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string))
            .map(|code| Self::from_api_response(&code))
            .unwrap_or_else(|| Self::from_http_status(status))
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Notion API ({method} {endpoint}) failed: {status} ({code}) {body}")]
    NotionService {
        method: String,
        endpoint: String,
        status: u16,
        code: NotionErrorCode,
        body: String,
    },

    #[error("Notion API ({method} {endpoint}) unreachable after retries: {message}")]
    Transport {
        method: String,
        endpoint: String,
        message: String,
    },

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error for {path}: {source}")]
    JsonParseError {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid pending update file {path}: {reason}")]
    InvalidPendingFile {
        path: std::path::PathBuf,
        reason: String,
    },

    #[error("{}", summarize_failures(failures))]
    FeedIncomplete { failures: Vec<String> },

    #[error("No records were synced from Notion")]
    EmptyFeed,

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Wraps an invariant violation that should be impossible to reach.
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::InternalError {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Renders the fatal message of a strict feed: the first few failures verbatim.
fn summarize_failures(failures: &[String]) -> String {
    let limit = crate::constants::FAILURE_SUMMARY_LIMIT;
    let summary = failures
        .iter()
        .take(limit)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let more = if failures.len() > limit {
        format!("\n...and {} more", failures.len() - limit)
    } else {
        String::new()
    };
    format!(
        "Failed to fetch some Notion images ({}):\n{}{}",
        failures.len(),
        summary,
        more
    )
}

/// Failure to download a remote image.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Image download failed: {status} ({url})")]
    Status { url: String, status: u16 },

    #[error("Image download failed: {message} ({url})")]
    Network { url: String, message: String },
}

/// The external transcoder could not produce the requested variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Image transform failed: {reason}")]
pub struct TransformError {
    pub reason: String,
}

impl TransformError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
