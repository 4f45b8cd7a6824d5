// src/error.rs

//! Unified error handling for the monitoring engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for sitewatch operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed add-site request (bad URL, interval or page budget)
    #[error("Invalid site configuration: {0}")]
    InvalidConfig(String),

    /// The URL is already being monitored
    #[error("Site {0} is already being monitored")]
    DuplicateSite(String),

    /// The URL is not being monitored
    #[error("Site {0} is not being monitored")]
    NotFound(String),

    /// Crawl step failed or timed out
    #[error("Crawl failed for {url}: {message}")]
    CrawlFailure { url: String, message: String },

    /// Artifact generation failed or timed out
    #[error("Regeneration failed for {url}: {message}")]
    RegenerationFailure { url: String, message: String },

    /// Another check for the same site holds the lock
    #[error("A check is already in progress for {0}")]
    ConcurrentCheckInProgress(String),

    /// Malformed RPC request (bad JSON, unknown action)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Closed set of error categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidConfig,
    DuplicateSite,
    NotFound,
    CrawlFailure,
    RegenerationFailure,
    ConcurrentCheckInProgress,
    BadRequest,
    Internal,
}

impl ErrorKind {
    /// HTTP status used when this error is the whole response.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidConfig | ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::DuplicateSite | ErrorKind::ConcurrentCheckInProgress => 409,
            ErrorKind::CrawlFailure | ErrorKind::RegenerationFailure => 502,
            ErrorKind::Internal => 500,
        }
    }
}

impl AppError {
    /// Create an invalid site configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a configuration file error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl fmt::Display) -> Self {
        Self::BadRequest(message.to_string())
    }

    /// Create a crawl failure for a site.
    pub fn crawl(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::CrawlFailure {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a regeneration failure for a site.
    pub fn regeneration(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::RegenerationFailure {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Category of this error as reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::DuplicateSite(_) => ErrorKind::DuplicateSite,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::CrawlFailure { .. } => ErrorKind::CrawlFailure,
            Self::RegenerationFailure { .. } => ErrorKind::RegenerationFailure,
            Self::ConcurrentCheckInProgress(_) => ErrorKind::ConcurrentCheckInProgress,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AppError::crawl("https://a.dev", "boom").kind(),
            ErrorKind::CrawlFailure
        );
        assert_eq!(
            AppError::ConcurrentCheckInProgress("https://a.dev".into()).kind(),
            ErrorKind::ConcurrentCheckInProgress
        );
        assert_eq!(
            AppError::config("missing").kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ConcurrentCheckInProgress).unwrap();
        assert_eq!(json, "\"concurrent_check_in_progress\"");
    }

    #[test]
    fn test_display_messages() {
        let err = AppError::regeneration("https://a.dev", "timed out after 60s");
        assert_eq!(
            err.to_string(),
            "Regeneration failed for https://a.dev: timed out after 60s"
        );
    }
}
