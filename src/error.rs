// src/error.rs

//! Unified error handling for the crawler application.
//!
//! Two layers live here:
//! - [`AppError`]: infrastructure errors returned by adapters (HTTP, files, config).
//! - [`Failure`]: pipeline failures recorded in the outcome log instead of being propagated.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
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

    /// CSV encoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Platform call rejected or unreachable
    #[error("Platform error in {operation}: {message}")]
    Platform { operation: String, message: String },

    /// Remote sheet API returned an error status
    #[error("Sheet API error ({status}): {message}")]
    Sheet { status: u16, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a platform error with the failing operation as context.
    pub fn platform(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Platform {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create a sheet API error.
    pub fn sheet(status: u16, message: impl Into<String>) -> Self {
        Self::Sheet {
            status,
            message: message.into(),
        }
    }
}

/// Where in the pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The get/search/list call for the whole target failed.
    Resolution,
    /// A single item inside an otherwise resolved target failed.
    ItemFetch,
    /// Writing a snapshot to one sink backend failed.
    Export,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Resolution => "resolution",
            FailureKind::ItemFetch => "item fetch",
            FailureKind::Export => "export",
        };
        f.write_str(name)
    }
}

/// A recorded, non-fatal pipeline failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl fmt::Display) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }

    pub fn resolution(message: impl fmt::Display) -> Self {
        Self::new(FailureKind::Resolution, message)
    }

    pub fn item_fetch(message: impl fmt::Display) -> Self {
        Self::new(FailureKind::ItemFetch, message)
    }

    pub fn export(message: impl fmt::Display) -> Self {
        Self::new(FailureKind::Export, message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_display() {
        let err = AppError::platform("search_items", "captcha required");
        assert_eq!(
            err.to_string(),
            "Platform error in search_items: captcha required"
        );
    }

    #[test]
    fn test_failure_display() {
        let failure = Failure::export("sheet tab missing");
        assert_eq!(failure.to_string(), "export failed: sheet tab missing");
        assert_eq!(failure.kind, FailureKind::Export);
    }
}
