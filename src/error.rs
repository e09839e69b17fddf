//! Unified error types for the history core
//!
//! Every failure of a page request flows through `HistoryError` so the
//! FFI envelope, the CLI and the aggregator report errors the same way.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::SourceLabel;

/// Main error type for all history operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
    /// Remote source the failure came from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<SourceLabel>,
}

impl HistoryError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source_label: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, label: SourceLabel) -> Self {
        self.source_label = Some(label);
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn network_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvariantViolation, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// True when a remote source call failed (network, timeout, decode).
    /// The caller may retry the same context.
    pub fn is_source_fetch(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::NetworkError
                | ErrorCode::RateLimited
                | ErrorCode::Timeout
                | ErrorCode::ParseError
                | ErrorCode::JsonError
        )
    }
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(label) = self.source_label {
            write!(f, " <{}>", label)?;
        }
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for HistoryError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidAddress,

    // Source fetch errors
    NetworkError,
    RateLimited,
    Timeout,
    ParseError,
    JsonError,

    // Programmer errors
    InvariantViolation,

    // Internal
    Internal,
}

/// Result type alias for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

// Conversions from common error types

impl From<serde_json::Error> for HistoryError {
    fn from(e: serde_json::Error) -> Self {
        HistoryError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<std::io::Error> for HistoryError {
    fn from(e: std::io::Error) -> Self {
        HistoryError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<url::ParseError> for HistoryError {
    fn from(e: url::ParseError) -> Self {
        HistoryError::new(ErrorCode::InvalidInput, format!("Invalid URL: {}", e))
    }
}

impl From<reqwest::Error> for HistoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HistoryError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            HistoryError::new(ErrorCode::NetworkError, "Connection failed")
        } else if e.is_decode() {
            HistoryError::new(ErrorCode::ParseError, e.to_string())
        } else if e.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            HistoryError::new(ErrorCode::RateLimited, e.to_string())
        } else {
            HistoryError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}
