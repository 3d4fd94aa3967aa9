//! Error types for rewind status tracking.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure categories the backend reports for a rejected or failed rewind
/// request. The `Display` form is the stable reason string carried into a
/// synthetic FAILED progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewindErrorKind {
    #[error("GENERIC_ERROR")]
    Generic,

    #[error("API_ERROR")]
    Api,

    #[error("AUTHORIZATION_REQUIRED")]
    AuthorizationRequired,

    #[error("INVALID_RESPONSE")]
    InvalidResponse,

    #[error("INVALID_REWIND_ID")]
    InvalidRewindId,
}

/// Error payload for a failed rewind request, published verbatim to
/// observers of the rewind-error stream.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("rewind request failed: {kind}")]
pub struct RewindError {
    pub kind: RewindErrorKind,
    pub message: Option<String>,
}

impl RewindError {
    pub fn new(kind: RewindErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn with_message(kind: RewindErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }
}

/// Failure categories for a rewind status fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewindStatusErrorKind {
    #[error("GENERIC_ERROR")]
    Generic,

    #[error("API_ERROR")]
    Api,

    #[error("AUTHORIZATION_REQUIRED")]
    AuthorizationRequired,

    #[error("INVALID_RESPONSE")]
    InvalidResponse,
}

/// Error payload for a failed status fetch, published verbatim to observers
/// of the status-fetch-error stream.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("rewind status fetch failed: {kind}")]
pub struct RewindStatusFetchError {
    pub kind: RewindStatusErrorKind,
    pub message: Option<String>,
}

impl RewindStatusFetchError {
    pub fn new(kind: RewindStatusErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn with_message(kind: RewindStatusErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid log directive: {0}")]
    LogDirective(String),
}
