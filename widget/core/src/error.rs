//! Error Types
//!
//! None of these are fatal to a mounted widget. Transport failures become an
//! apology message, configuration problems an inline notice, and a missing
//! background worker silently disables telemetry.

use thiserror::Error;

/// A chat request failed
///
/// Network failures, non-2xx statuses and malformed bodies all collapse into
/// this single type. Callers never branch on the cause.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("chat request failed: {cause}")]
pub struct TransportError {
    /// Human-readable cause
    pub cause: String,
}

impl TransportError {
    /// Create a transport error
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("malformed response: {e}"))
    }
}

/// Widget-level errors
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WidgetError {
    /// No chat endpoint could be determined
    #[error("Chat is not configured: {0}")]
    Configuration(String),

    /// The background worker could not be started
    #[error("Background worker unavailable: {0}")]
    WorkerUnavailable(String),
}
