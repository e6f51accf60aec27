//! Analytics Events and Sinks
//!
//! Events are advisory. A lost event is logged and forgotten; nothing in the
//! widget waits for or depends on delivery.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// What happened
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalyticsEventKind {
    /// The user sent a message
    UserMessage {
        /// Trimmed message text
        message: String,
        /// Length of the trimmed text in characters
        content_length: usize,
    },
    /// The user clicked a suggestion chip
    SuggestionClick {
        /// Chip text
        suggestion: String,
    },
    /// The user followed a book link
    BookClick {
        /// Card title
        book_title: String,
        /// Card byline
        book_author: String,
        /// Followed link
        amazon_link: String,
    },
}

/// Analytics envelope as posted to the sink
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Event kind and its fields
    #[serde(flatten)]
    pub kind: AnalyticsEventKind,
    /// Session that produced the event
    pub session_id: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl AnalyticsEvent {
    /// Stamp an event with session and current time
    #[must_use]
    pub fn new(session: &SessionId, kind: AnalyticsEventKind) -> Self {
        Self {
            kind,
            session_id: session.as_str().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// `user_message` event
    #[must_use]
    pub fn user_message(session: &SessionId, message: &str) -> Self {
        Self::new(
            session,
            AnalyticsEventKind::UserMessage {
                message: message.to_string(),
                content_length: message.chars().count(),
            },
        )
    }

    /// `suggestion_click` event
    #[must_use]
    pub fn suggestion_click(session: &SessionId, suggestion: &str) -> Self {
        Self::new(
            session,
            AnalyticsEventKind::SuggestionClick {
                suggestion: suggestion.to_string(),
            },
        )
    }
}

/// Destination for analytics events
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Deliver one event
    ///
    /// Returns whether the sink accepted it.
    async fn track(&self, event: &serde_json::Value) -> anyhow::Result<bool>;
}

/// Upper bound on a single analytics post
pub const ANALYTICS_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts events as JSON
#[derive(Clone)]
pub struct HttpAnalyticsSink {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpAnalyticsSink {
    /// Create a sink posting to `endpoint`
    ///
    /// Each post gives up after [`ANALYTICS_TIMEOUT`].
    pub fn new(endpoint: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(ANALYTICS_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Analytics client without timeout: {}", e);
                reqwest::Client::new()
            });

        Self {
            endpoint: endpoint.into(),
            http_client,
        }
    }

    /// The sink URL
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalyticsSink for HttpAnalyticsSink {
    async fn track(&self, event: &serde_json::Value) -> anyhow::Result<bool> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(endpoint = %self.endpoint, %status, "Analytics sink rejected event");
        }
        Ok(status.is_success())
    }
}

/// Accepts every event without any I/O
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

#[async_trait]
impl AnalyticsSink for NullSink {
    async fn track(&self, _event: &serde_json::Value) -> anyhow::Result<bool> {
        Ok(true)
    }
}
