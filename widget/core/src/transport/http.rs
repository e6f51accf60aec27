//! HTTP Transport
//!
//! `POST <endpoint>` with a JSON body of `{user_id, message}`. The full
//! response body is read and parsed before returning; there is no streaming.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::ChatTransport;
use crate::config::WidgetConfig;
use crate::error::{TransportError, WidgetError};
use crate::messages::{ChatRequest, ChatResponse};
use crate::session::SessionId;

/// Chat transport over HTTP
#[derive(Clone)]
pub struct HttpTransport {
    /// Resolved chat endpoint
    endpoint: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `endpoint`
    ///
    /// No timeout is applied unless one is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            endpoint: endpoint.into(),
            http_client: builder.build()?,
        })
    }

    /// Create from a layered configuration
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Configuration`] when no endpoint can be
    /// resolved or the client cannot be built.
    pub fn from_config(config: &WidgetConfig) -> Result<Self, WidgetError> {
        let endpoint = config.resolve_endpoint()?;
        Self::new(endpoint, config.request_timeout)
            .map_err(|e| WidgetError::Configuration(e.cause))
    }

    /// The endpoint requests are sent to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Extract a readable cause from an error response body
///
/// Backends report failures as `{"detail": "..."}`; anything else is
/// reported by status alone.
fn error_cause(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
    match detail {
        Some(detail) => format!("server returned {status}: {detail}"),
        None => format!("server returned {status}"),
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn send(
        &self,
        session: &SessionId,
        message: &str,
    ) -> Result<ChatResponse, TransportError> {
        tracing::debug!(
            session = %session,
            message_len = message.len(),
            endpoint = %self.endpoint,
            "Sending chat request"
        );

        let body = ChatRequest {
            user_id: session.as_str(),
            message,
        };

        let result: Result<ChatResponse, TransportError> = async {
            let response = self
                .http_client
                .post(&self.endpoint)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(TransportError::new(error_cause(status, &text)));
            }

            Ok(serde_json::from_str::<ChatResponse>(&text)?)
        }
        .await;

        if let Err(ref e) = result {
            tracing::warn!(session = %session, "Chat request failed: {}", e);
        }
        result
    }
}
