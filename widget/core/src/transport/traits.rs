//! Chat Transport Trait
//!
//! The widget talks to its backend through this trait so tests and
//! alternative hosts can swap the HTTP client for something else.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::messages::ChatResponse;
use crate::session::SessionId;

/// Request/response exchange with the chat backend
///
/// One call is one attempt. Implementations do not retry.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Get the transport name (e.g., "HTTP")
    fn name(&self) -> &str;

    /// Send a message and wait for the full response
    ///
    /// An empty `message` requests the initial greeting.
    async fn send(&self, session: &SessionId, message: &str)
        -> Result<ChatResponse, TransportError>;
}
