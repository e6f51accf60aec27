//! Widget - The Conversation Core
//!
//! The widget owns everything one mounted chat needs: the session, the
//! transport, the conversation store, the UI state and the background
//! channel. Hosts drive it with a handful of operations and observe it
//! through [`WidgetMessage`]s.
//!
//! # State Machine
//!
//! ```text
//!            submit / mount
//!   Idle  ───────────────────▶  AwaitingResponse
//!    ▲                                 │
//!    └──── response, error reply ◀─────┘
//! ```
//!
//! At most one chat request is outstanding. While it is, input and send are
//! disabled and further submissions are ignored. Every completion, success or
//! failure, returns the widget to `Idle` and refocuses the input.
//!
//! # Observing Completion
//!
//! The transport call runs on a spawned task. Frame-driven hosts call
//! [`Widget::poll_response`] once per tick; headless callers await
//! [`Widget::wait_for_response`]. Both run the same completion logic.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::background::{
    AnalyticsEvent, AnalyticsEventKind, AnalyticsSink, BackgroundChannel, HttpAnalyticsSink,
    NullSink,
};
use crate::config::WidgetConfig;
use crate::error::{TransportError, WidgetError};
use crate::messages::{ChatResponse, ControlState, NodeId, UiState, WidgetMessage};
use crate::render::{
    render_bot_turn, render_user_message, RenderOptions, RenderedNode, DEFAULT_SUGGESTIONS,
    ERROR_MESSAGE, FALLBACK_GREETING, GREETING_SUGGESTIONS,
};
use crate::session::{Session, SessionId};
use crate::store::ConversationStore;
use crate::transport::{ChatTransport, HttpTransport};

/// Why a submission did not fire
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Text was empty after trimming
    Empty,
    /// A request is already in flight
    Busy,
    /// No chat endpoint is configured
    NotConfigured,
}

/// Result of a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// One chat request was issued
    Sent,
    /// Nothing happened
    Ignored(IgnoreReason),
}

/// A chat request in flight
struct PendingRequest {
    /// Text that was sent (empty for the greeting)
    message: String,
    /// Resolves with the transport result
    rx: oneshot::Receiver<Result<ChatResponse, TransportError>>,
}

impl PendingRequest {
    fn is_greeting(&self) -> bool {
        self.message.is_empty()
    }
}

/// The chat widget
pub struct Widget<T: ChatTransport + 'static> {
    /// Layered configuration
    config: WidgetConfig,
    /// Renderer settings derived from the configuration
    render_options: RenderOptions,
    /// Transport, absent when no endpoint could be resolved
    transport: Option<Arc<T>>,
    /// Why the transport is absent
    config_error: Option<WidgetError>,
    /// Conversation session
    session: Session,
    /// Displayed nodes
    store: ConversationStore,
    /// Current UI state
    state: UiState,
    /// Current control enablement
    controls: ControlState,
    /// Whether mount has run
    mounted: bool,
    /// Request in flight
    pending: Option<PendingRequest>,
    /// Side channel for keywords and analytics
    background: BackgroundChannel,
    /// Channel to the host surface
    tx: mpsc::Sender<WidgetMessage>,
}

impl Widget<HttpTransport> {
    /// Build a widget talking HTTP to the configured endpoint
    ///
    /// A missing endpoint does not fail construction. The widget mounts with
    /// an inline notice and ignores submissions.
    #[must_use]
    pub fn from_config(config: WidgetConfig, tx: mpsc::Sender<WidgetMessage>) -> Self {
        match HttpTransport::from_config(&config) {
            Ok(transport) => {
                tracing::info!(endpoint = %transport.endpoint(), source = %config.source(), "Chat endpoint resolved");
                Self::new(transport, config, tx)
            }
            Err(e) => {
                tracing::warn!("Widget not configured: {}", e);
                Self::unconfigured(e, config, tx)
            }
        }
    }
}

impl<T: ChatTransport + 'static> Widget<T> {
    /// Create a widget around a transport
    ///
    /// Starts the background channel when a tokio runtime is available.
    pub fn new(transport: T, config: WidgetConfig, tx: mpsc::Sender<WidgetMessage>) -> Self {
        Self::build(Some(Arc::new(transport)), None, config, tx)
    }

    /// Create a widget that has no endpoint
    pub fn unconfigured(
        error: WidgetError,
        config: WidgetConfig,
        tx: mpsc::Sender<WidgetMessage>,
    ) -> Self {
        Self::build(None, Some(error), config, tx)
    }

    fn build(
        transport: Option<Arc<T>>,
        config_error: Option<WidgetError>,
        config: WidgetConfig,
        tx: mpsc::Sender<WidgetMessage>,
    ) -> Self {
        let background = start_background(&config);
        register_logging(&background);

        Self {
            render_options: config.render_options(),
            config,
            transport,
            config_error,
            session: Session::new(),
            store: ConversationStore::new(),
            state: UiState::Idle,
            controls: ControlState::idle(),
            mounted: false,
            pending: None,
            background,
            tx,
        }
    }

    /// Replace the background channel
    #[must_use]
    pub fn with_background(mut self, background: BackgroundChannel) -> Self {
        register_logging(&background);
        self.background = background;
        self
    }

    /// Get the session ID
    pub fn session_id(&self) -> &SessionId {
        &self.session.id
    }

    /// Get current state
    pub fn state(&self) -> UiState {
        self.state
    }

    /// Get current control enablement
    pub fn controls(&self) -> ControlState {
        self.controls
    }

    /// Get the conversation
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Get the background channel
    pub fn background(&self) -> &BackgroundChannel {
        &self.background
    }

    /// Whether a chat endpoint is available
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Whether mount has run
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether a chat request is in flight
    pub fn has_pending_request(&self) -> bool {
        self.pending.is_some()
    }

    /// Mount the widget and request the greeting
    ///
    /// Only the first call has any effect. Returns whether the greeting
    /// request was issued.
    pub async fn mount(&mut self) -> bool {
        if self.mounted {
            tracing::debug!("Widget already mounted");
            return false;
        }
        self.mounted = true;

        tracing::info!(session = %self.session.id, "Mounting widget");

        self.send(WidgetMessage::Title {
            text: self.config.widget_title.clone(),
        })
        .await;
        self.set_state(UiState::Idle).await;

        if let Some(ref error) = self.config_error {
            let notice = RenderedNode::Notice {
                text: error.to_string(),
            };
            self.append(notice).await;
            return false;
        }

        self.start_request(String::new()).await
    }

    /// Send a user message
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        if self.transport.is_none() {
            return SubmitOutcome::Ignored(IgnoreReason::NotConfigured);
        }
        if self.state == UiState::AwaitingResponse {
            tracing::debug!("Request in flight, ignoring submission");
            return SubmitOutcome::Ignored(IgnoreReason::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored(IgnoreReason::Empty);
        }

        let id = self.append(render_user_message(text)).await;
        self.send(WidgetMessage::ScrollTo { id }).await;

        self.background
            .track(&AnalyticsEvent::user_message(&self.session.id, text));
        self.background.process_message(text);

        if self.start_request(text.to_string()).await {
            SubmitOutcome::Sent
        } else {
            SubmitOutcome::Ignored(IgnoreReason::NotConfigured)
        }
    }

    /// Send a suggestion chip as if it were typed
    pub async fn click_suggestion(&mut self, suggestion: &str) -> SubmitOutcome {
        let outcome = self.submit(suggestion).await;
        if outcome == SubmitOutcome::Sent {
            self.background
                .track(&AnalyticsEvent::suggestion_click(&self.session.id, suggestion));
        }
        outcome
    }

    /// Report that the user followed a book link
    ///
    /// Returns whether the card exists and has a link.
    pub fn track_book_click(&self, node: NodeId, card_index: usize) -> bool {
        let Some(RenderedNode::BookGroup { cards }) = self.store.get(node) else {
            return false;
        };
        let Some(card) = cards.get(card_index) else {
            return false;
        };
        let Some(ref link) = card.link else {
            return false;
        };

        self.background.track(&AnalyticsEvent::new(
            &self.session.id,
            AnalyticsEventKind::BookClick {
                book_title: card.title.clone(),
                book_author: card.byline.clone(),
                amazon_link: link.as_str().to_string(),
            },
        ));
        true
    }

    /// Apply the response if it has arrived
    ///
    /// Call this regularly. Returns true if a response was applied.
    pub async fn poll_response(&mut self) -> bool {
        let result = {
            let Some(pending) = self.pending.as_mut() else {
                return false;
            };
            match pending.rx.try_recv() {
                Ok(result) => result,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => Err(request_task_lost()),
            }
        };

        if let Some(pending) = self.pending.take() {
            self.complete(&pending, result).await;
        }
        true
    }

    /// Wait for the outstanding response and apply it
    ///
    /// Returns false when nothing was in flight.
    pub async fn wait_for_response(&mut self) -> bool {
        let Some(mut pending) = self.pending.take() else {
            return false;
        };
        let result = (&mut pending.rx)
            .await
            .unwrap_or_else(|_| Err(request_task_lost()));
        self.complete(&pending, result).await;
        true
    }

    /// Enter `AwaitingResponse` and spawn the transport call
    async fn start_request(&mut self, message: String) -> bool {
        let Some(transport) = self.transport.clone() else {
            return false;
        };

        self.set_state(UiState::AwaitingResponse).await;

        let (result_tx, rx) = oneshot::channel();
        let session = self.session.id.clone();
        let text = message.clone();
        tokio::spawn(async move {
            let result = transport.send(&session, &text).await;
            let _ = result_tx.send(result);
        });

        self.pending = Some(PendingRequest { message, rx });
        true
    }

    /// Render the outcome and return to `Idle`
    async fn complete(
        &mut self,
        pending: &PendingRequest,
        result: Result<ChatResponse, TransportError>,
    ) {
        let nodes = match result {
            Ok(response) => render_bot_turn(&response, &pending.message, &self.render_options),
            Err(e) => {
                tracing::warn!(greeting = pending.is_greeting(), "Chat request failed: {}", e);
                if pending.is_greeting() {
                    vec![RenderedNode::bot_text(FALLBACK_GREETING, GREETING_SUGGESTIONS)]
                } else {
                    vec![RenderedNode::bot_text(ERROR_MESSAGE, DEFAULT_SUGGESTIONS)]
                }
            }
        };

        let mut last = None;
        for node in nodes {
            last = Some(self.append(node).await);
        }
        if let Some(id) = last {
            self.send(WidgetMessage::ScrollTo { id }).await;
        }

        self.set_state(UiState::Idle).await;
        self.send(WidgetMessage::FocusInput).await;
    }

    /// Append a node and tell the surface
    async fn append(&mut self, node: RenderedNode) -> NodeId {
        let id = self.store.append(node.clone());
        self.send(WidgetMessage::NodeAppended { id, node }).await;
        id
    }

    /// Set state and notify the surface
    async fn set_state(&mut self, state: UiState) {
        self.state = state;
        self.controls = match state {
            UiState::AwaitingResponse => ControlState::awaiting(),
            UiState::Idle | UiState::Error => ControlState::idle(),
        };
        self.send(WidgetMessage::StateChanged {
            state,
            controls: self.controls,
        })
        .await;
    }

    /// Send a message to the surface
    async fn send(&self, msg: WidgetMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

fn request_task_lost() -> TransportError {
    TransportError::new("request task ended without a result")
}

/// Start the background worker, or fall back to a disabled channel
fn start_background(config: &WidgetConfig) -> BackgroundChannel {
    let sink: Arc<dyn AnalyticsSink> = match config.resolve_analytics_endpoint() {
        Some(endpoint) => Arc::new(HttpAnalyticsSink::new(endpoint)),
        None => Arc::new(NullSink),
    };

    BackgroundChannel::start(sink).unwrap_or_else(|e| {
        tracing::warn!("{}; background tasks disabled", e);
        BackgroundChannel::disabled()
    })
}

fn register_logging(background: &BackgroundChannel) {
    background.on_result(|result| tracing::debug!(?result, "Background result"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoTransport;

    #[async_trait]
    impl ChatTransport for EchoTransport {
        fn name(&self) -> &str {
            "Echo"
        }

        async fn send(
            &self,
            _session: &SessionId,
            message: &str,
        ) -> Result<ChatResponse, TransportError> {
            Ok(ChatResponse::text(format!("echo: {message}")))
        }
    }

    fn widget(tx: mpsc::Sender<WidgetMessage>) -> Widget<EchoTransport> {
        Widget::new(EchoTransport, WidgetConfig::default(), tx)
            .with_background(BackgroundChannel::disabled())
    }

    #[tokio::test]
    async fn test_widget_creation() {
        let (tx, _rx) = mpsc::channel(100);
        let widget = widget(tx);

        assert_eq!(widget.state(), UiState::Idle);
        assert_eq!(widget.controls(), ControlState::idle());
        assert!(widget.is_configured());
        assert!(!widget.is_mounted());
        assert!(widget.store().is_empty());
    }

    #[tokio::test]
    async fn test_mount_sends_title_first() {
        let (tx, mut rx) = mpsc::channel(100);
        let mut widget = widget(tx);

        assert!(widget.mount().await);
        assert!(!widget.mount().await);

        assert_eq!(
            rx.recv().await.unwrap(),
            WidgetMessage::Title {
                text: "Book Buddy".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_poll_without_request() {
        let (tx, _rx) = mpsc::channel(100);
        let mut widget = widget(tx);
        assert!(!widget.poll_response().await);
        assert!(!widget.wait_for_response().await);
    }

    #[tokio::test]
    async fn test_submit_round_trip() {
        let (tx, _rx) = mpsc::channel(100);
        let mut widget = widget(tx);

        assert_eq!(widget.submit("  hi  ").await, SubmitOutcome::Sent);
        assert_eq!(widget.state(), UiState::AwaitingResponse);
        assert!(widget.has_pending_request());

        assert!(widget.wait_for_response().await);
        assert_eq!(widget.state(), UiState::Idle);
        assert_eq!(
            widget.store().get(NodeId(1)),
            Some(&RenderedNode::bot_text("echo: hi", Vec::<String>::new()))
        );
    }

    #[tokio::test]
    async fn test_unconfigured_widget_shows_notice() {
        let (tx, _rx) = mpsc::channel(100);
        let mut widget: Widget<EchoTransport> = Widget::unconfigured(
            WidgetError::Configuration("no chat endpoint".to_string()),
            WidgetConfig::default(),
            tx,
        );

        assert!(!widget.mount().await);
        assert_eq!(
            widget.store().get(NodeId(0)),
            Some(&RenderedNode::Notice {
                text: "Chat is not configured: no chat endpoint".to_string()
            })
        );
        assert_eq!(
            widget.submit("hello").await,
            SubmitOutcome::Ignored(IgnoreReason::NotConfigured)
        );
        assert_eq!(widget.store().len(), 1);
    }
}
