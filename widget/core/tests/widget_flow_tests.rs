//! Integration Tests for the Widget State Machine
//!
//! These tests drive a [`Widget`] the way a host would and check what reaches
//! the transport, the conversation store and the surface channel.
//!
//! # Mock Transport
//!
//! The mock transport can:
//! - Count and record every request
//! - Return queued responses in order
//! - Fail every request (error injection)
//! - Hold requests until the test releases them

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::{mpsc, Semaphore};

use bookchat_core::render::{
    DEFAULT_SUGGESTIONS, ERROR_MESSAGE, FALLBACK_GREETING, FALLBACK_MESSAGE, GREETING_SUGGESTIONS,
};
use bookchat_core::{
    AnalyticsSink, BackgroundChannel, BackgroundResult, BookRecommendation, ChatResponse, ChatTransport, Content,
    ControlState, IgnoreReason, NodeId, RenderedNode, Sender, SessionId, SubmitOutcome,
    TransportError, UiState, Widget, WidgetConfig, WidgetMessage,
};

// ============================================================================
// Configurable Mock Transport
// ============================================================================

/// Configuration for error injection in the mock transport
#[derive(Clone, Debug, Default)]
struct ErrorInjectionConfig {
    /// If true, all requests fail
    fail_all_requests: bool,
    /// Cause reported by failing requests
    error_message: String,
}

/// State shared between the test and the transport owned by the widget
#[derive(Default)]
struct MockState {
    request_count: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
    responses: Mutex<VecDeque<ChatResponse>>,
    error_config: ErrorInjectionConfig,
    gate: Option<Semaphore>,
}

#[derive(Clone)]
struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    fn new() -> Self {
        Self {
            state: Arc::new(MockState::default()),
        }
    }

    fn with_error_injection(config: ErrorInjectionConfig) -> Self {
        Self {
            state: Arc::new(MockState {
                error_config: config,
                ..Default::default()
            }),
        }
    }

    /// Requests wait for [`MockTransport::release`]
    fn gated() -> Self {
        Self {
            state: Arc::new(MockState {
                gate: Some(Semaphore::new(0)),
                ..Default::default()
            }),
        }
    }

    fn release(&self) {
        if let Some(ref gate) = self.state.gate {
            gate.add_permits(1);
        }
    }

    fn respond_with(&self, response: ChatResponse) {
        self.state.responses.lock().push_back(response);
    }

    fn request_count(&self) -> usize {
        self.state.request_count.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.state.requests.lock().clone()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn send(
        &self,
        session: &SessionId,
        message: &str,
    ) -> Result<ChatResponse, TransportError> {
        self.state.request_count.fetch_add(1, Ordering::SeqCst);
        self.state
            .requests
            .lock()
            .push((session.to_string(), message.to_string()));

        if let Some(ref gate) = self.state.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.state.error_config.fail_all_requests {
            return Err(TransportError::new(
                self.state.error_config.error_message.clone(),
            ));
        }

        let queued = self.state.responses.lock().pop_front();
        Ok(queued.unwrap_or_else(|| ChatResponse::text(format!("You said: {message}"))))
    }
}

/// Sink that forwards every event to the test
struct RecordingSink {
    tx: mpsc::UnboundedSender<serde_json::Value>,
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn track(&self, event: &serde_json::Value) -> anyhow::Result<bool> {
        let _ = self.tx.send(event.clone());
        Ok(true)
    }
}

/// Sink whose posts never complete
struct StalledSink;

#[async_trait]
impl AnalyticsSink for StalledSink {
    async fn track(&self, _event: &serde_json::Value) -> anyhow::Result<bool> {
        std::future::pending().await
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn widget_with(
    transport: &MockTransport,
) -> (Widget<MockTransport>, mpsc::Receiver<WidgetMessage>) {
    let (tx, rx) = mpsc::channel(256);
    let widget = Widget::new(transport.clone(), WidgetConfig::default(), tx)
        .with_background(BackgroundChannel::disabled());
    (widget, rx)
}

fn drain(rx: &mut mpsc::Receiver<WidgetMessage>) -> Vec<WidgetMessage> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}

fn nodes(widget: &Widget<MockTransport>) -> Vec<RenderedNode> {
    widget
        .store()
        .entries()
        .iter()
        .map(|e| e.node.clone())
        .collect()
}

fn user(text: &str) -> RenderedNode {
    RenderedNode::Text {
        sender: Sender::User,
        content: Content::Plain(text.to_string()),
        suggestions: Vec::new(),
    }
}

// ============================================================================
// Greeting
// ============================================================================

#[tokio::test]
async fn test_mount_requests_greeting_once() {
    let transport = MockTransport::new();
    transport.respond_with(
        ChatResponse::text("Welcome to the shelf!").with_suggestions(["Fantasy", "Mystery"]),
    );
    let (mut widget, _rx) = widget_with(&transport);

    assert!(widget.mount().await);
    assert!(!widget.mount().await);
    assert!(widget.wait_for_response().await);

    assert_eq!(transport.request_count(), 1);
    assert_eq!(transport.requests()[0].1, "");
    assert_eq!(
        nodes(&widget),
        vec![RenderedNode::bot_text(
            "Welcome to the shelf!",
            ["Fantasy", "Mystery"]
        )]
    );
}

#[tokio::test]
async fn test_greeting_failure_uses_fixed_fallback() {
    let transport = MockTransport::with_error_injection(ErrorInjectionConfig {
        fail_all_requests: true,
        error_message: "connection refused".to_string(),
    });
    let (mut widget, _rx) = widget_with(&transport);

    widget.mount().await;
    widget.wait_for_response().await;

    assert_eq!(
        nodes(&widget),
        vec![RenderedNode::bot_text(FALLBACK_GREETING, GREETING_SUGGESTIONS)]
    );
    assert_eq!(widget.state(), UiState::Idle);
}

#[tokio::test]
async fn test_empty_greeting_renders_nothing_but_refocuses() {
    let transport = MockTransport::new();
    transport.respond_with(ChatResponse::default());
    let (mut widget, mut rx) = widget_with(&transport);

    widget.mount().await;
    widget.wait_for_response().await;

    assert!(widget.store().is_empty());
    assert_eq!(drain(&mut rx).last(), Some(&WidgetMessage::FocusInput));
}

// ============================================================================
// Message Exchange
// ============================================================================

#[tokio::test]
async fn test_each_submit_is_one_request_with_stable_session() {
    let transport = MockTransport::new();
    let (mut widget, _rx) = widget_with(&transport);

    for message in ["Something cozy", "  Dragons, please  ", "Shorter ones"] {
        assert_eq!(widget.submit(message).await, SubmitOutcome::Sent);
        widget.wait_for_response().await;
    }

    let requests = transport.requests();
    assert_eq!(transport.request_count(), 3);
    assert_eq!(
        requests.iter().map(|(_, m)| m.as_str()).collect::<Vec<_>>(),
        vec!["Something cozy", "Dragons, please", "Shorter ones"]
    );
    let session = widget.session_id().to_string();
    assert!(requests.iter().all(|(s, _)| *s == session));
}

#[tokio::test]
async fn test_blank_submit_is_ignored() {
    let transport = MockTransport::new();
    let (mut widget, mut rx) = widget_with(&transport);

    assert_eq!(
        widget.submit("   \n\t").await,
        SubmitOutcome::Ignored(IgnoreReason::Empty)
    );
    assert_eq!(
        widget.submit("").await,
        SubmitOutcome::Ignored(IgnoreReason::Empty)
    );

    assert_eq!(transport.request_count(), 0);
    assert!(widget.store().is_empty());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_submit_while_awaiting_is_ignored() {
    let transport = MockTransport::gated();
    let (mut widget, _rx) = widget_with(&transport);

    assert_eq!(widget.submit("first").await, SubmitOutcome::Sent);
    assert_eq!(
        widget.submit("second").await,
        SubmitOutcome::Ignored(IgnoreReason::Busy)
    );

    transport.release();
    widget.wait_for_response().await;

    assert_eq!(transport.request_count(), 1);
    assert_eq!(widget.store().len(), 2);
}

#[tokio::test]
async fn test_books_only_response() {
    let transport = MockTransport::new();
    transport.respond_with(ChatResponse::default().with_books(vec![
        BookRecommendation::titled("The Left Hand of Darkness"),
        BookRecommendation::titled("Kindred"),
    ]));
    let (mut widget, _rx) = widget_with(&transport);

    widget.submit("classic sci-fi").await;
    widget.wait_for_response().await;

    let shown = nodes(&widget);
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0], user("classic sci-fi"));
    match &shown[1] {
        RenderedNode::BookGroup { cards } => {
            let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
            assert_eq!(titles, vec!["The Left Hand of Darkness", "Kindred"]);
        }
        other => panic!("Expected book group, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_response_uses_fallback_reply() {
    let transport = MockTransport::new();
    transport.respond_with(ChatResponse::default());
    let (mut widget, _rx) = widget_with(&transport);

    widget.submit("hmm").await;
    widget.wait_for_response().await;

    let reply = &nodes(&widget)[1];
    assert_eq!(
        *reply,
        RenderedNode::bot_text(FALLBACK_MESSAGE, DEFAULT_SUGGESTIONS)
    );
    assert_eq!(reply.suggestions().len(), 3);
}

#[tokio::test]
async fn test_transport_failure_shows_apology() {
    let transport = MockTransport::with_error_injection(ErrorInjectionConfig {
        fail_all_requests: true,
        error_message: "server returned 500".to_string(),
    });
    let (mut widget, _rx) = widget_with(&transport);

    widget.submit("anything").await;
    widget.wait_for_response().await;

    assert_eq!(
        nodes(&widget),
        vec![
            user("anything"),
            RenderedNode::bot_text(ERROR_MESSAGE, DEFAULT_SUGGESTIONS),
        ]
    );
    assert_eq!(widget.controls(), ControlState::idle());
}

#[tokio::test]
async fn test_suggestion_click_routes_as_message() {
    let transport = MockTransport::new();
    let (mut widget, _rx) = widget_with(&transport);

    assert_eq!(
        widget.click_suggestion("Recommend Sci-Fi").await,
        SubmitOutcome::Sent
    );

    assert_eq!(widget.store().get(NodeId(0)), Some(&user("Recommend Sci-Fi")));
    widget.wait_for_response().await;
    assert_eq!(transport.request_count(), 1);
    assert_eq!(transport.requests()[0].1, "Recommend Sci-Fi");
}

// ============================================================================
// Control State
// ============================================================================

#[tokio::test]
async fn test_input_disabled_until_resolution() {
    let transport = MockTransport::gated();
    let (mut widget, mut rx) = widget_with(&transport);

    widget.submit("slow one").await;
    assert_eq!(widget.controls(), ControlState::awaiting());

    // Nothing arrives while the transport holds the request
    for _ in 0..10 {
        tokio::task::yield_now().await;
        assert!(!widget.poll_response().await);
        assert_eq!(widget.state(), UiState::AwaitingResponse);
        assert!(!widget.controls().input_enabled);
        assert!(!widget.controls().send_enabled);
    }

    transport.release();
    while !widget.poll_response().await {
        tokio::task::yield_now().await;
    }

    assert_eq!(widget.controls(), ControlState::idle());

    let messages = drain(&mut rx);
    assert_eq!(
        messages,
        vec![
            WidgetMessage::NodeAppended {
                id: NodeId(0),
                node: user("slow one"),
            },
            WidgetMessage::ScrollTo { id: NodeId(0) },
            WidgetMessage::StateChanged {
                state: UiState::AwaitingResponse,
                controls: ControlState::awaiting(),
            },
            WidgetMessage::NodeAppended {
                id: NodeId(1),
                node: RenderedNode::bot_text("You said: slow one", Vec::<String>::new()),
            },
            WidgetMessage::ScrollTo { id: NodeId(1) },
            WidgetMessage::StateChanged {
                state: UiState::Idle,
                controls: ControlState::idle(),
            },
            WidgetMessage::FocusInput,
        ]
    );
}

#[tokio::test]
async fn test_failure_also_reenables_input() {
    let transport = MockTransport::with_error_injection(ErrorInjectionConfig {
        fail_all_requests: true,
        error_message: "timeout".to_string(),
    });
    let (mut widget, mut rx) = widget_with(&transport);

    widget.submit("hello?").await;
    assert!(!widget.controls().input_enabled);
    widget.wait_for_response().await;

    let messages = drain(&mut rx);
    let tail = &messages[messages.len() - 2..];
    assert_eq!(
        tail,
        [
            WidgetMessage::StateChanged {
                state: UiState::Idle,
                controls: ControlState::idle(),
            },
            WidgetMessage::FocusInput,
        ]
    );
    assert_eq!(widget.submit("again").await, SubmitOutcome::Sent);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_unconfigured_widget_never_crashes() {
    let (tx, mut rx) = mpsc::channel(64);
    let mut widget = Widget::from_config(WidgetConfig::default(), tx);

    assert!(!widget.is_configured());
    assert!(!widget.mount().await);
    assert_eq!(
        widget.submit("hello").await,
        SubmitOutcome::Ignored(IgnoreReason::NotConfigured)
    );

    let messages = drain(&mut rx);
    assert!(messages.iter().any(|m| matches!(
        m,
        WidgetMessage::NodeAppended { node: RenderedNode::Notice { text }, .. }
            if text.starts_with("Chat is not configured")
    )));
    assert_eq!(widget.state(), UiState::Idle);
}

// ============================================================================
// Analytics
// ============================================================================

async fn next_of_type(
    events: &mut mpsc::UnboundedReceiver<serde_json::Value>,
    kind: &str,
) -> serde_json::Value {
    loop {
        let event = events.recv().await.expect("sink closed");
        if event["type"] == kind {
            return event;
        }
    }
}

#[tokio::test]
async fn test_submit_and_clicks_are_tracked() {
    let (sink_tx, mut events) = mpsc::unbounded_channel();
    let background = BackgroundChannel::start(Arc::new(RecordingSink { tx: sink_tx })).unwrap();

    let transport = MockTransport::new();
    transport.respond_with(
        ChatResponse::default().with_books(vec![BookRecommendation {
            authors: vec!["Octavia E. Butler".to_string()],
            isbn13: Some("9780807083697".to_string()),
            ..BookRecommendation::titled("Kindred")
        }]),
    );
    let (tx, _rx) = mpsc::channel(256);
    let mut widget =
        Widget::new(transport.clone(), WidgetConfig::default(), tx).with_background(background);

    widget.click_suggestion("Recommend Sci-Fi").await;
    widget.wait_for_response().await;

    let message = next_of_type(&mut events, "user_message").await;
    assert_eq!(message["message"], "Recommend Sci-Fi");
    assert_eq!(message["session_id"], widget.session_id().as_str());

    let click = next_of_type(&mut events, "suggestion_click").await;
    assert_eq!(click["suggestion"], "Recommend Sci-Fi");

    assert!(widget.track_book_click(NodeId(1), 0));
    assert!(!widget.track_book_click(NodeId(1), 5));
    assert!(!widget.track_book_click(NodeId(0), 0));

    let book = next_of_type(&mut events, "book_click").await;
    assert_eq!(book["book_title"], "Kindred");
    assert_eq!(book["book_author"], "by Octavia E. Butler");
    assert_eq!(
        book["amazon_link"],
        "https://www.amazon.com/s?k=9780807083697&tag=bookgpt-20"
    );
}

#[tokio::test]
async fn test_ignored_suggestion_click_is_not_tracked() {
    let (sink_tx, mut events) = mpsc::unbounded_channel();
    let background = BackgroundChannel::start(Arc::new(RecordingSink { tx: sink_tx })).unwrap();

    let transport = MockTransport::gated();
    let (tx, _rx) = mpsc::channel(256);
    let mut widget =
        Widget::new(transport.clone(), WidgetConfig::default(), tx).with_background(background);

    widget.submit("first").await;
    assert_eq!(
        widget.click_suggestion("Mystery Novels").await,
        SubmitOutcome::Ignored(IgnoreReason::Busy)
    );
    transport.release();
    widget.wait_for_response().await;

    // The only events are the ones produced by the first submission
    let first = events.recv().await.unwrap();
    assert_eq!(first["type"], "user_message");
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_stalled_analytics_never_gates_chat() {
    let background = BackgroundChannel::start(Arc::new(StalledSink)).unwrap();
    let (result_tx, mut results) = mpsc::unbounded_channel();
    background.on_result(move |result| {
        let _ = result_tx.send(result.clone());
    });

    let transport = MockTransport::new();
    let (tx, _rx) = mpsc::channel(256);
    let mut widget =
        Widget::new(transport.clone(), WidgetConfig::default(), tx).with_background(background);

    for text in ["fantasy please", "any horror?", "Mystery Novels"] {
        assert_eq!(widget.click_suggestion(text).await, SubmitOutcome::Sent);
        widget.wait_for_response().await;
        assert_eq!(widget.state(), UiState::Idle);
    }
    assert_eq!(transport.request_count(), 3);

    let mut keywords = Vec::new();
    while keywords.len() < 3 {
        let result = tokio::time::timeout(std::time::Duration::from_secs(2), results.recv())
            .await
            .expect("keyword results stalled behind analytics")
            .unwrap();
        if let BackgroundResult::MessageProcessed { keywords: found, .. } = result {
            keywords.push(found);
        }
    }
    assert_eq!(
        keywords,
        vec![
            vec!["fantasy".to_string()],
            vec!["horror".to_string()],
            vec!["mystery".to_string()],
        ]
    );
}
