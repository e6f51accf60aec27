//! Widget Client
//!
//! Thin wrapper around the [`Widget`] for terminal integration. The widget is
//! embedded directly (no network between host and core); only the chat
//! backend sits behind HTTP.
//!
//! # Architecture
//!
//! The terminal host is a thin client with no business logic. Its job is:
//! 1. Convert key presses into widget operations
//! 2. Receive [`WidgetMessage`]s
//! 3. Render display state based on those messages

use tokio::sync::mpsc;

use bookchat_core::{
    ChatTransport, HttpTransport, NodeId, SubmitOutcome, UiState, Widget, WidgetConfig,
    WidgetMessage,
};

/// Capacity of the widget-to-host channel
const CHANNEL_CAPACITY: usize = 100;

/// Client for the embedded widget
pub struct WidgetClient<T: ChatTransport + 'static = HttpTransport> {
    /// The embedded widget
    widget: Widget<T>,
    /// Receiver for messages from the widget
    rx: mpsc::Receiver<WidgetMessage>,
}

impl WidgetClient<HttpTransport> {
    /// Create a client talking to the configured endpoint
    #[must_use]
    pub fn from_config(config: WidgetConfig) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let widget = Widget::from_config(config, tx);
        Self { widget, rx }
    }
}

impl<T: ChatTransport + 'static> WidgetClient<T> {
    /// Wrap an existing widget and its message receiver
    pub fn new(widget: Widget<T>, rx: mpsc::Receiver<WidgetMessage>) -> Self {
        Self { widget, rx }
    }

    /// Mount the widget (requests the greeting)
    pub async fn mount(&mut self) -> bool {
        self.widget.mount().await
    }

    /// Send typed text
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        self.widget.submit(text).await
    }

    /// Send a suggestion chip
    pub async fn click_suggestion(&mut self, suggestion: &str) -> SubmitOutcome {
        self.widget.click_suggestion(suggestion).await
    }

    /// Report a followed book link
    pub fn track_book_click(&self, node: NodeId, card: usize) -> bool {
        self.widget.track_book_click(node, card)
    }

    /// Apply a finished response, if any (must be called regularly)
    pub async fn poll_response(&mut self) -> bool {
        self.widget.poll_response().await
    }

    /// Wait for the outstanding response
    pub async fn wait_for_response(&mut self) -> bool {
        self.widget.wait_for_response().await
    }

    /// Receive all pending messages from the widget (non-blocking)
    pub fn recv_all(&mut self) -> Vec<WidgetMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Get the current widget state
    pub fn state(&self) -> UiState {
        self.widget.state()
    }

    /// Get the embedded widget
    pub fn widget(&self) -> &Widget<T> {
        &self.widget
    }
}
