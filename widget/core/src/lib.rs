//! Bookchat Core - Headless Book Recommendation Chat Widget
//!
//! This crate provides the conversation logic of the book chat widget,
//! completely independent of any UI framework. A host surface (the terminal
//! host in `bookchat-tui`, a test harness, anything else) mounts a
//! [`Widget`], forwards user input to it and renders what it is told.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Host Surface                           │
//! │        renders RenderedNode, forwards input and clicks        │
//! └──────────────────────────────┬───────────────────────────────┘
//!                 submit / click_suggestion (down)
//!                      WidgetMessage (up)
//! ┌──────────────────────────────┼───────────────────────────────┐
//! │                          WIDGET CORE                          │
//! │  ┌─────────┐  ┌───────────┐  ┌──────────┐  ┌───────────────┐  │
//! │  │ Session │  │ Transport │  │ Renderer │  │ Conversation  │  │
//! │  │         │  │  (HTTP)   │  │          │  │    Store      │  │
//! │  └─────────┘  └───────────┘  └──────────┘  └───────────────┘  │
//! │                 ┌──────────────────────────┐                  │
//! │                 │ Background Channel       │                  │
//! │                 │ (keywords, analytics)    │                  │
//! │                 └──────────────────────────┘                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Widget`]: The state machine that owns one conversation
//! - [`WidgetMessage`]: Messages sent from the widget to its host
//! - [`RenderedNode`]: What the host renders (text, book cards, notices)
//! - [`ChatTransport`]: How the widget reaches the chat backend
//! - [`BackgroundChannel`]: Non-blocking side work
//!
//! # Quick Start
//!
//! ```ignore
//! use bookchat_core::{load_config, Widget};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let config = load_config().unwrap_or_default();
//!     let mut widget = Widget::from_config(config, tx);
//!
//!     widget.mount().await;
//!
//!     loop {
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message
//!         }
//!         widget.poll_response().await;
//!         // Forward input with widget.submit(..) / widget.click_suggestion(..)
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`background`]: Worker for keyword extraction and analytics
//! - [`config`]: Layered configuration and endpoint detection
//! - [`error`]: Error types
//! - [`messages`]: Wire types and surface messages
//! - [`render`]: Response to node rendering, affiliate links
//! - [`session`]: Session identity
//! - [`store`]: Append-only conversation log
//! - [`transport`]: Chat backend access
//! - [`widget`]: The widget state machine
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod config;
pub mod error;
pub mod messages;
pub mod render;
pub mod session;
pub mod store;
pub mod transport;
pub mod widget;

// Re-exports for convenience
pub use background::{
    AnalyticsEvent, AnalyticsEventKind, AnalyticsSink, BackgroundChannel, BackgroundResult,
    BackgroundTask, HttpAnalyticsSink, NullSink,
};
pub use error::{TransportError, WidgetError};
pub use messages::{
    BookRecommendation, ChatRequest, ChatResponse, ControlState, NodeId, Sender, UiState,
    WidgetMessage,
};
pub use render::{
    affiliate_link, html_to_text, render_bot_turn, render_user_message, AffiliateLink, BookCard,
    Content, Cover, RenderOptions, RenderedNode,
};
pub use session::{Session, SessionId};
pub use store::{ConversationEntry, ConversationStore};
pub use transport::{ChatTransport, HttpTransport};
pub use widget::{IgnoreReason, SubmitOutcome, Widget};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigSource,
    EmbedOptions, HostEnvironment, WidgetConfig,
};
