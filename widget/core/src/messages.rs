//! Wire and Surface Messages
//!
//! Two families of messages live here:
//!
//! - **Wire types** exchanged with the remote chat backend
//!   ([`ChatRequest`], [`ChatResponse`], [`BookRecommendation`]).
//! - **Surface messages** sent from the [`Widget`](crate::Widget) to whatever
//!   host renders it ([`WidgetMessage`]). Hosts hold no business logic; they
//!   render what they are told and forward user input back.

use serde::{Deserialize, Deserializer, Serialize};

use crate::render::RenderedNode;

// ============================================
// Wire Types
// ============================================

/// Request body for `POST <endpoint>`
///
/// An empty `message` asks the backend for the initial greeting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatRequest<'a> {
    /// Session identifier
    pub user_id: &'a str,
    /// Message text (empty for the greeting)
    pub message: &'a str,
}

/// Response body of the chat endpoint
///
/// Every field is optional. A response with none of them is valid; the
/// renderer falls back to a generic message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Conversational text (trusted markup)
    #[serde(default)]
    pub bot_message: Option<String>,
    /// Suggestion chips attached to `bot_message`
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    /// Book recommendation cards
    #[serde(default)]
    pub books: Option<Vec<BookRecommendation>>,
}

impl ChatResponse {
    /// Response carrying only a bot message
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            bot_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Attach suggestion chips
    #[must_use]
    pub fn with_suggestions<S: Into<String>>(mut self, suggestions: impl IntoIterator<Item = S>) -> Self {
        self.suggestions = Some(suggestions.into_iter().map(Into::into).collect());
        self
    }

    /// Attach book recommendations
    #[must_use]
    pub fn with_books(mut self, books: Vec<BookRecommendation>) -> Self {
        self.books = Some(books);
        self
    }

    /// Non-blank bot message, if any
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.bot_message.as_deref().filter(|m| !m.trim().is_empty())
    }

    /// Suggestions, empty when absent
    #[must_use]
    pub fn suggestion_list(&self) -> &[String] {
        self.suggestions.as_deref().unwrap_or_default()
    }

    /// Books, empty when absent
    #[must_use]
    pub fn book_list(&self) -> &[BookRecommendation] {
        self.books.as_deref().unwrap_or_default()
    }
}

/// A book recommended by the backend
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecommendation {
    /// Book title
    #[serde(default)]
    pub title: Option<String>,
    /// Authors in display order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub authors: Vec<String>,
    /// Cover image URL
    #[serde(default, rename = "thumbnail")]
    pub thumbnail_url: Option<String>,
    /// Description (may contain HTML)
    #[serde(default)]
    pub description: Option<String>,
    /// Why the backend picked this book
    #[serde(default)]
    pub reasoning: Option<String>,
    /// ISBN-13
    #[serde(default)]
    pub isbn13: Option<String>,
    /// Marketplace link chosen by the backend
    #[serde(default)]
    pub amazon_link: Option<String>,
}

impl BookRecommendation {
    /// Create a book with just a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Non-blank title
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// First non-blank author
    #[must_use]
    pub fn first_author(&self) -> Option<&str> {
        self.authors.iter().map(String::as_str).find(|a| !a.trim().is_empty())
    }

    /// Non-blank ISBN-13
    #[must_use]
    pub fn isbn13(&self) -> Option<&str> {
        non_blank(self.isbn13.as_deref())
    }

    /// Non-blank marketplace link
    #[must_use]
    pub fn amazon_link(&self) -> Option<&str> {
        non_blank(self.amazon_link.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `null` and missing both deserialize to an empty list
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================
// Surface Messages
// ============================================

/// Position of a node in the conversation store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Who produced a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// The person typing into the widget
    User,
    /// The chat backend
    Bot,
}

/// UI states of the widget
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiState {
    /// Accepting input
    Idle,
    /// One chat request in flight, input disabled
    AwaitingResponse,
    /// Kept for completeness of the taxonomy; failures return to `Idle`
    Error,
}

impl UiState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::AwaitingResponse => "Looking for books...",
            Self::Error => "Something went wrong",
        }
    }
}

/// Enablement of the input controls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// Text input accepts typing
    pub input_enabled: bool,
    /// Send button accepts clicks
    pub send_enabled: bool,
    /// Loading indicator is shown
    pub loading_visible: bool,
    /// Text input holds keyboard focus
    pub input_focused: bool,
}

impl ControlState {
    /// Controls while idle
    #[must_use]
    pub fn idle() -> Self {
        Self {
            input_enabled: true,
            send_enabled: true,
            loading_visible: false,
            input_focused: true,
        }
    }

    /// Controls while a request is in flight
    #[must_use]
    pub fn awaiting() -> Self {
        Self {
            input_enabled: false,
            send_enabled: false,
            loading_visible: true,
            input_focused: false,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Messages from the widget core to its host surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetMessage {
    /// A node was appended to the conversation
    NodeAppended {
        /// Store position of the node
        id: NodeId,
        /// The node to render
        node: RenderedNode,
    },

    /// UI state changed
    StateChanged {
        /// The new state
        state: UiState,
        /// Control enablement for that state
        controls: ControlState,
    },

    /// Bring a node into view
    ScrollTo {
        /// Node to scroll to
        id: NodeId,
    },

    /// Give keyboard focus to the text input
    FocusInput,

    /// Header title of the widget
    Title {
        /// Display string
        text: String,
    },
}
