//! Message Rendering
//!
//! Turns a backend response into typed nodes for the conversation. Hosts map
//! nodes to their own primitives in a single render step and never see the
//! wire types.
//!
//! # Content kinds
//!
//! User text is always [`Content::Plain`] and must never be interpreted as
//! markup. Bot text is [`Content::Rich`]: it comes from a trusted backend and
//! may carry formatting. Card descriptions are either: rich as sent, or a
//! plain excerpt once cut to the budget.

mod affiliate;
mod description;

pub use affiliate::{affiliate_link, AffiliateLink};
pub use description::{html_to_text, truncate_description};

use crate::config::{DEFAULT_AFFILIATE_TAG, DEFAULT_DESCRIPTION_BUDGET};
use crate::messages::{BookRecommendation, ChatResponse, Sender};

/// Reply when a response carries neither text nor books
pub const FALLBACK_MESSAGE: &str = "I'm looking into that. Anything else?";

/// Reply when a chat request fails
pub const ERROR_MESSAGE: &str = "Sorry, an error occurred. Please try again.";

/// Greeting shown when the greeting request fails
pub const FALLBACK_GREETING: &str = "Hi! How can I help you find a book today?";

/// Suggestions attached to the fallback and error replies
pub const DEFAULT_SUGGESTIONS: [&str; 3] =
    ["Suggest Fantasy Books", "Recommend Sci-Fi", "Mystery Novels"];

/// Suggestions attached to the fallback greeting
pub const GREETING_SUGGESTIONS: [&str; 3] = [
    "Suggest Fantasy Books",
    "Recommend Sci-Fi",
    "Books like The Hobbit",
];

const NO_TITLE: &str = "No Title";
const UNKNOWN_AUTHOR: &str = "by Unknown Author";
const NO_DESCRIPTION: &str = "No description available.";

/// Heading shown above a card's reasoning
pub const REASONING_HEADING: &str = "Why This Book?";

/// Text shown in place of a missing cover
pub const NO_COVER: &str = "No Cover";

/// Text of a message node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    /// Untrusted text, shown verbatim
    Plain(String),
    /// Trusted markup from the backend
    Rich(String),
}

impl Content {
    /// Raw string, without interpretation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(s) | Self::Rich(s) => s,
        }
    }
}

/// Cover area of a book card
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cover {
    /// Remote cover image
    Image {
        /// Image URL
        src: String,
        /// Alternative text
        alt: String,
    },
    /// No cover available
    Placeholder,
}

/// One rendered book recommendation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookCard {
    /// Title or "No Title"
    pub title: String,
    /// "by <authors>" or "by Unknown Author"
    pub byline: String,
    /// Cover image or placeholder
    pub cover: Cover,
    /// Why the book was picked
    pub reasoning: Option<String>,
    /// Description as sent, or a plain excerpt when over the budget
    pub description: Content,
    /// Marketplace link
    pub link: Option<AffiliateLink>,
}

/// A node in the conversation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedNode {
    /// A chat message with optional suggestion chips
    Text {
        /// Who wrote it
        sender: Sender,
        /// What was written
        content: Content,
        /// Suggestion chips, in order
        suggestions: Vec<String>,
    },
    /// A group of book cards
    BookGroup {
        /// Cards in backend order
        cards: Vec<BookCard>,
    },
    /// Inline notice from the widget itself
    Notice {
        /// Notice text
        text: String,
    },
}

impl RenderedNode {
    /// Bot text node
    pub fn bot_text<S: Into<String>>(
        content: impl Into<String>,
        suggestions: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Text {
            sender: Sender::Bot,
            content: Content::Rich(content.into()),
            suggestions: suggestions.into_iter().map(Into::into).collect(),
        }
    }

    /// Suggestion chips of a text node (empty for other nodes)
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Text { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

/// Renderer settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Affiliate tag for derived links
    pub affiliate_tag: String,
    /// Description budget in characters
    pub description_budget: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            affiliate_tag: DEFAULT_AFFILIATE_TAG.to_string(),
            description_budget: DEFAULT_DESCRIPTION_BUDGET,
        }
    }
}

/// Render the user's own message
pub fn render_user_message(text: impl Into<String>) -> RenderedNode {
    RenderedNode::Text {
        sender: Sender::User,
        content: Content::Plain(text.into()),
        suggestions: Vec::new(),
    }
}

/// Render one bot turn
///
/// `user_message` is the text that triggered the turn, empty for the
/// greeting. The fallback reply only fires for a non-empty user message.
#[must_use]
pub fn render_bot_turn(
    response: &ChatResponse,
    user_message: &str,
    options: &RenderOptions,
) -> Vec<RenderedNode> {
    let mut nodes = Vec::new();

    if let Some(message) = response.message() {
        nodes.push(RenderedNode::bot_text(
            message,
            response.suggestion_list().iter().cloned(),
        ));
    }

    let books = response.book_list();
    if !books.is_empty() {
        nodes.push(RenderedNode::BookGroup {
            cards: books.iter().map(|b| render_book_card(b, options)).collect(),
        });
    }

    if nodes.is_empty() && !user_message.is_empty() {
        nodes.push(RenderedNode::bot_text(FALLBACK_MESSAGE, DEFAULT_SUGGESTIONS));
    }

    nodes
}

/// Render a single book card
#[must_use]
pub fn render_book_card(book: &BookRecommendation, options: &RenderOptions) -> BookCard {
    let title = book.title().unwrap_or(NO_TITLE).to_string();

    let authors: Vec<&str> = book
        .authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    let byline = if authors.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        format!("by {}", authors.join(", "))
    };

    let cover = match book.thumbnail_url.as_deref().map(str::trim) {
        Some(src) if !src.is_empty() => Cover::Image {
            src: src.to_string(),
            alt: format!("Cover of {title}"),
        },
        _ => Cover::Placeholder,
    };

    let reasoning = book
        .reasoning
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let description = match book.description.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(d) => truncate_description(d, options.description_budget),
        None => Content::Plain(NO_DESCRIPTION.to_string()),
    };

    BookCard {
        link: affiliate_link(book, &options.affiliate_tag),
        title,
        byline,
        cover,
        reasoning,
        description,
    }
}
