//! Affiliate Links
//!
//! Every card with a title gets a marketplace link. A direct link chosen by
//! the backend wins, then an ISBN search, then a title and author search.

use serde::{Deserialize, Serialize};

use crate::messages::BookRecommendation;

/// Marketplace search URL prefix
const SEARCH_BASE: &str = "https://www.amazon.com/s?k=";

/// Outbound marketplace link
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AffiliateLink(pub String);

impl AffiliateLink {
    /// Get the URL
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AffiliateLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Derive the link for a book
///
/// Returns `None` only when the book has no usable link, ISBN or title.
#[must_use]
pub fn affiliate_link(book: &BookRecommendation, tag: &str) -> Option<AffiliateLink> {
    if let Some(link) = book.amazon_link().filter(|l| l.contains("amazon.com")) {
        return Some(AffiliateLink(link.to_string()));
    }

    let tag = encode(tag);

    if let Some(isbn) = book.isbn13() {
        return Some(AffiliateLink(format!(
            "{SEARCH_BASE}{}&tag={tag}",
            encode(isbn)
        )));
    }

    let title = book.title()?;
    let mut query = encode(title);
    if let Some(author) = book.first_author() {
        query.push('+');
        query.push_str(&encode(author.trim()));
    }
    Some(AffiliateLink(format!("{SEARCH_BASE}{query}&tag={tag}")))
}
