//! Description text handling
//!
//! Backend descriptions may carry HTML. Long ones are cut down to a plain-text
//! excerpt; short ones are shown as sent. The result says which is which so a
//! host decodes markup exactly once.

use super::Content;

/// Reduce HTML to its text content
///
/// Tags are dropped and the common named and numeric entities are decoded.
/// Malformed markup is passed through as text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find(['<', '&']) {
        text.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with('<') {
            match rest.find('>') {
                Some(end) if looks_like_tag(&rest[1..end]) => rest = &rest[end + 1..],
                _ => {
                    text.push('<');
                    rest = &rest[1..];
                }
            }
        } else {
            match rest.find(';').filter(|&end| end <= 10) {
                Some(end) => match decode_entity(&rest[1..end]) {
                    Some(c) => {
                        text.push(c);
                        rest = &rest[end + 1..];
                    }
                    None => {
                        text.push('&');
                        rest = &rest[1..];
                    }
                },
                None => {
                    text.push('&');
                    rest = &rest[1..];
                }
            }
        }
    }

    text.push_str(rest);
    text
}

fn looks_like_tag(inner: &str) -> bool {
    inner
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Fit a description to `budget` characters
///
/// When the text content exceeds the budget the result is
/// [`Content::Plain`] holding the first `budget` characters of that text
/// followed by `...`. Entities are already decoded there, so the excerpt must
/// be shown verbatim. Otherwise the description is returned unchanged as
/// [`Content::Rich`], markup included.
#[must_use]
pub fn truncate_description(description: &str, budget: usize) -> Content {
    let plain = html_to_text(description);
    if plain.chars().count() > budget {
        let mut excerpt: String = plain.chars().take(budget).collect();
        excerpt.push_str("...");
        Content::Plain(excerpt)
    } else {
        Content::Rich(description.to_string())
    }
}
