//! Genre keyword extraction

/// Genre vocabulary, in reporting order
pub const GENRE_KEYWORDS: [&str; 14] = [
    "fantasy",
    "sci-fi",
    "science fiction",
    "mystery",
    "thriller",
    "horror",
    "romance",
    "historical",
    "fiction",
    "non-fiction",
    "biography",
    "autobiography",
    "young adult",
    "children",
];

/// Genres mentioned in `message`
///
/// Case-insensitive substring match. Overlapping terms are all reported, so
/// "science fiction" also yields "fiction".
#[must_use]
pub fn extract_keywords(message: &str) -> Vec<String> {
    let text = message.to_lowercase();
    GENRE_KEYWORDS
        .iter()
        .filter(|k| text.contains(*k))
        .map(|k| (*k).to_string())
        .collect()
}
