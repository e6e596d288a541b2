//! Static word lists used by [`super::distinctive_words`] and the anchor
//! finder's title n-gram blacklist.

pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "of", "to", "in", "on", "for",
    "with", "at", "by", "from", "up", "about", "into", "over", "after",
    "is", "are", "was", "were", "be", "been", "being", "this", "that",
    "these", "those", "it", "its", "as", "how", "why", "what", "when",
    "where", "who", "which", "can", "will", "would", "should", "could",
    "do", "does", "did", "you", "your", "we", "our", "i", "my",
];

/// Generic multi-word phrases that should never be proposed as anchor text
/// even if they overlap with the title's distinctive words (e.g. boilerplate
/// n-grams like "in this article" or "read more").
pub const GENERIC_PHRASES: &[&str] = &[
    "click here",
    "read more",
    "learn more",
    "find out more",
    "in this article",
    "in this post",
    "in this guide",
    "check out",
    "this page",
    "this post",
];
