//! HTML-adjacent text helpers: tag stripping, sentence/paragraph boundaries,
//! and the `<a>` insertion used by auto-insert (§4.H step 12).

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static PARAGRAPH_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</p>").unwrap());
static SEMANTIC_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(h[1-6]|li|blockquote)[^>]*>").unwrap());

/// Strips all HTML tags, collapsing whitespace left behind.
pub fn strip_tags(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits plain text into sentence-like spans, keeping terminal punctuation
/// attached to the sentence it ends. Good enough for anchor candidate
/// generation; not a full sentence boundary detector.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'.' || c == b'!' || c == b'?' {
            let mut end = i + 1;
            while end < bytes.len() && matches!(bytes[end], b'.' | b'!' | b'?') {
                end += 1;
            }
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            while end < bytes.len() && bytes[end].is_ascii_whitespace() {
                end += 1;
            }
            start = end;
            i = end;
        } else {
            i += 1;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Splits raw HTML body content into paragraphs on `</p>` boundaries,
/// keeping each paragraph's own markup intact so auto-insert can operate
/// within a single paragraph at a time.
pub fn split_paragraphs(html: &str) -> Vec<String> {
    PARAGRAPH_SPLIT_RE
        .split(html)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| format!("{p}</p>"))
        .collect()
}

/// Intro boundary: `min(20% of length, 500 chars)`. Conclusion boundary:
/// 80% of length. Returns `(intro_end, conclusion_start)` as byte offsets
/// into `text` (caller is expected to pass plain, tag-stripped text so byte
/// offsets line up with char boundaries for ASCII-dominant content).
pub fn content_boundaries(text: &str) -> (usize, usize) {
    let len = text.len();
    let intro_end = (len / 5).min(500);
    let conclusion_start = (len * 4) / 5;
    (intro_end, conclusion_start.max(intro_end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPosition {
    Intro,
    Body,
    Conclusion,
}

impl ContentPosition {
    /// Position multiplier used by the anchor finder (§4.G): intro 1.5,
    /// conclusion 1.3, body 1.0.
    pub fn multiplier(self) -> f64 {
        match self {
            ContentPosition::Intro => 1.5,
            ContentPosition::Conclusion => 1.3,
            ContentPosition::Body => 1.0,
        }
    }
}

pub fn position_at(offset: usize, text: &str) -> ContentPosition {
    let (intro_end, conclusion_start) = content_boundaries(text);
    if offset < intro_end {
        ContentPosition::Intro
    } else if offset >= conclusion_start {
        ContentPosition::Conclusion
    } else {
        ContentPosition::Body
    }
}

/// Returns `offset`'s position within `text` as a percentage (0.0-100.0),
/// used by the SEO scorer's link-position percentile bucket.
pub fn percentile_of(offset: usize, text: &str) -> f64 {
    let len = text.len().max(1);
    (offset.min(len) as f64 / len as f64) * 100.0
}

/// If a semantic tag (`h1`-`h6`, `li`, `blockquote`) opens within `window`
/// characters before `offset`, returns it lowercased. Used by the SEO
/// scorer's link-position step to override the percentile-bucket score
/// with a fixed semantic-tag bonus.
pub fn enclosing_semantic_tag(html: &str, offset: usize, window: usize) -> Option<String> {
    let start = offset.saturating_sub(window);
    let slice = html.get(start..offset.min(html.len()))?;
    SEMANTIC_TAG_RE
        .find_iter(slice)
        .last()
        .map(|m| m.as_str().trim_start_matches('<').trim_end_matches('>').to_lowercase())
        .map(|t| t.split_whitespace().next().unwrap_or("").to_string())
}

/// Inserts `<a itemprop="relatedLink" href="...">anchor</a>` around the
/// first unlinked, case-insensitive occurrence of `anchor` in `html`.
/// Returns `None` if no unlinked occurrence exists. Enforces
/// one-link-per-paragraph by refusing to insert into a paragraph that
/// already contains an inserted `<a itemprop="relatedLink"`.
pub fn insert_link(html: &str, anchor: &str, href: &str) -> Option<String> {
    let lower_html = html.to_lowercase();
    let lower_anchor = anchor.to_lowercase();
    if lower_anchor.is_empty() {
        return None;
    }

    let mut search_from = 0usize;
    while let Some(rel_idx) = lower_html[search_from..].find(&lower_anchor) {
        let idx = search_from + rel_idx;
        if !is_inside_anchor_tag(&lower_html, idx) && !paragraph_already_linked(html, idx) {
            let actual = &html[idx..idx + anchor.len()];
            let replacement = format!(
                r#"<a itemprop="relatedLink" href="{href}">{actual}</a>"#
            );
            let mut out = String::with_capacity(html.len() + replacement.len());
            out.push_str(&html[..idx]);
            out.push_str(&replacement);
            out.push_str(&html[idx + anchor.len()..]);
            return Some(out);
        }
        search_from = idx + anchor.len();
    }
    None
}

fn is_inside_anchor_tag(lower_html: &str, idx: usize) -> bool {
    let before = &lower_html[..idx];
    match (before.rfind("<a "), before.rfind("</a>")) {
        (Some(open), close) => close.map_or(true, |c| c < open),
        (None, _) => false,
    }
}

fn paragraph_already_linked(html: &str, idx: usize) -> bool {
    let before_close = html[..idx].rfind("</p>").map(|p| p + 4).unwrap_or(0);
    let after_close = html[idx..]
        .find("</p>")
        .map(|p| idx + p)
        .unwrap_or(html.len());
    html[before_close..after_close].contains(r#"itemprop="relatedLink""#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        assert_eq!(strip_tags("<p>Hello   <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn splits_sentences_on_terminal_punctuation() {
        let sentences = split_sentences("First one. Second one! Third?");
        assert_eq!(sentences, vec!["First one.", "Second one!", "Third?"]);
    }

    #[test]
    fn insert_link_wraps_first_unlinked_occurrence() {
        let html = "<p>Learn about cap rate basics here.</p>";
        let out = insert_link(html, "cap rate", "/cap-rate-guide").unwrap();
        assert!(out.contains(r#"<a itemprop="relatedLink" href="/cap-rate-guide">cap rate</a>"#));
    }

    #[test]
    fn insert_link_refuses_second_link_in_same_paragraph() {
        let html = r#"<p>Cap rate and cap rate again.</p>"#;
        let once = insert_link(html, "cap rate", "/a").unwrap();
        assert!(insert_link(&once, "cap rate", "/b").is_none());
    }

    #[test]
    fn insert_link_skips_text_already_inside_anchor() {
        let html = r#"<p><a href="/existing">cap rate</a> is discussed.</p>"#;
        assert!(insert_link(html, "cap rate", "/new").is_none());
    }
}
