//! Anchor finder (§4.G): synthesizes candidate anchor text from a target
//! article's title and a source article's body when the LLM's
//! `select_anchors` output doesn't verify as verbatim. Generates sentence,
//! title-n-gram, and contextual-window candidates, scores each, and picks
//! the best one not already in use.
//!
//! Tie-breaking is deterministic (§9 design note): longer phrase first,
//! then earlier position, then lexicographic order.

use std::collections::HashSet;

use crate::html::{self, ContentPosition};
use crate::text::{self, GENERIC_PHRASES};

#[derive(Debug, Clone)]
pub struct AnchorCandidate {
    pub text: String,
    pub offset: usize,
    pub score: f64,
}

/// Finds the best anchor for `target_title` within `source_plain_body`,
/// skipping any phrase whose lowercased form is already in `used_anchors`.
/// `source_html_body` is passed through only so semantic-tag context can be
/// inspected by callers after the fact; the search itself runs over plain
/// text.
pub fn find_anchor(
    target_title: &str,
    source_plain_body: &str,
    used_anchors: &HashSet<String>,
) -> Option<AnchorCandidate> {
    let distinctive = text::distinctive_words(target_title);
    if distinctive.is_empty() {
        return None;
    }

    let mut candidates = Vec::new();
    candidates.extend(sentence_candidates(source_plain_body, &distinctive));
    candidates.extend(title_ngram_candidates(target_title, source_plain_body, &distinctive));
    candidates.extend(contextual_window_candidates(source_plain_body, &distinctive));

    candidates.retain(|c| !used_anchors.contains(&c.text.to_lowercase()));

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.text.len().cmp(&a.text.len()))
            .then_with(|| a.offset.cmp(&b.offset))
            .then_with(|| a.text.cmp(&b.text))
    });

    candidates.into_iter().next()
}

fn matched_count(candidate_lower: &str, distinctive: &[String]) -> usize {
    distinctive.iter().filter(|w| candidate_lower.contains(w.as_str())).count()
}

/// Whole sentences 20-150 chars containing at least 2 distinctive words,
/// scored `(matched / total_distinctive) * position_multiplier * 100`.
fn sentence_candidates(body: &str, distinctive: &[String]) -> Vec<AnchorCandidate> {
    let mut candidates = Vec::new();
    let mut cursor = 0usize;
    for sentence in html::split_sentences(body) {
        let offset = body[cursor..].find(sentence).map(|i| cursor + i).unwrap_or(cursor);
        cursor = offset + sentence.len();

        if sentence.len() < 20 || sentence.len() > 150 {
            continue;
        }
        let lower = sentence.to_lowercase();
        let matched = matched_count(&lower, distinctive);
        if matched < 2 {
            continue;
        }
        let position = html::position_at(offset, body);
        let score = (matched as f64 / distinctive.len() as f64) * position.multiplier() * 100.0;
        candidates.push(AnchorCandidate { text: sentence.to_string(), offset, score });
    }
    candidates
}

/// 3-6 word n-grams of the target title, matched literally in the body,
/// at least 12 chars, not a blacklisted generic phrase, containing at
/// least one distinctive word. Scored
/// `80 * position_multiplier * (len_words / 3)`.
fn title_ngram_candidates(
    title: &str,
    body: &str,
    distinctive: &[String],
) -> Vec<AnchorCandidate> {
    let words: Vec<&str> = title.split_whitespace().collect();
    let mut candidates = Vec::new();
    let lower_body = body.to_lowercase();

    for window in 3..=6.min(words.len()) {
        if window > words.len() {
            break;
        }
        for start in 0..=(words.len() - window) {
            let phrase = words[start..start + window].join(" ");
            if phrase.len() < 12 {
                continue;
            }
            let lower_phrase = phrase.to_lowercase();
            if GENERIC_PHRASES.contains(&lower_phrase.as_str()) {
                continue;
            }
            let has_distinctive = distinctive.iter().any(|w| lower_phrase.contains(w.as_str()));
            if !has_distinctive {
                continue;
            }
            let Some(offset) = lower_body.find(&lower_phrase) else { continue };
            let position = html::position_at(offset, body);
            let score = 80.0 * position.multiplier() * (window as f64 / 3.0);
            let actual = &body[offset..offset + phrase.len()];
            candidates.push(AnchorCandidate { text: actual.to_string(), offset, score });
        }
    }
    candidates
}

/// Short windows (15-80 chars) built from a 0-30 char span around each
/// distinctive-word occurrence in the body. Scored
/// `60 * position_multiplier * matched_count`.
fn contextual_window_candidates(body: &str, distinctive: &[String]) -> Vec<AnchorCandidate> {
    let lower_body = body.to_lowercase();
    let mut candidates = Vec::new();

    for word in distinctive {
        let mut search_from = 0usize;
        while let Some(rel) = lower_body[search_from..].find(word.as_str()) {
            let idx = search_from + rel;
            search_from = idx + word.len();

            for pad in [0usize, 10, 20, 30] {
                let start = idx.saturating_sub(pad);
                let end = (idx + word.len() + pad).min(body.len());
                let Some(window) = body.get(start..end) else { continue };
                let trimmed = window.trim();
                if trimmed.len() < 15 || trimmed.len() > 80 {
                    continue;
                }
                let lower_trimmed = trimmed.to_lowercase();
                if GENERIC_PHRASES.contains(&lower_trimmed.as_str()) {
                    continue;
                }
                let matched = matched_count(&lower_trimmed, distinctive);
                if matched == 0 {
                    continue;
                }
                let offset = body.find(trimmed).unwrap_or(start);
                let position = html::position_at(offset, body);
                let score = 60.0 * position.multiplier() * matched as f64;
                candidates.push(AnchorCandidate { text: trimmed.to_string(), offset, score });
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sentence_candidate_with_distinctive_words() {
        let body = "Here is a paragraph. Calculating cap rate for rental properties is essential \
                     for investors. Another sentence follows.";
        let used = HashSet::new();
        let found = find_anchor("How to Calculate Cap Rate for Rentals", body, &used).unwrap();
        assert!(found.text.to_lowercase().contains("cap rate"));
    }

    #[test]
    fn skips_anchors_already_used() {
        let body = "Calculating cap rate for rental properties matters a lot for every investor.";
        let mut used = HashSet::new();
        let first = find_anchor("How to Calculate Cap Rate", body, &used).unwrap();
        used.insert(first.text.to_lowercase());
        let second = find_anchor("How to Calculate Cap Rate", body, &used);
        if let Some(second) = second {
            assert_ne!(second.text.to_lowercase(), first.text.to_lowercase());
        }
    }

    #[test]
    fn returns_none_when_title_has_no_distinctive_words() {
        let body = "Some body text about unrelated things entirely.";
        let used = HashSet::new();
        assert!(find_anchor("The And Of", body, &used).is_none());
    }
}
