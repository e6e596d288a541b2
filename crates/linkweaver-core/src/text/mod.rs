//! Text utilities shared by the anchor finder and the SEO scorer:
//! stopword/blacklist filtering, stemming, and synonym expansion.

mod stopwords;

pub use stopwords::{GENERIC_PHRASES, STOPWORDS};

/// Lowercases and splits on non-alphanumeric boundaries.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Words from a title that carry topical weight: lowercased, stopwords and
/// short tokens removed. Used by the anchor finder to build the set of
/// "distinctive words" a candidate anchor must overlap with (§4.G).
pub fn distinctive_words(title: &str) -> Vec<String> {
    tokenize(title)
        .into_iter()
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Folds a word to a crude stem by stripping common suffixes. This is a
/// hand-rolled Porter-lite, not a full stemmer; it only needs to collapse
/// the handful of morphological variants that show up in SEO keyword
/// matching (plurals, -ing, -ed, -ly).
pub fn stem(word: &str) -> String {
    let w = word.to_lowercase();
    for suffix in ["ational", "ization", "iveness", "fulness", "ing", "edly", "ed", "ly", "es", "s"] {
        if w.len() > suffix.len() + 2 && w.ends_with(suffix) {
            return w[..w.len() - suffix.len()].to_string();
        }
    }
    w
}

/// Returns true if `a` and `b` share a stem, i.e. are the same word under
/// the light stemming above.
pub fn same_stem(a: &str, b: &str) -> bool {
    stem(a) == stem(b)
}

/// Domain synonym table for SEO keyword alignment (§4.E step 4). Each
/// entry's terms are considered interchangeable when scoring keyword
/// coverage; this is intentionally small and specific to the site's niche
/// rather than a general-purpose thesaurus.
pub fn synonyms(word: &str) -> &'static [&'static str] {
    let w = word.to_lowercase();
    for group in SYNONYM_GROUPS {
        if group.contains(&w.as_str()) {
            return group;
        }
    }
    &[]
}

pub fn is_synonym(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    synonyms(&a).contains(&b.to_lowercase().as_str())
}

const SYNONYM_GROUPS: &[&[&str]] = &[
    &["cap rate", "capitalization rate", "cap-rate"],
    &["roi", "return on investment"],
    &["cash flow", "cashflow"],
    &["noi", "net operating income"],
    &["appreciation", "value growth", "equity growth"],
    &["refinance", "refi"],
    &["down payment", "downpayment", "deposit"],
    &["mortgage", "home loan"],
    &["landlord", "property owner"],
    &["tenant", "renter", "lessee"],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinctive_words_drops_stopwords() {
        let words = distinctive_words("How to Calculate Cap Rate for a Rental");
        assert!(words.contains(&"calculate".to_string()));
        assert!(words.contains(&"rental".to_string()));
        assert!(!words.contains(&"how".to_string()));
        assert!(!words.contains(&"for".to_string()));
    }

    #[test]
    fn stem_collapses_plural() {
        assert_eq!(stem("tenants"), stem("tenant"));
    }

    #[test]
    fn synonym_lookup_is_symmetric() {
        assert!(is_synonym("cap rate", "capitalization rate"));
        assert!(is_synonym("capitalization rate", "cap rate"));
    }
}
