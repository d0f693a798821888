//! Search-term derivation (§4.2): up to 5 deterministic terms tokenized
//! from a source's name and URL path, used both to drive the directory
//! heuristic's camp-indicator scan and to score discovered APIs.

use url::Url;

const STOPWORDS: &[&str] = &[
    "the", "and", "of", "for", "summer", "camp", "camps", "kids", "kid", "youth", "a", "an", "in", "at", "on", "to",
    "with", "is", "are", "our",
];

const MIN_TERM_LEN: usize = 3;
const MAX_TERMS: usize = 5;

/// Tokenize `text` into lowercase alphanumeric words, stripping
/// non-alphanumerics and short/stop words.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= MIN_TERM_LEN && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Derive the search-term set for a source: tokenize `source_name` and the
/// URL's path, dedupe preserving first-seen order, cap at 5 terms. The
/// result is a pure function of the inputs (Testable Properties §8.5).
pub fn derive_search_terms(source_name: &str, source_url: &str) -> Vec<String> {
    let mut terms = tokenize(source_name);

    if let Ok(url) = Url::parse(source_url) {
        terms.extend(tokenize(url.path()));
    }

    let mut seen = std::collections::HashSet::new();
    let mut deduped = Vec::new();
    for term in terms {
        if seen.insert(term.clone()) {
            deduped.push(term);
        }
        if deduped.len() == MAX_TERMS {
            break;
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_stopwords_and_short_tokens() {
        let terms = derive_search_terms("The Summer Camp of Art", "https://example.com/camps");
        assert!(!terms.iter().any(|t| t == "the" || t == "of" || t == "camp"));
        assert!(terms.contains(&"art".to_string()));
    }

    #[test]
    fn caps_at_five_terms() {
        let terms = derive_search_terms(
            "Alpha Bravo Charlie Delta Echo Foxtrot Golf",
            "https://example.com/",
        );
        assert_eq!(terms.len(), 5);
    }

    #[test]
    fn deterministic_given_same_inputs() {
        let a = derive_search_terms("Kid Yoga PDX", "https://kidyoga.example/camps");
        let b = derive_search_terms("Kid Yoga PDX", "https://kidyoga.example/camps");
        assert_eq!(a, b);
    }

    #[test]
    fn includes_url_path_tokens() {
        let terms = derive_search_terms("Riverside", "https://example.com/pottery-studio");
        assert!(terms.contains(&"pottery".to_string()));
        assert!(terms.contains(&"studio".to_string()));
    }
}
