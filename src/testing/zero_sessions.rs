//! Zero-sessions validity check (§4.5): a 0-session, no-error result isn't
//! automatically a failure — some sources legitimately haven't published a
//! catalog yet. Deliberately permissive per Design Notes §9 open question
//! 3; false positives silently mark failing scrapers as successful.

use regex::Regex;
use url::Url;

const SEASONAL_PHRASES: &[&str] = &[
    "not yet published",
    "coming soon",
    "check back later",
    "registration opens",
    "schedule not available",
];

const SEASONAL_MONTH_RE: &str = r"(?i)late (may|june|july|august|september)";

const SEASONAL_DOMAINS: &[&str] = &["pcc.edu"];

/// Returns an explanatory note when the 0-session result is legitimate
/// (seasonal/not-yet-published catalog), or `None` when it should be
/// treated as a real failure.
pub fn zero_sessions_note(code_or_context: &str, url: &str) -> Option<String> {
    let lower = code_or_context.to_lowercase();

    if let Some(phrase) = SEASONAL_PHRASES.iter().find(|p| lower.contains(*p)) {
        return Some(format!("Source indicates the catalog isn't published yet (\"{phrase}\")."));
    }

    if Regex::new(SEASONAL_MONTH_RE).unwrap().is_match(code_or_context) {
        return Some("Source indicates registration/publication happens later in the season.".to_string());
    }

    if is_seasonal_domain(url) {
        return Some("Source is a seasonal institution (school/university) that may not have an active catalog year-round.".to_string());
    }

    None
}

fn is_seasonal_domain(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();

    if SEASONAL_DOMAINS.iter().any(|d| host.ends_with(d)) {
        return true;
    }
    if host.ends_with(".edu") {
        return true;
    }
    Regex::new(r"(?i)college|university").unwrap().is_match(&host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_seasonal_phrase() {
        let note = zero_sessions_note("Registration opens in May for the 2027 season", "https://example.com");
        assert!(note.is_some());
    }

    #[test]
    fn recognizes_late_month_phrasing() {
        let note = zero_sessions_note("Schedule posted late June each year", "https://example.com");
        assert!(note.is_some());
    }

    #[test]
    fn recognizes_edu_domain() {
        let note = zero_sessions_note("", "https://www.pcc.edu/summer-camps");
        assert!(note.is_some());
    }

    #[test]
    fn ordinary_source_is_not_excused() {
        let note = zero_sessions_note("export function scrape(page) {}", "https://kidyoga.example/camps");
        assert!(note.is_none());
    }
}
