//! Pure-string classification of generated scraper code (§4.5): decide
//! whether the code needs a live browser or can be executed directly
//! against a mock page. Classification is a pure function of the code
//! string (Testable Properties §8.6) — no AST, just substring/regex
//! probes, matching the way the daemon's own source does this.

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    BrowserDependent,
    Programmatic,
}

const BROWSER_MARKERS: &[&str] = &["page.goto(", "page.extract(", "querySelectorAll"];

fn has_click_or_wait_for(code: &str) -> bool {
    code.contains(".click(") || Regex::new(r"waitFor\w*\(").unwrap().is_match(code)
}

fn has_hardcoded_weeks(code: &str) -> bool {
    let patterns = [r"const\s+weeks\s*=\s*\[", r"weeks\s*:\s*\[.*\]\s*=\s*\[", r"weeks\s*:\s*Array<.*>\s*=\s*\["];
    patterns.iter().any(|p| Regex::new(p).unwrap().is_match(code))
}

fn has_sessions_push(code: &str) -> bool {
    code.contains("sessions.push")
}

fn has_weeks_iteration(code: &str) -> bool {
    code.contains("weeks.forEach") || Regex::new(r"for\s*\([^)]*weeks\.length").unwrap().is_match(code)
}

fn has_generate_weekly_sessions(code: &str) -> bool {
    code.contains("generateWeeklySessions")
}

fn has_any_loop(code: &str) -> bool {
    Regex::new(r"\bfor\s*\(|\bwhile\s*\(").unwrap().is_match(code)
}

/// Classify generated scraper code by pure string inspection, in spec
/// order: browser indicators first, then three programmatic shapes, then
/// the conservative browser-dependent default.
pub fn classify(code: &str) -> Classification {
    if BROWSER_MARKERS.iter().any(|m| code.contains(m)) || has_click_or_wait_for(code) {
        return Classification::BrowserDependent;
    }

    if has_hardcoded_weeks(code) && has_sessions_push(code) && has_weeks_iteration(code) {
        return Classification::Programmatic;
    }

    if has_generate_weekly_sessions(code) && has_sessions_push(code) {
        return Classification::Programmatic;
    }

    if has_any_loop(code) && has_sessions_push(code) {
        return Classification::Programmatic;
    }

    Classification::BrowserDependent
}
