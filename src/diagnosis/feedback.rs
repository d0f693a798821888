//! Feedback synthesis (§4.6): turn a site type, code smells, and optional
//! test error into the human-readable string submitted back to the request.

use super::site_type::{classify_site, SiteType};
use super::smells::detect_smells;

const ACTIVE_COMMUNITIES_PROLOGUE: &str = "⚠️ CRITICAL: This is an ActiveCommunities site. Do not use DOM \
selectors against the rendered page: these are React SPAs whose session data is populated asynchronously. \
Instead, reverse-engineer the site's own URL-parameter search API (look for activity/program search \
endpoints with location, category, and date-range parameters) and call it directly.";

const MAX_ERROR_LEN: usize = 500;

/// Build the feedback string for one test iteration. `test_error` is the
/// raw error text from the test stage, if any.
pub fn build_feedback(url: &str, code: &str, test_error: Option<&str>) -> String {
    let site_type = classify_site(url);
    let smells = detect_smells(code);

    let mut sections = Vec::new();

    if site_type == SiteType::ActiveCommunities {
        sections.push(ACTIVE_COMMUNITIES_PROLOGUE.to_string());
    }

    if !smells.is_empty() {
        let issues = smells.iter().map(|s| format!("- {}", s.issue)).collect::<Vec<_>>().join("\n");
        let fixes = smells.iter().map(|s| format!("- {}", s.fix)).collect::<Vec<_>>().join("\n");
        sections.push(format!("Possible issues:\n{issues}\n\nSuggested fixes:\n{fixes}"));
    }

    if let Some(error) = test_error {
        sections.push(format!("Test error:\n{}", truncate(error, MAX_ERROR_LEN)));
    }

    sections.join("\n\n")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_communities_gets_strong_prologue() {
        let feedback = build_feedback("https://x.activecommunities.com/y", "const a = 1;", None);
        assert!(feedback.starts_with("⚠️ CRITICAL: This is an ActiveCommunities site"));
        assert!(feedback.contains("Do not use DOM selectors"));
    }

    #[test]
    fn smells_produce_paired_bullets() {
        let code = "document.querySelectorAll('.x')";
        let feedback = build_feedback("https://kidyoga.example/camps", code, None);
        assert!(feedback.contains("Possible issues:"));
        assert!(feedback.contains("Suggested fixes:"));
    }

    #[test]
    fn error_is_truncated_to_500_chars() {
        let long_error = "e".repeat(1000);
        let feedback = build_feedback("https://kidyoga.example/camps", "clean code", Some(&long_error));
        let error_section = feedback.split("Test error:\n").nth(1).unwrap();
        assert!(error_section.len() <= 503);
    }

    #[test]
    fn clean_code_with_no_error_and_unknown_site_is_empty() {
        let code = "await page.goto(url, { waitUntil: 'networkidle' }); await page.waitForTimeout(3000); await page.extract('sessions', schema);";
        let feedback = build_feedback("https://kidyoga.example/camps", code, None);
        assert!(feedback.is_empty());
    }
}
