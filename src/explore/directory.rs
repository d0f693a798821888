//! Directory heuristic and DOM-side link extraction (§4.2): decide whether
//! a source is itself a directory of camps, and if so extract its outbound
//! links, deduped and filtered down to plausible camp detail pages.

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::domain::DirectoryLink;

/// Hosts known to be camp-listing directories rather than individual
/// sources.
const KNOWN_DIRECTORY_HOSTS: &[&str] = &[
    "kidsoutandabout.com",
    "parentmap.com",
    "activityhero.com",
    "sawyer.com",
    "acacamps.org",
];

const DIRECTORY_PATH_MARKERS: &[&str] = &["/guide", "/list", "/directory", "/best-", "/top-"];

const EXCLUDED_PATH_PATTERNS: &[&str] = &["/search", "/login", "/cart", "/category/", "/tag/"];

const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".css", ".js", ".ico", ".zip", ".doc", ".docx",
];

const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "yelp.com",
    "tripadvisor.com",
    "wikipedia.org",
    "google.com",
    "youtube.com",
    "pinterest.com",
    "linkedin.com",
];

const CAMP_TEXT_RE: &str = r"(?i)camp|program|class|activity|workshop|lesson";

pub const MAX_EXTERNAL_LINKS: usize = 30;
pub const MAX_INTERNAL_LINKS: usize = 50;

/// `isDirectory` flagging: known host, a directory path marker, or a
/// parsed `estimatedCampCount` above 20.
pub fn is_directory(url: &str, estimated_camp_count: Option<&str>) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let path = parsed.path().to_lowercase();

    if KNOWN_DIRECTORY_HOSTS.iter().any(|h| host.ends_with(h)) {
        return true;
    }
    if DIRECTORY_PATH_MARKERS.iter().any(|m| path.contains(m)) {
        return true;
    }
    if let Some(count_str) = estimated_camp_count {
        if let Some(count) = count_str.chars().filter(|c| c.is_ascii_digit()).collect::<String>().parse::<u32>().ok() {
            if count > 20 {
                return true;
            }
        }
    }
    false
}

fn matches_excluded_path(path: &str) -> bool {
    if EXCLUDED_PATH_PATTERNS.iter().any(|p| path.contains(p)) {
        return true;
    }
    // `/page/N` — a numeric pagination segment.
    let page_re = Regex::new(r"/page/\d+").unwrap();
    page_re.is_match(path)
}

fn has_excluded_extension(path: &str) -> bool {
    EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn is_social_or_aggregator(host: &str) -> bool {
    SOCIAL_DOMAINS.iter().any(|d| host.ends_with(d))
}

/// Internal links (same host) are kept only if the path looks like a camp
/// detail page, or the link text mentions camp-ish vocabulary.
fn looks_like_camp_detail(path: &str, text: &str) -> bool {
    let patterns = [
        r"/content/.*camp",
        r"/camps/[^/]+",
        r"/programs/[^/]+",
        r"/activities/[^/]+",
        r"/classes/[^/]+",
        r"/listings/[^/]+",
        r"/providers/[^/]+",
        r"-\d{4}$",
    ];
    if patterns.iter().any(|p| Regex::new(p).unwrap().is_match(path)) {
        return true;
    }
    Regex::new(CAMP_TEXT_RE).unwrap().is_match(text)
}

/// Extract `{url, name, isInternal}` links from rendered HTML, resolved
/// against `source_url`, deduped (internal by full URL, external by
/// domain), filtered by excluded path/extension/social rules, and for
/// internal links gated on looking like a camp detail page. Running this
/// twice on the same HTML yields the same set (Testable Properties §8.4).
pub fn extract_directory_links(html: &str, source_url: &Url) -> Vec<DirectoryLink> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();
    let source_host = source_url.host_str().unwrap_or_default().to_lowercase();

    let mut internal_seen = std::collections::HashSet::new();
    let mut external_seen_domains = std::collections::HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let text = element.text().collect::<String>().trim().to_string();

        let Some(resolved) = resolve_link(source_url, href) else {
            continue;
        };

        let path = resolved.path().to_lowercase();
        if matches_excluded_path(&path) || has_excluded_extension(&path) {
            continue;
        }

        let host = resolved.host_str().unwrap_or_default().to_lowercase();
        if is_social_or_aggregator(&host) {
            continue;
        }

        let is_internal = host == source_host;
        if is_internal {
            if !looks_like_camp_detail(&path, &text) {
                continue;
            }
            if !internal_seen.insert(resolved.to_string()) {
                continue;
            }
        } else {
            if !external_seen_domains.insert(host.clone()) {
                continue;
            }
        }

        links.push(DirectoryLink {
            url: resolved.to_string(),
            name: if text.is_empty() { resolved.to_string() } else { text },
            is_internal,
        });
    }

    links
}

/// Resolve a possibly-relative href the way Plato-solutions-doonop's
/// `engine::make_absolute_url` does: try an absolute parse first, then
/// join against the base, discard anything else (malformed hrefs,
/// `data:` URIs, etc).
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed == "#" || trimmed.starts_with("javascript:") || trimmed.starts_with("mailto:") || trimmed.starts_with("tel:") {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(trimmed).ok(),
        Err(_) => None,
    }
}

/// Cap the external/internal link counts per spec §4.2 (30 external, 50
/// internal).
pub fn cap_links(links: Vec<DirectoryLink>) -> Vec<DirectoryLink> {
    let mut external = Vec::new();
    let mut internal = Vec::new();
    for link in links {
        if link.is_internal {
            if internal.len() < MAX_INTERNAL_LINKS {
                internal.push(link);
            }
        } else if external.len() < MAX_EXTERNAL_LINKS {
            external.push(link);
        }
    }
    external.into_iter().chain(internal).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_directory_host_is_flagged() {
        assert!(is_directory(
            "https://www.kidsoutandabout.com/content/portland-summer-camps-guide",
            None
        ));
    }

    #[test]
    fn directory_path_marker_is_flagged() {
        assert!(is_directory("https://example.com/best-camps-2026", None));
    }

    #[test]
    fn estimated_count_over_twenty_is_flagged() {
        assert!(is_directory("https://example.com/camps", Some("35 camps")));
        assert!(!is_directory("https://example.com/camps", Some("5 camps")));
    }

    #[test]
    fn ordinary_source_is_not_a_directory() {
        assert!(!is_directory("https://kidyoga.example/camps", None));
    }

    #[test]
    fn extraction_is_idempotent_modulo_domain_dedup() {
        let html = r#"
            <a href="https://partner-a.example/camp-finder">Camp Finder A</a>
            <a href="https://partner-a.example/other">Camp Finder A Again</a>
            <a href="/camps/art-camp-2026">Art Camp</a>
            <a href="https://facebook.com/ourpage">Facebook</a>
            <a href="/search?q=x">Search</a>
        "#;
        let source = Url::parse("https://directory.example/guide").unwrap();

        let first = extract_directory_links(html, &source);
        let second = extract_directory_links(html, &source);
        assert_eq!(first, second);

        // One external link per domain even though partner-a.example
        // appears twice.
        let external_count = first.iter().filter(|l| !l.is_internal).count();
        assert_eq!(external_count, 1);
        assert!(first.iter().any(|l| l.is_internal && l.url.contains("art-camp-2026")));
        assert!(!first.iter().any(|l| l.url.contains("facebook.com")));
        assert!(!first.iter().any(|l| l.url.contains("search?q=x")));
    }

    #[test]
    fn caps_external_and_internal_counts() {
        let mut links = Vec::new();
        for i in 0..40 {
            links.push(DirectoryLink {
                url: format!("https://partner-{i}.example/x"),
                name: "x".to_string(),
                is_internal: false,
            });
        }
        for i in 0..60 {
            links.push(DirectoryLink {
                url: format!("https://directory.example/camps/{i}"),
                name: "x".to_string(),
                is_internal: true,
            });
        }
        let capped = cap_links(links);
        assert_eq!(capped.iter().filter(|l| !l.is_internal).count(), MAX_EXTERNAL_LINKS);
        assert_eq!(capped.iter().filter(|l| l.is_internal).count(), MAX_INTERNAL_LINKS);
    }
}
