//! Directory loop (§4.7): crawl queued listing pages, extract outbound
//! camp URLs, and report them back to the backend so it can fan them out
//! into per-organization scraper-development requests.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::Backend;
use crate::browser::{BrowserDriver, BrowserSession, NavigateOptions, WaitUntil};
use crate::domain::{DirectoryCompletion, DirectoryQueueItem};

use super::periodic::PeriodicLoop;

const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

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

pub struct DirectoryLoop {
    backend: Arc<dyn Backend>,
    driver: Arc<dyn BrowserDriver>,
    http: reqwest::Client,
    navigation_timeout: Duration,
}

impl DirectoryLoop {
    pub fn new(backend: Arc<dyn Backend>, driver: Arc<dyn BrowserDriver>, navigation_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            backend,
            driver,
            http,
            navigation_timeout,
        }
    }

    async fn process_item(&self, item: &DirectoryQueueItem) -> DirectoryCompletion {
        let html = match self.fetch_html(&item.url).await {
            Ok(html) => html,
            Err(e) => return DirectoryCompletion::failure(e.to_string()),
        };

        let source_url = match Url::parse(&item.url) {
            Ok(url) => url,
            Err(e) => return DirectoryCompletion::failure(e.to_string()),
        };

        let urls = extract_links(
            &html,
            &source_url,
            item.base_url_filter.as_deref(),
            item.link_pattern.as_deref(),
        );

        DirectoryCompletion::success(urls)
    }

    /// HTTP GET first; on a 403 or network error, fall back to a browser
    /// session with a network-idle wait and explicit post-load sleep
    /// (§4.7 step 2).
    async fn fetch_html(&self, url: &str) -> eyre::Result<String> {
        match self.http.get(url).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => {
                return Ok(resp.text().await?);
            }
            Ok(resp) if resp.status() == StatusCode::FORBIDDEN => {
                debug!(%url, "DirectoryLoop::fetch_html: 403, falling back to browser");
            }
            Ok(resp) => {
                return Err(eyre::eyre!("unexpected status {}", resp.status()));
            }
            Err(e) => {
                debug!(%url, error = %e, "DirectoryLoop::fetch_html: network error, falling back to browser");
            }
        }

        let parsed = Url::parse(url)?;
        let session = BrowserSession::new(self.driver.clone());
        session
            .driver()
            .goto(
                &parsed,
                NavigateOptions {
                    wait_until: WaitUntil::NetworkIdle,
                    timeout: self.navigation_timeout,
                },
            )
            .await?;
        session.driver().wait_for_timeout(Duration::from_secs(3)).await;
        let html = session.driver().outer_html().await?;
        session.close().await?;
        Ok(html)
    }
}

#[async_trait]
impl PeriodicLoop for DirectoryLoop {
    fn name(&self) -> &'static str {
        "directory"
    }
    fn interval(&self) -> Duration {
        Duration::from_secs(30)
    }
    fn initial_delay(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn tick(&self) -> eyre::Result<()> {
        let items = self.backend.get_pending_directories(3).await?;
        for item in items {
            if !self.backend.claim_queue_item(&item.id).await? {
                debug!(item_id = %item.id, "DirectoryLoop::tick: already claimed, skipping");
                continue;
            }

            let completion = self.process_item(&item).await;
            info!(
                item_id = %item.id,
                success = completion.success,
                links_found = completion.links_found,
                "DirectoryLoop::tick: completed item"
            );
            if let Err(e) = self.backend.complete_queue_item(&item.id, &completion).await {
                warn!(item_id = %item.id, error = %e, "DirectoryLoop::tick: failed to report completion");
            }
        }
        Ok(())
    }
}

/// Link extraction rules per §4.7: resolve relative hrefs, skip
/// empty/`#`/`javascript:`/`mailto:`/`tel:`, skip the source's own host,
/// apply the optional base-url/link-pattern filters, reject excluded
/// extensions and social/non-camp domains, dedupe by domain.
fn extract_links(html: &str, source_url: &Url, base_url_filter: Option<&str>, link_pattern: Option<&str>) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();
    let source_host = source_url.host_str().unwrap_or_default().to_lowercase();
    let link_pattern_re = link_pattern.and_then(|p| Regex::new(p).ok());

    let mut seen_domains = HashSet::new();
    let mut urls = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let text = element.text().collect::<String>();

        let Some(resolved) = resolve_link(source_url, href) else {
            continue;
        };

        let host = resolved.host_str().unwrap_or_default().to_lowercase();
        if host == source_host {
            continue;
        }
        if SOCIAL_DOMAINS.iter().any(|d| host.ends_with(d)) {
            continue;
        }

        let path = resolved.path().to_lowercase();
        if EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            continue;
        }

        if let Some(filter) = base_url_filter {
            if !host.contains(filter) {
                continue;
            }
        }

        if let Some(re) = &link_pattern_re {
            if !re.is_match(resolved.as_str()) && !re.is_match(&text) {
                continue;
            }
        }

        if !seen_domains.insert(host) {
            continue;
        }

        urls.push(resolved.to_string());
    }

    urls
}

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_dedupes_by_domain() {
        let html = r#"
            <a href="https://partner-a.example/camp1">Camp 1</a>
            <a href="https://partner-a.example/camp2">Camp 2</a>
            <a href="https://partner-b.example/camp">Camp B</a>
            <a href="https://facebook.com/ourpage">Facebook</a>
            <a href="#">Anchor</a>
            <a href="mailto:hi@example.com">Mail</a>
        "#;
        let source = Url::parse("https://directory.example/guide").unwrap();
        let urls = extract_links(html, &source, None, None);
        assert_eq!(urls.len(), 2);
        assert!(urls.iter().any(|u| u.contains("partner-a.example")));
        assert!(urls.iter().any(|u| u.contains("partner-b.example")));
    }

    #[test]
    fn skips_own_host() {
        let html = r#"<a href="/about">About</a>"#;
        let source = Url::parse("https://directory.example/guide").unwrap();
        assert!(extract_links(html, &source, None, None).is_empty());
    }

    #[test]
    fn applies_base_url_filter() {
        let html = r#"
            <a href="https://partner-a.example/camp">A</a>
            <a href="https://other.example/camp">B</a>
        "#;
        let source = Url::parse("https://directory.example/guide").unwrap();
        let urls = extract_links(html, &source, Some("partner-a"), None);
        assert_eq!(urls, vec!["https://partner-a.example/camp".to_string()]);
    }

    #[test]
    fn applies_link_pattern_against_url_or_text() {
        let html = r#"
            <a href="https://partner-a.example/summer-camp">Random text</a>
            <a href="https://other.example/unrelated">Not camps</a>
        "#;
        let source = Url::parse("https://directory.example/guide").unwrap();
        let urls = extract_links(html, &source, None, Some("(?i)camp"));
        assert_eq!(urls, vec!["https://partner-a.example/summer-camp".to_string()]);
    }

    #[test]
    fn rejects_excluded_extensions() {
        let html = r#"<a href="https://partner-a.example/brochure.pdf">Brochure</a>"#;
        let source = Url::parse("https://directory.example/guide").unwrap();
        assert!(extract_links(html, &source, None, None).is_empty());
    }
}
