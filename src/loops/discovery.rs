//! Market-discovery loop (§4.9): drive a search engine and known
//! directories to accumulate new organization URLs for a city/region.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::Backend;
use crate::browser::{BrowserDriver, BrowserSession, NavigateOptions, WaitUntil};
use crate::domain::DiscoveryTask;

use super::periodic::PeriodicLoop;

const KNOWN_DIRECTORY_HOSTS: &[&str] = &[
    "kidsoutandabout.com",
    "parentmap.com",
    "activityhero.com",
    "sawyer.com",
    "acacamps.org",
];

const DENY_LIST_RE: &str = r"(?i)facebook\.com|twitter\.com|x\.com|instagram\.com|yelp\.com|tripadvisor\.com|\
wikipedia\.org|google\.com|youtube\.com|pinterest\.com|linkedin\.com|reddit\.com";

const LISTICLE_HINT_RE: &str = r"(?i)/camps|/summer|best|guide|list";

const CAPTCHA_TITLE_RE: &str = r"(?i)captcha|consent|before you continue";

const MIN_NON_DIRECTORY_FOR_COMBO: usize = 3;
const MAX_DIRECTORY_CRAWL: usize = 5;

pub struct DiscoveryLoop {
    backend: Arc<dyn Backend>,
    driver: Arc<dyn BrowserDriver>,
    navigation_timeout: Duration,
    session_id: String,
}

#[derive(Debug, Default)]
struct SearchResult {
    url: String,
    title: String,
}

impl DiscoveryLoop {
    pub fn new(
        backend: Arc<dyn Backend>,
        driver: Arc<dyn BrowserDriver>,
        navigation_timeout: Duration,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            driver,
            navigation_timeout,
            session_id: session_id.into(),
        }
    }

    async fn run_task(&self, task: &DiscoveryTask) -> eyre::Result<Vec<String>> {
        let session = BrowserSession::new(self.driver.clone());

        let mut discovered_urls: Vec<String> = Vec::new();
        let mut seen_domains: HashSet<String> = HashSet::new();
        let mut directories_found = 0u32;
        let mut non_directory_names: Vec<String> = Vec::new();

        // Phase 1 - query sweep.
        for query in &task.search_queries {
            let results = self.run_search_query(&session, query).await?;
            for result in results {
                if !register_result(&result, &mut seen_domains, &mut discovered_urls) {
                    continue;
                }
                if is_known_directory(&result.url) {
                    directories_found += 1;
                } else {
                    non_directory_names.push(result.title.clone());
                }
            }

            self.backend
                .update_discovery_progress(
                    &task.id,
                    json!({ "discoveredUrls": discovered_urls.len(), "directoriesFound": directories_found }),
                )
                .await?;
            session.driver().wait_for_timeout(Duration::from_secs(2)).await;
        }

        // Phase 2 - combo searches.
        if non_directory_names.len() >= MIN_NON_DIRECTORY_FOR_COMBO {
            for combo_query in combo_queries(&non_directory_names) {
                let results = self.run_search_query(&session, &combo_query).await?;
                for result in results {
                    register_result(&result, &mut seen_domains, &mut discovered_urls);
                }
            }
        }

        // Phase 3 - directory crawl.
        let crawl_targets: Vec<String> = discovered_urls
            .iter()
            .filter(|u| is_known_directory(u) || looks_like_listicle(u))
            .take(MAX_DIRECTORY_CRAWL)
            .cloned()
            .collect();

        for target in crawl_targets {
            match self.crawl_directory(&session, &target).await {
                Ok(links) => {
                    for link in links {
                        register_result(&SearchResult { url: link, title: String::new() }, &mut seen_domains, &mut discovered_urls);
                    }
                }
                Err(e) => {
                    debug!(url = %target, error = %e, "DiscoveryLoop::run_task: directory crawl failed, continuing");
                }
            }
        }

        session.close().await?;
        Ok(discovered_urls)
    }

    async fn run_search_query(&self, session: &BrowserSession, query: &str) -> eyre::Result<Vec<SearchResult>> {
        let search_url = Url::parse(&format!("https://www.google.com/search?q={}", urlencoding_encode(query)))?;
        session
            .driver()
            .goto(
                &search_url,
                NavigateOptions {
                    wait_until: WaitUntil::NetworkIdle,
                    timeout: self.navigation_timeout,
                },
            )
            .await?;

        let title = session
            .driver()
            .evaluate("document.title")
            .await
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        if Regex::new(CAPTCHA_TITLE_RE).unwrap().is_match(&title) {
            debug!(%title, "DiscoveryLoop::run_search_query: consent/captcha interstitial detected");
            session
                .driver()
                .evaluate(CLICK_ACCEPT_SCRIPT)
                .await
                .ok();
        }

        let schema = json!({ "results": [{ "url": "string", "title": "string" }] });
        let extracted = session
            .driver()
            .extract("List every organic search result with its URL and title.", &schema)
            .await?;
        let mut results = search_results_from_value(&extracted);

        if results.is_empty() {
            let dom_results = session.driver().evaluate(DOM_RESULTS_SCRIPT).await.ok();
            if let Some(value) = dom_results {
                results = search_results_from_value(&value);
            }
        }

        Ok(results)
    }

    async fn crawl_directory(&self, session: &BrowserSession, url: &str) -> eyre::Result<Vec<String>> {
        let parsed = Url::parse(url)?;
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

        let links = session.driver().evaluate(OUTBOUND_LINKS_SCRIPT).await?;
        let own_host = parsed.host_str().unwrap_or_default().to_lowercase();
        let deny = Regex::new(DENY_LIST_RE).unwrap();

        Ok(links
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .filter(|u| {
                        Url::parse(u)
                            .map(|parsed_link| {
                                let host = parsed_link.host_str().unwrap_or_default().to_lowercase();
                                host != own_host && !deny.is_match(&host)
                            })
                            .unwrap_or(false)
                    })
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl PeriodicLoop for DiscoveryLoop {
    fn name(&self) -> &'static str {
        "discovery"
    }
    fn interval(&self) -> Duration {
        Duration::from_secs(30)
    }
    fn initial_delay(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn tick(&self) -> eyre::Result<()> {
        let tasks = self.backend.get_pending_discovery_tasks(1).await?;
        let Some(task) = tasks.into_iter().next() else {
            return Ok(());
        };

        if !self.backend.claim_discovery_task(&task.id, &self.session_id).await? {
            debug!(task_id = %task.id, "DiscoveryLoop::tick: already claimed, skipping");
            return Ok(());
        }

        match self.run_task(&task).await {
            Ok(discovered_urls) => {
                info!(task_id = %task.id, found = discovered_urls.len(), "DiscoveryLoop::tick: processing discovery results");
                self.backend.process_discovery_results(&task.id, &discovered_urls).await?;
            }
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "DiscoveryLoop::tick: fatal error, failing task");
                self.backend.fail_discovery_task(&task.id, &truncate(&e.to_string(), 500)).await?;
            }
        }
        Ok(())
    }
}

const CLICK_ACCEPT_SCRIPT: &str = r#"
(() => {
  const selectors = ['button#L2AGLb', 'button[aria-label="Accept all"]', 'button[id*="accept"]', 'button[class*="accept"]'];
  for (const sel of selectors) {
    const el = document.querySelector(sel);
    if (el) { el.click(); return true; }
  }
  return false;
})()
"#;

const DOM_RESULTS_SCRIPT: &str = r#"
(() => {
  const anchors = Array.from(document.querySelectorAll('#search a, .g a'));
  const results = anchors
    .filter(a => a.href && a.href.startsWith('http'))
    .map(a => ({ url: a.href, title: a.textContent || '' }));
  return { results };
})()
"#;

const OUTBOUND_LINKS_SCRIPT: &str = r#"
(() => {
  const anchors = Array.from(document.querySelectorAll('a[href]'));
  return Array.from(new Set(anchors.map(a => a.href).filter(h => h.startsWith('http'))));
})()
"#;

fn search_results_from_value(value: &Value) -> Vec<SearchResult> {
    value
        .get("results")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|r| {
                    let url = r.get("url").and_then(Value::as_str)?.to_string();
                    let title = r.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
                    Some(SearchResult { url, title })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn is_known_directory(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else { return false };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    KNOWN_DIRECTORY_HOSTS.iter().any(|h| host.ends_with(h))
}

fn looks_like_listicle(url: &str) -> bool {
    Regex::new(LISTICLE_HINT_RE).unwrap().is_match(url)
}

/// Normalize, dedupe by domain, and reject deny-listed domains. Returns
/// `true` if the result was newly accepted.
fn register_result(result: &SearchResult, seen_domains: &mut HashSet<String>, discovered_urls: &mut Vec<String>) -> bool {
    let Ok(parsed) = Url::parse(&result.url) else { return false };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    if host.is_empty() {
        return false;
    }
    if Regex::new(DENY_LIST_RE).unwrap().is_match(&host) {
        return false;
    }
    if !seen_domains.insert(host) {
        return false;
    }
    discovered_urls.push(result.url.clone());
    true
}

fn combo_queries(names: &[String]) -> Vec<String> {
    let mut unique: Vec<&String> = Vec::new();
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
        if unique.len() >= 4 {
            break;
        }
    }
    let mut queries = Vec::new();
    for pair in unique.chunks(2) {
        if pair.len() == 2 {
            queries.push(format!("\"{}\" \"{}\"", pair[0], pair[1]));
        }
        if queries.len() >= 2 {
            break;
        }
    }
    queries
}

fn urlencoding_encode(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~') {
                c.to_string()
            } else if c == ' ' {
                "+".to_string()
            } else {
                c.to_string().as_bytes().iter().map(|b| format!("%{:02X}", b)).collect()
            }
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::browser::mock::MockBrowserDriver;
    use crate::domain::{CityId, DiscoveryTaskStatus};

    #[tokio::test]
    async fn tick_with_no_pending_tasks_is_a_no_op() {
        let backend = Arc::new(MockBackend::new());
        let driver = Arc::new(MockBrowserDriver::new());
        let loop_ = DiscoveryLoop::new(backend.clone(), driver, Duration::from_secs(5), "sess-1");
        loop_.tick().await.unwrap();
        assert!(backend.calls().iter().any(|c| c == "getPendingDiscoveryTasks"));
        assert!(!backend.calls().iter().any(|c| c == "processDiscoveryResults"));
    }

    #[tokio::test]
    async fn tick_processes_claimed_task_and_reports_results() {
        let backend = Arc::new(MockBackend::new());
        backend.discovery_tasks.lock().unwrap().push(DiscoveryTask {
            id: crate::domain::TaskId::from("task-1"),
            city_id: CityId::from("city-1"),
            region_name: "Portland".to_string(),
            search_queries: vec!["portland summer camps".to_string()],
            max_search_results: None,
            status: DiscoveryTaskStatus::Pending,
        });

        let driver = Arc::new(MockBrowserDriver::new());
        driver.extract_responses.lock().unwrap().push(json!({
            "results": [{ "url": "https://kidyoga.example/camps", "title": "Kid Yoga" }]
        }));

        let loop_ = DiscoveryLoop::new(backend.clone(), driver, Duration::from_secs(5), "sess-1");
        loop_.tick().await.unwrap();

        let calls = backend.calls();
        assert!(calls.iter().any(|c| c == "claimDiscoveryTask"));
        assert!(calls.iter().any(|c| c == "processDiscoveryResults"));
    }

    #[test]
    fn recognizes_known_directory() {
        assert!(is_known_directory("https://www.kidsoutandabout.com/content/guide"));
        assert!(!is_known_directory("https://kidyoga.example/camps"));
    }

    #[test]
    fn recognizes_listicle_hints() {
        assert!(looks_like_listicle("https://example.com/best-summer-camps"));
        assert!(!looks_like_listicle("https://example.com/register"));
    }

    #[test]
    fn register_result_dedupes_by_domain_and_rejects_deny_list() {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        assert!(register_result(&SearchResult { url: "https://a.example/x".into(), title: "A".into() }, &mut seen, &mut urls));
        assert!(!register_result(&SearchResult { url: "https://a.example/y".into(), title: "A2".into() }, &mut seen, &mut urls));
        assert!(!register_result(&SearchResult { url: "https://facebook.com/page".into(), title: "FB".into() }, &mut seen, &mut urls));
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn combo_queries_pairs_unique_names() {
        let names = vec!["Art Camp".to_string(), "Art Camp".to_string(), "Music Camp".to_string(), "Science Camp".to_string()];
        let queries = combo_queries(&names);
        assert_eq!(queries.len(), 2);
        assert!(queries[0].contains("Art Camp"));
    }

    #[test]
    fn url_encoding_handles_spaces_and_quotes() {
        assert_eq!(urlencoding_encode("summer camps"), "summer+camps");
        assert!(urlencoding_encode("\"Art Camp\"").contains("%22"));
    }
}
