//! Exploration stage orchestration (§4.2): classify a source's navigation
//! topology and collect hints before any code generation is attempted.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::browser::{BrowserDriver, BrowserSession, NavigateOptions, WaitUntil};
use crate::domain::{DevelopmentRequest, DirectoryLink, Location, SiteExploration};

use super::api_discovery::discovered_api;
use super::directory::{cap_links, extract_directory_links, is_directory};
use super::search_terms::derive_search_terms;

const POST_LOAD_SLEEP: Duration = Duration::from_secs(3);

/// Outcome of exploring a request: either a classification to persist, or
/// (when the source turns out to be a directory) the links to fan out into
/// new scraper-development requests.
#[derive(Debug)]
pub struct ExplorationOutcome {
    pub exploration: SiteExploration,
    pub directory_links: Vec<DirectoryLink>,
}

/// Run the exploration protocol for `request`. Returns `Ok(None)` when a
/// cached exploration already exists (§4.2.1) and the caller should reuse
/// it verbatim without touching the browser.
pub async fn explore(
    request: &DevelopmentRequest,
    driver: Arc<dyn BrowserDriver>,
    navigation_timeout: Duration,
) -> eyre::Result<Option<ExplorationOutcome>> {
    if request.site_exploration.is_some() {
        debug!(request_id = %request.id, "explore: reusing cached exploration, no browser work");
        return Ok(None);
    }

    if request.generated_scraper_code.is_some() {
        debug!(request_id = %request.id, "explore: prior code already exists, skipping browser exploration");
        return Ok(None);
    }

    let url = Url::parse(&request.source_url)?;
    let search_terms = derive_search_terms(&request.source_name, &request.source_url);

    let session = BrowserSession::new(driver);
    let hooks_installed = session.driver().install_network_hooks().await;

    session
        .driver()
        .goto(
            &url,
            NavigateOptions {
                wait_until: WaitUntil::NetworkIdle,
                timeout: navigation_timeout,
            },
        )
        .await?;
    session.driver().wait_for_timeout(POST_LOAD_SLEEP).await;

    let mut discovered_apis = Vec::new();
    if hooks_installed {
        for response in session.driver().drain_captured_responses().await {
            if response.is_xhr_or_fetch_like() || response.is_json_ok() {
                if let Some(api) = discovered_api(&response, &search_terms) {
                    discovered_apis.push(api);
                }
            }
        }
    } else {
        debug!(request_id = %request.id, "explore: network hooks unsupported, skipping API discovery");
    }

    let classification = session
        .driver()
        .extract(CLASSIFY_INSTRUCTION, &classification_schema())
        .await?;

    let mut exploration = exploration_from_classification(&classification);
    exploration.discovered_apis = discovered_apis;
    exploration.api_search_term = search_terms.first().cloned();

    if exploration.has_multiple_locations {
        let locations = session
            .driver()
            .extract(LOCATIONS_INSTRUCTION, &locations_schema())
            .await?;
        exploration.locations = locations_from_value(&locations);
    }

    let estimated_count = classification.get("estimatedCampCount").and_then(Value::as_str).map(str::to_string);
    let directory_flag = is_directory(&request.source_url, estimated_count.as_deref());

    let mut directory_links = Vec::new();
    if directory_flag {
        let html = session.driver().outer_html().await?;
        directory_links = cap_links(extract_directory_links(&html, &url));
        exploration.is_directory = Some(!directory_links.is_empty());
        exploration.directory_links = directory_links.clone();
    } else {
        exploration.is_directory = Some(false);
    }

    exploration.explored_at = Some(now_placeholder());

    info!(
        request_id = %request.id,
        is_directory = exploration.is_directory.unwrap_or(false),
        apis = exploration.discovered_apis.len(),
        "explore: exploration complete"
    );

    session.close().await?;

    Ok(Some(ExplorationOutcome {
        exploration,
        directory_links,
    }))
}

/// `Utc::now()` wrapped so the one call site that needs "now" is easy to
/// find; exploration timestamps are informational only, not relied on for
/// ordering.
fn now_placeholder() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

const CLASSIFY_INSTRUCTION: &str = "Classify this summer-camp organization's website: its organization type, \
whether it serves multiple locations, what categories of camps it offers, whether it uses an external \
registration platform, how to navigate to session listings, and an estimated total camp/session count.";

fn classification_schema() -> Value {
    json!({
        "organizationType": "string",
        "hasMultipleLocations": "boolean",
        "locations": "array",
        "hasCategories": "boolean",
        "categories": "array",
        "externalRegistration": { "platform": "string", "baseUrl": "string", "urlParameters": "array" },
        "navigationInstructions": "string",
        "estimatedCampCount": "string"
    })
}

const LOCATIONS_INSTRUCTION: &str =
    "List every distinct physical location or site this organization operates camps at, with its name, \
the URL (if the location has its own page), and any site id or query parameter used to select it.";

fn locations_schema() -> Value {
    json!({ "locations": [{ "locationName": "string", "url": "string", "siteIdOrParam": "string" }] })
}

fn exploration_from_classification(value: &Value) -> SiteExploration {
    let has_multiple_locations = value.get("hasMultipleLocations").and_then(Value::as_bool).unwrap_or(false);
    let has_categories = value.get("hasCategories").and_then(Value::as_bool).unwrap_or(false);

    let site_type = value
        .get("organizationType")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let categories = value
        .get("categories")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let registration_system = value
        .pointer("/externalRegistration/platform")
        .and_then(Value::as_str)
        .map(str::to_string);

    let navigation_notes = value
        .get("navigationInstructions")
        .and_then(Value::as_str)
        .map(|s| vec![s.to_string()])
        .unwrap_or_default();

    SiteExploration {
        site_type,
        has_multiple_locations,
        locations: locations_from_value(value),
        has_categories,
        categories,
        registration_system,
        url_patterns: Vec::new(),
        navigation_notes,
        is_directory: None,
        directory_links: Vec::new(),
        discovered_apis: Vec::new(),
        api_search_term: None,
        explored_at: None,
    }
}

fn locations_from_value(value: &Value) -> Vec<Location> {
    let array = value
        .get("locations")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    array
        .iter()
        .filter_map(|loc| {
            let name = loc
                .get("locationName")
                .or_else(|| loc.get("name"))
                .and_then(Value::as_str)?
                .to_string();
            Some(Location {
                name,
                url: loc.get("url").and_then(Value::as_str).map(str::to_string),
                site_id: loc.get("siteIdOrParam").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::MockBrowserDriver;

    fn request() -> DevelopmentRequest {
        DevelopmentRequest::new("r1", "Kid Yoga PDX", "https://kidyoga.example/camps")
    }

    #[tokio::test]
    async fn cached_exploration_short_circuits_browser_work() {
        let mut req = request();
        req.site_exploration = Some(SiteExploration::unknown());
        let driver = Arc::new(MockBrowserDriver::new());

        let outcome = explore(&req, driver.clone(), Duration::from_secs(5)).await.unwrap();
        assert!(outcome.is_none());
        assert!(driver.goto_calls().is_empty());
    }

    #[tokio::test]
    async fn explores_and_classifies_single_location_source() {
        let req = request();
        let driver = Arc::new(MockBrowserDriver::new());
        driver.extract_responses.lock().unwrap().push(json!({
            "organizationType": "single_list",
            "hasMultipleLocations": false,
            "categories": ["art", "music"],
            "hasCategories": true,
            "estimatedCampCount": "8"
        }));

        let outcome = explore(&req, driver.clone(), Duration::from_secs(5)).await.unwrap().unwrap();
        assert_eq!(outcome.exploration.site_type, "single_list");
        assert!(!outcome.exploration.has_multiple_locations);
        assert_eq!(outcome.exploration.is_directory, Some(false));
        assert_eq!(driver.goto_calls().len(), 1);
    }

    #[tokio::test]
    async fn directory_source_extracts_and_caps_links() {
        let req = DevelopmentRequest::new(
            "r3",
            "Portland Camps Guide",
            "https://www.kidsoutandabout.com/content/portland-summer-camps-guide",
        );
        let driver = Arc::new(MockBrowserDriver::new());
        driver.extract_responses.lock().unwrap().push(json!({
            "organizationType": "directory",
            "hasMultipleLocations": false,
            "estimatedCampCount": "60"
        }));
        *driver.outer_html.lock().unwrap() = r#"
            <a href="/camps/art-camp-2026">Art Camp</a>
            <a href="https://partner.example/camp">Partner Camp</a>
        "#
        .to_string();

        let outcome = explore(&req, driver, Duration::from_secs(5)).await.unwrap().unwrap();
        assert_eq!(outcome.exploration.is_directory, Some(true));
        assert_eq!(outcome.directory_links.len(), 2);
    }
}
