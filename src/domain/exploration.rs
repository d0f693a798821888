//! `SiteExploration` and `DiscoveredApi` — the cached result of the
//! exploration stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub url: Option<String>,
    pub site_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryLink {
    pub url: String,
    pub name: String,
    pub is_internal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredApi {
    pub url: String,
    pub method: String,
    pub content_type: String,
    pub response_size: usize,
    pub match_count: u32,
    pub structure_hint: Option<String>,
    pub url_pattern: Option<String>,
    pub sample_data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteExploration {
    #[serde(default)]
    pub site_type: String,
    pub has_multiple_locations: bool,
    pub locations: Vec<Location>,
    pub has_categories: bool,
    pub categories: Vec<String>,
    pub registration_system: Option<String>,
    pub url_patterns: Vec<String>,
    pub navigation_notes: Vec<String>,
    pub is_directory: Option<bool>,
    pub directory_links: Vec<DirectoryLink>,
    pub discovered_apis: Vec<DiscoveredApi>,
    pub api_search_term: Option<String>,
    pub explored_at: Option<DateTime<Utc>>,
}

impl SiteExploration {
    pub fn unknown() -> Self {
        Self {
            site_type: "unknown".to_string(),
            explored_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// `discoveredApis` is displayed sorted by match count descending
    /// (Testable Properties §8, boundary behavior on stable ordering).
    pub fn apis_by_match_count(&self) -> Vec<&DiscoveredApi> {
        let mut apis: Vec<&DiscoveredApi> = self.discovered_apis.iter().collect();
        apis.sort_by(|a, b| b.match_count.cmp(&a.match_count));
        apis
    }
}
