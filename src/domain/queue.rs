//! Queue entities for the directory, discovery, and contact loops.

use serde::{Deserialize, Serialize};

use super::id::{CityId, QueueItemId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    Pending,
    Claimed,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryQueueItem {
    pub id: QueueItemId,
    pub city_id: CityId,
    pub url: String,
    pub status: QueueItemStatus,
    pub link_pattern: Option<String>,
    pub base_url_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryCompletion {
    pub success: bool,
    pub links_found: usize,
    pub extracted_urls: Vec<String>,
    pub error: Option<String>,
}

impl DirectoryCompletion {
    pub fn success(extracted_urls: Vec<String>) -> Self {
        Self {
            success: true,
            links_found: extracted_urls.len(),
            extracted_urls,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            links_found: 0,
            extracted_urls: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryTaskStatus {
    Pending,
    Claimed,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryTask {
    pub id: TaskId,
    pub city_id: CityId,
    pub region_name: String,
    pub search_queries: Vec<String>,
    pub max_search_results: Option<u32>,
    pub status: DiscoveryTaskStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryCompletion {
    pub orgs_created: u32,
    pub orgs_existed: u32,
    pub sources_created: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactExtractionTarget {
    pub org_id: super::id::OrgId,
    pub name: String,
    pub website: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_completion_success_counts_links() {
        let completion = DirectoryCompletion::success(vec!["https://a.example".into(), "https://b.example".into()]);
        assert!(completion.success);
        assert_eq!(completion.links_found, 2);
        assert!(completion.error.is_none());
    }

    #[test]
    fn directory_completion_failure_carries_error() {
        let completion = DirectoryCompletion::failure("timed out");
        assert!(!completion.success);
        assert_eq!(completion.error.as_deref(), Some("timed out"));
    }
}
