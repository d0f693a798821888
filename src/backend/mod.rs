//! The backend RPC surface (§6): a typed async-trait collaborator, modeled
//! on the shape of [`crate::llm`]-style client traits in the rest of the
//! ecosystem — one trait per external collaborator, one concrete
//! implementation, one test double.

mod client;
mod error;

#[cfg(test)]
pub mod mock;

pub use client::HttpBackend;
pub use error::BackendError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    CityId, ContactExtractionTarget, DevelopmentRequest, DirectoryCompletion, DirectoryQueueItem, DiscoveryCompletion,
    DiscoveryTask, OrgId, QueueItemId, RequestId, SiteExploration, TaskId, WorkerId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub slug: String,
    pub name: String,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// The typed RPC surface the daemon consumes. The document database and its
/// transport are out of scope (§1); this trait is the contract the daemon
/// programs against.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_all_cities(&self) -> BackendResult<Vec<City>>;
    async fn get_pending_requests(&self) -> BackendResult<Vec<DevelopmentRequest>>;
    async fn get_next_and_claim(
        &self,
        worker_id: &WorkerId,
        city_id: Option<&CityId>,
    ) -> BackendResult<Option<DevelopmentRequest>>;

    async fn save_exploration(&self, request_id: &RequestId, exploration: &SiteExploration) -> BackendResult<()>;
    async fn update_scraper_code(&self, request_id: &RequestId, scraper_code: &str) -> BackendResult<()>;
    async fn record_test_results(
        &self,
        request_id: &RequestId,
        sessions_found: u32,
        sample_data: Option<serde_json::Value>,
        error: Option<String>,
    ) -> BackendResult<()>;
    async fn submit_feedback(&self, request_id: &RequestId, feedback: &str, feedback_by: &str) -> BackendResult<()>;
    async fn mark_directory_processed(
        &self,
        request_id: &RequestId,
        notes: &str,
        links_found: usize,
        requests_created: usize,
    ) -> BackendResult<()>;
    async fn request_scraper_development(
        &self,
        source_name: &str,
        source_url: &str,
        city_id: Option<&CityId>,
        notes: &str,
        requested_by: &str,
    ) -> BackendResult<RequestId>;

    async fn get_pending_directories(&self, limit: usize) -> BackendResult<Vec<DirectoryQueueItem>>;
    async fn claim_queue_item(&self, id: &QueueItemId) -> BackendResult<bool>;
    async fn complete_queue_item(&self, id: &QueueItemId, completion: &DirectoryCompletion) -> BackendResult<()>;

    async fn get_orgs_needing_contact_info(&self, limit: usize) -> BackendResult<Vec<ContactExtractionTarget>>;
    async fn save_org_contact_info(
        &self,
        org_id: &OrgId,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> BackendResult<()>;

    async fn get_pending_discovery_tasks(&self, limit: usize) -> BackendResult<Vec<DiscoveryTask>>;
    async fn claim_discovery_task(&self, task_id: &TaskId, session_id: &str) -> BackendResult<bool>;
    async fn update_discovery_progress(&self, task_id: &TaskId, progress: serde_json::Value) -> BackendResult<()>;
    async fn complete_discovery_task(&self, task_id: &TaskId, completion: &DiscoveryCompletion) -> BackendResult<()>;
    async fn fail_discovery_task(&self, task_id: &TaskId, error: &str) -> BackendResult<()>;
    async fn process_discovery_results(&self, task_id: &TaskId, discovered_urls: &[String]) -> BackendResult<()>;
}

/// Resolve a `--city` slug to a city id: exact slug/name match wins, else a
/// substring match on slug or name, else an error listing available slugs.
pub fn resolve_city<'a>(cities: &'a [City], query: &str) -> Result<&'a City, BackendError> {
    let needle = query.to_lowercase();

    if let Some(city) = cities
        .iter()
        .find(|c| c.slug.to_lowercase() == needle || c.name.to_lowercase() == needle)
    {
        return Ok(city);
    }

    if let Some(city) = cities
        .iter()
        .find(|c| c.slug.to_lowercase().contains(&needle) || c.name.to_lowercase().contains(&needle))
    {
        return Ok(city);
    }

    let available = cities.iter().map(|c| c.slug.as_str()).collect::<Vec<_>>().join(", ");
    Err(BackendError::UnknownCity(query.to_string(), available))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cities() -> Vec<City> {
        vec![
            City {
                id: CityId::from("c1"),
                slug: "portland".to_string(),
                name: "Portland, OR".to_string(),
            },
            City {
                id: CityId::from("c2"),
                slug: "seattle".to_string(),
                name: "Seattle, WA".to_string(),
            },
        ]
    }

    #[test]
    fn resolve_city_exact_slug() {
        let cities = cities();
        let city = resolve_city(&cities, "seattle").unwrap();
        assert_eq!(city.id.as_str(), "c2");
    }

    #[test]
    fn resolve_city_substring_match() {
        let cities = cities();
        let city = resolve_city(&cities, "port").unwrap();
        assert_eq!(city.id.as_str(), "c1");
    }

    #[test]
    fn resolve_city_unknown_lists_available() {
        let cities = cities();
        let err = resolve_city(&cities, "chicago").unwrap_err();
        match err {
            BackendError::UnknownCity(query, available) => {
                assert_eq!(query, "chicago");
                assert!(available.contains("portland"));
                assert!(available.contains("seattle"));
            }
            _ => panic!("expected UnknownCity"),
        }
    }
}
