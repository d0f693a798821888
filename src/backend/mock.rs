//! Canned-response test double for [`super::Backend`], in the same style as
//! the stack's `llm::client::mock::MockLlmClient`: a queue of responses
//! drained in call order, plus a call log workers/tests can assert on.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::{
    CityId, ContactExtractionTarget, DevelopmentRequest, DirectoryCompletion, DirectoryQueueItem, DiscoveryCompletion,
    DiscoveryTask, OrgId, QueueItemId, RequestId, SiteExploration, TaskId, WorkerId,
};

use super::{Backend, BackendError, BackendResult, City};

#[derive(Default)]
pub struct MockBackend {
    pub cities: Mutex<Vec<City>>,
    pub claimable: Mutex<Vec<DevelopmentRequest>>,
    pub pending_directories: Mutex<Vec<DirectoryQueueItem>>,
    pub orgs_needing_contact: Mutex<Vec<ContactExtractionTarget>>,
    pub discovery_tasks: Mutex<Vec<DiscoveryTask>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_all_cities(&self) -> BackendResult<Vec<City>> {
        self.log("listAllCities");
        Ok(self.cities.lock().unwrap().clone())
    }

    async fn get_pending_requests(&self) -> BackendResult<Vec<DevelopmentRequest>> {
        self.log("getPendingRequests");
        Ok(self.claimable.lock().unwrap().clone())
    }

    async fn get_next_and_claim(
        &self,
        _worker_id: &WorkerId,
        _city_id: Option<&CityId>,
    ) -> BackendResult<Option<DevelopmentRequest>> {
        self.log("getNextAndClaim");
        Ok(self.claimable.lock().unwrap().pop())
    }

    async fn save_exploration(&self, _request_id: &RequestId, _exploration: &SiteExploration) -> BackendResult<()> {
        self.log("saveExploration");
        Ok(())
    }

    async fn update_scraper_code(&self, _request_id: &RequestId, _scraper_code: &str) -> BackendResult<()> {
        self.log("updateScraperCode");
        Ok(())
    }

    async fn record_test_results(
        &self,
        _request_id: &RequestId,
        _sessions_found: u32,
        _sample_data: Option<serde_json::Value>,
        _error: Option<String>,
    ) -> BackendResult<()> {
        self.log("recordTestResults");
        Ok(())
    }

    async fn submit_feedback(&self, _request_id: &RequestId, _feedback: &str, _feedback_by: &str) -> BackendResult<()> {
        self.log("submitFeedback");
        Ok(())
    }

    async fn mark_directory_processed(
        &self,
        _request_id: &RequestId,
        _notes: &str,
        _links_found: usize,
        _requests_created: usize,
    ) -> BackendResult<()> {
        self.log("markDirectoryProcessed");
        Ok(())
    }

    async fn request_scraper_development(
        &self,
        _source_name: &str,
        _source_url: &str,
        _city_id: Option<&CityId>,
        _notes: &str,
        _requested_by: &str,
    ) -> BackendResult<RequestId> {
        self.log("requestScraperDevelopment");
        Ok(RequestId::from(uuid::Uuid::new_v4().to_string()))
    }

    async fn get_pending_directories(&self, limit: usize) -> BackendResult<Vec<DirectoryQueueItem>> {
        self.log("getPendingDirectories");
        let items = self.pending_directories.lock().unwrap();
        Ok(items.iter().take(limit).cloned().collect())
    }

    async fn claim_queue_item(&self, _id: &QueueItemId) -> BackendResult<bool> {
        self.log("claimQueueItem");
        Ok(true)
    }

    async fn complete_queue_item(&self, _id: &QueueItemId, _completion: &DirectoryCompletion) -> BackendResult<()> {
        self.log("completeQueueItem");
        Ok(())
    }

    async fn get_orgs_needing_contact_info(&self, limit: usize) -> BackendResult<Vec<ContactExtractionTarget>> {
        self.log("getOrgsNeedingContactInfo");
        let orgs = self.orgs_needing_contact.lock().unwrap();
        Ok(orgs.iter().take(limit).cloned().collect())
    }

    async fn save_org_contact_info(
        &self,
        _org_id: &OrgId,
        _email: Option<&str>,
        _phone: Option<&str>,
    ) -> BackendResult<()> {
        self.log("saveOrgContactInfo");
        Ok(())
    }

    async fn get_pending_discovery_tasks(&self, limit: usize) -> BackendResult<Vec<DiscoveryTask>> {
        self.log("getPendingDiscoveryTasks");
        let tasks = self.discovery_tasks.lock().unwrap();
        Ok(tasks.iter().take(limit).cloned().collect())
    }

    async fn claim_discovery_task(&self, _task_id: &TaskId, _session_id: &str) -> BackendResult<bool> {
        self.log("claimDiscoveryTask");
        Ok(true)
    }

    async fn update_discovery_progress(&self, _task_id: &TaskId, _progress: serde_json::Value) -> BackendResult<()> {
        self.log("updateDiscoveryProgress");
        Ok(())
    }

    async fn complete_discovery_task(&self, _task_id: &TaskId, _completion: &DiscoveryCompletion) -> BackendResult<()> {
        self.log("completeDiscoveryTask");
        Ok(())
    }

    async fn fail_discovery_task(&self, _task_id: &TaskId, _error: &str) -> BackendResult<()> {
        self.log("failDiscoveryTask");
        Ok(())
    }

    async fn process_discovery_results(&self, _task_id: &TaskId, _discovered_urls: &[String]) -> BackendResult<()> {
        self.log("processDiscoveryResults");
        Ok(())
    }
}

/// Ensure `BackendError` stays constructible from within tests that want to
/// exercise the error path without a live server.
#[allow(dead_code)]
fn _assert_send_sync() {
    fn assert<T: Send + Sync>() {}
    assert::<MockBackend>();
    assert::<BackendError>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestStatus;

    #[tokio::test]
    async fn get_next_and_claim_drains_queue() {
        let mock = MockBackend::new();
        mock.claimable
            .lock()
            .unwrap()
            .push(DevelopmentRequest::new("r1", "Kid Yoga PDX", "https://kidyoga.example"));

        let worker_id = WorkerId::for_index(0);
        let claimed = mock.get_next_and_claim(&worker_id, None).await.unwrap();
        assert!(claimed.is_some());
        assert_eq!(claimed.unwrap().status, RequestStatus::Pending);

        let second = mock.get_next_and_claim(&worker_id, None).await.unwrap();
        assert!(second.is_none());
        assert_eq!(mock.calls().len(), 2);
    }
}
