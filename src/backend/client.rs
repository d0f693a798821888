//! `HttpBackend` — a reqwest-based JSON-RPC client for the document
//! database's query/mutation surface, grounded on the same request-building
//! shape as the stack's Anthropic HTTP client: one `http` client, one base
//! URL, named-method POSTs, explicit status handling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;
use crate::domain::{
    CityId, ContactExtractionTarget, DevelopmentRequest, DirectoryCompletion, DirectoryQueueItem, DiscoveryCompletion,
    DiscoveryTask, OrgId, QueueItemId, RequestId, SiteExploration, TaskId, WorkerId,
};

use super::{Backend, BackendError, BackendResult, City};

pub struct HttpBackend {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let token = std::env::var(&config.api_key_env).ok();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            token,
            http,
        })
    }

    async fn call<T: Serialize, R: for<'de> Deserialize<'de>>(&self, method: &str, params: &T) -> BackendResult<R> {
        debug!(%method, "HttpBackend::call: called");
        let mut req = self.http.post(format!("{}/{}", self.base_url, method)).json(params);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<R>()
            .await
            .map_err(|e| BackendError::SchemaDrift(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_all_cities(&self) -> BackendResult<Vec<City>> {
        self.call("listAllCities", &json!({})).await
    }

    async fn get_pending_requests(&self) -> BackendResult<Vec<DevelopmentRequest>> {
        self.call("getPendingRequests", &json!({})).await
    }

    async fn get_next_and_claim(
        &self,
        worker_id: &WorkerId,
        city_id: Option<&CityId>,
    ) -> BackendResult<Option<DevelopmentRequest>> {
        self.call(
            "getNextAndClaim",
            &json!({ "workerId": worker_id.as_str(), "cityId": city_id.map(CityId::as_str) }),
        )
        .await
    }

    async fn save_exploration(&self, request_id: &RequestId, exploration: &SiteExploration) -> BackendResult<()> {
        self.call(
            "saveExploration",
            &json!({ "requestId": request_id.as_str(), "exploration": exploration }),
        )
        .await
    }

    async fn update_scraper_code(&self, request_id: &RequestId, scraper_code: &str) -> BackendResult<()> {
        self.call(
            "updateScraperCode",
            &json!({ "requestId": request_id.as_str(), "scraperCode": scraper_code }),
        )
        .await
    }

    async fn record_test_results(
        &self,
        request_id: &RequestId,
        sessions_found: u32,
        sample_data: Option<serde_json::Value>,
        error: Option<String>,
    ) -> BackendResult<()> {
        self.call(
            "recordTestResults",
            &json!({
                "requestId": request_id.as_str(),
                "sessionsFound": sessions_found,
                "sampleData": sample_data,
                "error": error,
            }),
        )
        .await
    }

    async fn submit_feedback(&self, request_id: &RequestId, feedback: &str, feedback_by: &str) -> BackendResult<()> {
        self.call(
            "submitFeedback",
            &json!({ "requestId": request_id.as_str(), "feedback": feedback, "feedbackBy": feedback_by }),
        )
        .await
    }

    async fn mark_directory_processed(
        &self,
        request_id: &RequestId,
        notes: &str,
        links_found: usize,
        requests_created: usize,
    ) -> BackendResult<()> {
        self.call(
            "markDirectoryProcessed",
            &json!({
                "requestId": request_id.as_str(),
                "notes": notes,
                "linksFound": links_found,
                "requestsCreated": requests_created,
            }),
        )
        .await
    }

    async fn request_scraper_development(
        &self,
        source_name: &str,
        source_url: &str,
        city_id: Option<&CityId>,
        notes: &str,
        requested_by: &str,
    ) -> BackendResult<RequestId> {
        self.call(
            "requestScraperDevelopment",
            &json!({
                "sourceName": source_name,
                "sourceUrl": source_url,
                "cityId": city_id.map(CityId::as_str),
                "notes": notes,
                "requestedBy": requested_by,
            }),
        )
        .await
    }

    async fn get_pending_directories(&self, limit: usize) -> BackendResult<Vec<DirectoryQueueItem>> {
        self.call("getPendingDirectories", &json!({ "limit": limit })).await
    }

    async fn claim_queue_item(&self, id: &QueueItemId) -> BackendResult<bool> {
        self.call("claimQueueItem", &json!({ "id": id.as_str() })).await
    }

    async fn complete_queue_item(&self, id: &QueueItemId, completion: &DirectoryCompletion) -> BackendResult<()> {
        self.call(
            "completeQueueItem",
            &json!({ "id": id.as_str(), "result": completion }),
        )
        .await
    }

    async fn get_orgs_needing_contact_info(&self, limit: usize) -> BackendResult<Vec<ContactExtractionTarget>> {
        self.call("getOrgsNeedingContactInfo", &json!({ "limit": limit })).await
    }

    async fn save_org_contact_info(
        &self,
        org_id: &OrgId,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> BackendResult<()> {
        self.call(
            "saveOrgContactInfo",
            &json!({ "orgId": org_id.as_str(), "email": email, "phone": phone }),
        )
        .await
    }

    async fn get_pending_discovery_tasks(&self, limit: usize) -> BackendResult<Vec<DiscoveryTask>> {
        self.call("getPendingDiscoveryTasks", &json!({ "limit": limit })).await
    }

    async fn claim_discovery_task(&self, task_id: &TaskId, session_id: &str) -> BackendResult<bool> {
        self.call(
            "claimDiscoveryTask",
            &json!({ "taskId": task_id.as_str(), "sessionId": session_id }),
        )
        .await
    }

    async fn update_discovery_progress(&self, task_id: &TaskId, progress: serde_json::Value) -> BackendResult<()> {
        self.call(
            "updateDiscoveryProgress",
            &json!({ "taskId": task_id.as_str(), "progress": progress }),
        )
        .await
    }

    async fn complete_discovery_task(&self, task_id: &TaskId, completion: &DiscoveryCompletion) -> BackendResult<()> {
        self.call(
            "completeDiscoveryTask",
            &json!({
                "taskId": task_id.as_str(),
                "orgsCreated": completion.orgs_created,
                "orgsExisted": completion.orgs_existed,
                "sourcesCreated": completion.sources_created,
            }),
        )
        .await
    }

    async fn fail_discovery_task(&self, task_id: &TaskId, error: &str) -> BackendResult<()> {
        self.call(
            "failDiscoveryTask",
            &json!({ "taskId": task_id.as_str(), "error": error }),
        )
        .await
    }

    async fn process_discovery_results(&self, task_id: &TaskId, discovered_urls: &[String]) -> BackendResult<()> {
        self.call(
            "processDiscoveryResults",
            &json!({ "taskId": task_id.as_str(), "discoveredUrls": discovered_urls }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(base_url: String) -> HttpBackend {
        HttpBackend {
            base_url,
            token: Some("test-token".to_string()),
            http: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn list_all_cities_sends_bearer_auth_and_parses_the_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/listAllCities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "c1", "slug": "portland", "name": "Portland, OR" }
            ])))
            .mount(&server)
            .await;

        let backend = backend_for(server.uri());
        let cities = backend.list_all_cities().await.unwrap();

        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].slug, "portland");
    }

    #[tokio::test]
    async fn non_success_status_becomes_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getNextAndClaim"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let backend = backend_for(server.uri());
        let worker_id = WorkerId::from("worker-0");
        let err = backend.get_next_and_claim(&worker_id, None).await.unwrap_err();

        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected BackendError::Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn schema_drift_is_reported_distinctly_from_transport_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/listAllCities"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let backend = backend_for(server.uri());
        let err = backend.list_all_cities().await.unwrap_err();
        assert!(matches!(err, BackendError::SchemaDrift(_)));
    }
}
