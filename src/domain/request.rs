//! `DevelopmentRequest` and its append-only feedback history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::exploration::SiteExploration;
use super::id::{CityId, RequestId, WorkerId};

/// One entry in a request's feedback history. Entries are appended, never
/// mutated or removed — the history is the record of every re-attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub feedback_at: DateTime<Utc>,
    pub feedback: String,
    pub scraper_version_before: u32,
    pub feedback_by: String,
}

/// Why a request is no longer being worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    TestedSuccess,
    TestedFailure,
    DirectoryProcessed,
}

/// One attempt at producing a scraper for a single source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentRequest {
    pub id: RequestId,
    pub source_name: String,
    pub source_url: String,
    pub city_id: Option<CityId>,
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub claimant_id: Option<WorkerId>,
    pub scraper_version: u32,
    pub generated_scraper_code: Option<String>,
    pub feedback_history: Vec<FeedbackEntry>,
    pub site_exploration: Option<SiteExploration>,
}

impl DevelopmentRequest {
    pub fn new(id: impl Into<RequestId>, source_name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_name: source_name.into(),
            source_url: source_url.into(),
            city_id: None,
            notes: None,
            status: RequestStatus::Pending,
            claimant_id: None,
            scraper_version: 0,
            generated_scraper_code: None,
            feedback_history: Vec::new(),
            site_exploration: None,
        }
    }

    /// Append a feedback entry and reopen the request for another attempt.
    /// This is the only mutation the feedback cycle performs on history —
    /// never edits or removes a prior entry.
    pub fn append_feedback(&mut self, feedback: impl Into<String>, feedback_by: impl Into<String>) {
        let entry = FeedbackEntry {
            feedback_at: Utc::now(),
            feedback: feedback.into(),
            scraper_version_before: self.scraper_version,
            feedback_by: feedback_by.into(),
        };
        self.feedback_history.push(entry);
        self.status = RequestStatus::Pending;
        self.claimant_id = None;
    }

    pub fn latest_feedback(&self) -> Option<&FeedbackEntry> {
        self.feedback_history.last()
    }

    pub fn bump_scraper_code(&mut self, code: String) {
        self.generated_scraper_code = Some(code);
        self.scraper_version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_feedback_reopens_and_clears_claimant() {
        let mut req = DevelopmentRequest::new("r1", "Kid Yoga PDX", "https://kidyoga.example/camps");
        req.status = RequestStatus::InProgress;
        req.claimant_id = Some(WorkerId::for_index(0));
        req.bump_scraper_code("const x = 1;".into());

        req.append_feedback("fix the selectors", "auto-diagnosis");

        assert_eq!(req.status, RequestStatus::Pending);
        assert!(req.claimant_id.is_none());
        assert_eq!(req.feedback_history.len(), 1);
        assert_eq!(req.feedback_history[0].scraper_version_before, 1);
    }

    #[test]
    fn feedback_history_is_append_only() {
        let mut req = DevelopmentRequest::new("r1", "n", "u");
        req.append_feedback("first", "auto-diagnosis");
        req.append_feedback("second", "auto-diagnosis");
        assert_eq!(req.feedback_history.len(), 2);
        assert_eq!(req.feedback_history[0].feedback, "first");
        assert_eq!(req.latest_feedback().unwrap().feedback, "second");
    }
}
