//! Shared result types for the test stage (§4.5).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One normalized session sample, shared by every test path's output shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionSample {
    pub name: Option<String>,
    pub dates: Option<String>,
    pub location: Option<String>,
    pub ages: Option<String>,
    pub price: Option<String>,
    pub available: Option<bool>,
}

/// The terminal outcome of one test attempt. The three failure-adjacent
/// shapes are kept distinct because the worker pipeline treats them
/// differently: a real error and a disallowed zero-session result both
/// trigger auto-feedback, while a *validated* zero-session result is a
/// legitimate success (§4.5's zero-sessions validity check).
#[derive(Debug, Clone)]
pub enum TestOutcome {
    Success { sessions_found: u32, sample_data: Value },
    ZeroSessionsValid { note: String },
    Failure { error: Option<String> },
}

impl TestOutcome {
    pub fn success(sessions_found: u32, samples: &[SessionSample]) -> Self {
        TestOutcome::Success {
            sessions_found,
            sample_data: serde_json::to_value(samples.iter().take(5).collect::<Vec<_>>()).unwrap_or_default(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        TestOutcome::Failure { error: Some(error.into()) }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TestOutcome::Failure { .. })
    }

    pub fn sessions_found(&self) -> u32 {
        match self {
            TestOutcome::Success { sessions_found, .. } => *sessions_found,
            _ => 0,
        }
    }
}
