//! Diagnosis / auto-feedback (§4.6): turn a failing or rejected test
//! result into structured feedback and re-open the request.

mod feedback;
mod site_type;
mod smells;

pub use feedback::build_feedback;
pub use site_type::{classify_site, SiteType};

use eyre::Result;
use tracing::debug;

use crate::backend::Backend;
use crate::domain::RequestId;

const FEEDBACK_BY: &str = "auto-diagnosis";

/// Diagnose a failing test outcome and submit feedback, re-opening the
/// request for another iteration.
pub async fn diagnose_and_submit(
    backend: &dyn Backend,
    request_id: &RequestId,
    url: &str,
    code: &str,
    test_error: Option<&str>,
) -> Result<()> {
    let feedback = build_feedback(url, code, test_error);
    debug!(%request_id, %feedback, "diagnose_and_submit: called");
    backend.submit_feedback(request_id, &feedback, FEEDBACK_BY).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    #[tokio::test]
    async fn submits_feedback_with_auto_diagnosis_attribution() {
        let backend = MockBackend::new();
        let request_id = RequestId::from("req-1");
        diagnose_and_submit(
            &backend,
            &request_id,
            "https://x.activecommunities.com/y",
            "document.querySelectorAll('.x')",
            Some("boom"),
        )
        .await
        .unwrap();

        let calls = backend.calls();
        assert!(calls.iter().any(|c| c == "submitFeedback"));
    }
}
