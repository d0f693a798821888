//! Contact-extraction loop (§4.8): drive a browser to each organization's
//! website and pull contact details via AI extraction.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};
use url::Url;

use crate::backend::Backend;
use crate::browser::{BrowserDriver, BrowserSession, NavigateOptions, WaitUntil};
use crate::domain::ContactExtractionTarget;

use super::periodic::PeriodicLoop;

const EXTRACT_INSTRUCTION: &str = "Find this organization's contact email and phone number, and if present a \
contact name and title. Look in the page header, footer, any \"Contact Us\" section, and typical \
role-based addresses (info@, contact@, registration@). Only report values actually present on the page.";

fn extract_schema() -> Value {
    json!({ "email": "string", "phone": "string", "contactName": "string", "contactTitle": "string", "address": "string" })
}

pub struct ContactLoop {
    backend: Arc<dyn Backend>,
    driver: Arc<dyn BrowserDriver>,
    navigation_timeout: Duration,
}

impl ContactLoop {
    pub fn new(backend: Arc<dyn Backend>, driver: Arc<dyn BrowserDriver>, navigation_timeout: Duration) -> Self {
        Self {
            backend,
            driver,
            navigation_timeout,
        }
    }

    async fn extract_contact(&self, target: &ContactExtractionTarget) -> eyre::Result<(Option<String>, Option<String>)> {
        let url = Url::parse(&target.website)?;
        let session = BrowserSession::new(self.driver.clone());
        session
            .driver()
            .goto(
                &url,
                NavigateOptions {
                    wait_until: WaitUntil::NetworkIdle,
                    timeout: self.navigation_timeout,
                },
            )
            .await?;
        session.driver().wait_for_timeout(Duration::from_secs(3)).await;

        let extracted = session.driver().extract(EXTRACT_INSTRUCTION, &extract_schema()).await?;
        session.close().await?;

        let email = extracted.get("email").and_then(Value::as_str).map(str::to_string);
        let phone = extracted.get("phone").and_then(Value::as_str).map(str::to_string);
        Ok((email, phone))
    }
}

#[async_trait]
impl PeriodicLoop for ContactLoop {
    fn name(&self) -> &'static str {
        "contact"
    }
    fn interval(&self) -> Duration {
        Duration::from_secs(60)
    }
    fn initial_delay(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn tick(&self) -> eyre::Result<()> {
        let targets = self.backend.get_orgs_needing_contact_info(3).await?;
        for target in targets {
            let (email, phone) = match self.extract_contact(&target).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(org_id = %target.org_id, error = %e, "ContactLoop::tick: extraction failed");
                    (None, None)
                }
            };

            info!(org_id = %target.org_id, found_email = email.is_some(), found_phone = phone.is_some(), "ContactLoop::tick: saving contact info");
            self.backend
                .save_org_contact_info(&target.org_id, email.as_deref(), phone.as_deref())
                .await?;
        }
        Ok(())
    }
}
