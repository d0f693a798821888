//! Concrete `BrowserDriver` over `thirtyfour`, grounded on
//! `Plato-solutions-doonop`'s `WebDriverSearcher` (`driver.get`,
//! `execute_script`, `find_elements(By::Tag("a"))`). `thirtyfour` speaks the
//! plain WebDriver protocol, which has no network-interception primitive —
//! `install_network_hooks` is therefore a best-effort no-op, matching the
//! spec's "best-effort; if unsupported, skip API discovery silently".

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use thirtyfour::prelude::*;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use super::{BrowserDriver, BrowserError, CapturedResponse, NavigateOptions};

pub struct ThirtyfourDriver {
    driver: WebDriver,
    captured: Mutex<Vec<CapturedResponse>>,
}

impl ThirtyfourDriver {
    pub async fn connect(webdriver_url: &str) -> Result<Self, BrowserError> {
        debug!(%webdriver_url, "ThirtyfourDriver::connect: called");
        let caps = DesiredCapabilities::chrome();
        let driver = WebDriver::new(webdriver_url, caps).await?;
        Ok(Self {
            driver,
            captured: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl BrowserDriver for ThirtyfourDriver {
    async fn goto(&self, url: &Url, opts: NavigateOptions) -> Result<(), BrowserError> {
        debug!(%url, "ThirtyfourDriver::goto: called");
        timeout(opts.timeout, self.driver.goto(url.as_str()))
            .await
            .map_err(|_| BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: opts.timeout.as_millis() as u64,
            })??;
        Ok(())
    }

    async fn wait_for_timeout(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        debug!("ThirtyfourDriver::evaluate: called");
        let ret = self
            .driver
            .execute(script, Vec::new())
            .await
            .map_err(|e| BrowserError::Evaluate(e.to_string()))?;
        Ok(ret.json().clone())
    }

    async fn extract(&self, instruction: &str, _schema: &Value) -> Result<Value, BrowserError> {
        // The AI-extraction facility is the opaque browser service's own
        // capability (§1 non-goals); this driver can only proxy an
        // instruction through to whatever extraction script the deployment
        // injects. Absent that, extraction degrades to an empty object, and
        // callers fall back to DOM-side heuristics (§4.2, §4.9).
        warn!(%instruction, "ThirtyfourDriver::extract: no AI-extract backend wired, returning empty object");
        Ok(Value::Object(Default::default()))
    }

    async fn outer_html(&self) -> Result<String, BrowserError> {
        self.driver
            .source()
            .await
            .map_err(|e| BrowserError::Evaluate(e.to_string()))
    }

    async fn install_network_hooks(&self) -> bool {
        debug!("ThirtyfourDriver::install_network_hooks: unsupported over plain WebDriver protocol");
        false
    }

    async fn drain_captured_responses(&self) -> Vec<CapturedResponse> {
        std::mem::take(&mut *self.captured.lock().unwrap())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        debug!("ThirtyfourDriver::close: called");
        self.driver.clone().quit().await?;
        Ok(())
    }
}
