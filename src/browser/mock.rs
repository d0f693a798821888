//! Test double for [`super::BrowserDriver`].

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use super::{BrowserDriver, BrowserError, CapturedResponse, NavigateOptions};

pub struct MockBrowserDriver {
    pub responses: Mutex<Vec<CapturedResponse>>,
    pub extract_responses: Mutex<Vec<Value>>,
    pub outer_html: Mutex<String>,
    pub hooks_supported: bool,
    closed: AtomicBool,
    goto_calls: Mutex<Vec<String>>,
}

impl MockBrowserDriver {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            extract_responses: Mutex::new(Vec::new()),
            outer_html: Mutex::new(String::new()),
            hooks_supported: true,
            closed: AtomicBool::new(false),
            goto_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn close_called(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn goto_calls(&self) -> Vec<String> {
        self.goto_calls.lock().unwrap().clone()
    }
}

impl Default for MockBrowserDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserDriver for MockBrowserDriver {
    async fn goto(&self, url: &Url, _opts: NavigateOptions) -> Result<(), BrowserError> {
        self.goto_calls.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn wait_for_timeout(&self, _duration: Duration) {}

    async fn evaluate(&self, _script: &str) -> Result<Value, BrowserError> {
        Ok(Value::Null)
    }

    async fn extract(&self, _instruction: &str, _schema: &Value) -> Result<Value, BrowserError> {
        let mut queue = self.extract_responses.lock().unwrap();
        if queue.is_empty() {
            Ok(Value::Object(Default::default()))
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn outer_html(&self) -> Result<String, BrowserError> {
        Ok(self.outer_html.lock().unwrap().clone())
    }

    async fn install_network_hooks(&self) -> bool {
        self.hooks_supported
    }

    async fn drain_captured_responses(&self) -> Vec<CapturedResponse> {
        std::mem::take(&mut *self.responses.lock().unwrap())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
