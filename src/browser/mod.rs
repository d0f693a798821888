//! The headless-browser driver surface (§6): `goto`, `waitForTimeout`,
//! `evaluate`, `extract(instruction, schema)`, best-effort request/response
//! hooks, and session closure. The service itself is an opaque collaborator
//! (§1 non-goals); this module only types the contract and provides one
//! concrete driver plus a test double.

mod error;
mod hooks;
mod session;
mod thirtyfour_driver;

#[cfg(test)]
pub mod mock;

pub use error::BrowserError;
pub use hooks::CapturedResponse;
pub use session::BrowserSession;
pub use thirtyfour_driver::ThirtyfourDriver;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    Load,
    NetworkIdle,
}

#[derive(Debug, Clone)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitUntil::NetworkIdle,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A driven headless-browser page. One instance per exploration/test/loop
/// iteration; always wrapped in a [`BrowserSession`] so closure happens on
/// every exit path.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn goto(&self, url: &Url, opts: NavigateOptions) -> Result<(), BrowserError>;
    async fn wait_for_timeout(&self, duration: Duration);
    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError>;
    async fn extract(&self, instruction: &str, schema: &Value) -> Result<Value, BrowserError>;
    async fn outer_html(&self) -> Result<String, BrowserError>;

    /// Best-effort network capture. `None` means the underlying driver
    /// doesn't support hooks at all; an empty vec means hooks are
    /// installed but nothing matched yet.
    async fn install_network_hooks(&self) -> bool;
    async fn drain_captured_responses(&self) -> Vec<CapturedResponse>;

    async fn close(&self) -> Result<(), BrowserError>;
}
