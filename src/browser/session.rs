//! Scope-bound browser session acquisition (Design Notes §9): guarantees
//! closure on every exit path, including panics.

use std::sync::Arc;
use tracing::{debug, warn};

use super::{BrowserDriver, BrowserError};

pub struct BrowserSession {
    driver: Arc<dyn BrowserDriver>,
    closed: bool,
}

impl BrowserSession {
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self { driver, closed: false }
    }

    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Explicit close on the happy path. `Drop` remains a backstop for
    /// panics and early returns, matching the ownership rule in Design
    /// Notes §9.
    pub async fn close(mut self) -> Result<(), BrowserError> {
        debug!("BrowserSession::close: called");
        self.closed = true;
        self.driver.close().await
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let driver = self.driver.clone();
        // Drop can't `.await`; best-effort close on a detached task is the
        // only option here.
        tokio::spawn(async move {
            if let Err(e) = driver.close().await {
                warn!(error = %e, "BrowserSession::drop: best-effort close failed");
            }
        });
    }
}
