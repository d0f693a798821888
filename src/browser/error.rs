use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("webdriver session error: {0}")]
    Session(String),

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("script evaluation failed: {0}")]
    Evaluate(String),

    #[error("ai-extract failed: {0}")]
    Extract(String),
}

impl From<thirtyfour::error::WebDriverError> for BrowserError {
    fn from(e: thirtyfour::error::WebDriverError) -> Self {
        BrowserError::Session(e.to_string())
    }
}
