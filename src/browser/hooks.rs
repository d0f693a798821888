//! Best-effort request/response capture used by the exploration stage's API
//! sniffer. The opaque browser service's hook API is best-effort by spec
//! (§4.2): "install... if unsupported, skip API discovery silently".

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl CapturedResponse {
    pub fn is_xhr_or_fetch_like(&self) -> bool {
        self.url.contains("/api/")
    }

    pub fn is_json_ok(&self) -> bool {
        self.status == 200 && self.content_type.contains("application/json")
    }
}
