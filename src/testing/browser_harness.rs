//! Browser-dependent test path (§4.5): hand the generated scraper off to
//! an external live-browser test harness script and parse its result.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use eyre::Result;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::TestingConfig;

use super::outcome::SessionSample;

const JSON_START: &str = "__JSON_START__";
const JSON_END: &str = "__JSON_END__";

#[derive(Debug, Deserialize)]
struct HarnessPayload {
    #[serde(default)]
    samples: Vec<SessionSample>,
    #[serde(default)]
    error: Option<String>,
}

/// Invoke `test-scraper.ts` with the scraper path and source URL, 3 minute
/// timeout. Prefers the sentinel-delimited JSON payload's `samples` array;
/// falls back to a `SUCCESS: Found N sessions` text pattern; any other
/// outcome is an empty, non-fatal result (§4.5, §7 — "never fatal").
pub async fn run_browser_harness(config: &TestingConfig, scraper_path: &Path, url: &str) -> Result<(Vec<SessionSample>, Option<String>)> {
    let mut cmd = Command::new(&config.runner_binary);
    cmd.arg(&config.harness_script).arg(scraper_path).arg(url);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(error = %e, "run_browser_harness: failed to spawn harness");
            return Ok((Vec::new(), Some(format!("failed to spawn test harness: {e}"))));
        }
    };

    let timeout = Duration::from_millis(config.harness_timeout_ms);
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Ok((Vec::new(), Some(format!("test harness error: {e}")))),
        Err(_) => {
            debug!("run_browser_harness: harness timed out");
            return Ok((Vec::new(), Some("Timeout after 3 minutes".to_string())));
        }
    };

    let mut stdout = String::new();
    output.stdout.as_slice().read_to_string(&mut stdout).await.ok();

    if let Some(payload) = parse_sentinel_payload(&stdout) {
        return Ok((payload.samples, payload.error));
    }

    if let Some(count) = parse_success_text(&stdout) {
        let placeholders = (0..count)
            .map(|i| SessionSample {
                name: Some(format!("Session {}", i + 1)),
                ..Default::default()
            })
            .collect();
        return Ok((placeholders, None));
    }

    Ok((Vec::new(), None))
}

fn parse_sentinel_payload(stdout: &str) -> Option<HarnessPayload> {
    let start = stdout.find(JSON_START)? + JSON_START.len();
    let end = stdout[start..].find(JSON_END)? + start;
    serde_json::from_str(&stdout[start..end]).ok()
}

fn parse_success_text(stdout: &str) -> Option<u32> {
    let re = regex::Regex::new(r"SUCCESS: Found (\d+) sessions").unwrap();
    re.captures(stdout).and_then(|c| c[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sentinel_payload() {
        let stdout = format!(
            "noise\n{JSON_START}{{\"samples\":[{{\"name\":\"Art Camp\"}}]}}{JSON_END}\nmore noise"
        );
        let payload = parse_sentinel_payload(&stdout).unwrap();
        assert_eq!(payload.samples.len(), 1);
        assert_eq!(payload.samples[0].name.as_deref(), Some("Art Camp"));
    }

    #[test]
    fn falls_back_to_success_text_pattern() {
        let stdout = "running...\nSUCCESS: Found 3 sessions\ndone";
        assert_eq!(parse_success_text(stdout), Some(3));
    }

    #[test]
    fn neither_pattern_yields_none() {
        assert!(parse_sentinel_payload("nothing").is_none());
        assert!(parse_success_text("nothing").is_none());
    }
}
