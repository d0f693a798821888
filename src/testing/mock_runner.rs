//! Programmatic test path (§4.5): execute the generated scraper against a
//! mock page object in a short-lived subprocess, looking for a
//! sentinel-prefixed JSON result line.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use eyre::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::TestingConfig;

use super::outcome::SessionSample;
use super::static_analysis::{estimate_session_count, fabricate_samples};

const RESULT_SENTINEL: &str = "__RESULT__";

#[derive(Debug, Deserialize)]
struct MockRunnerResult {
    success: bool,
    #[serde(rename = "sessionCount")]
    session_count: u32,
    #[serde(default)]
    sessions: Vec<Value>,
}

/// Write the scraper code plus a small runner harness to a scratch
/// directory, execute it with the configured runner binary, and parse the
/// `__RESULT__{...}` sentinel line. Falls back to static analysis when the
/// subprocess doesn't report a positive session count.
pub async fn run_mock_page(config: &TestingConfig, code: &str, scratch_dir: &Path) -> Result<(u32, Vec<SessionSample>)> {
    std::fs::create_dir_all(scratch_dir).context("creating mock-runner scratch dir")?;
    let scraper_path = scratch_dir.join("scraper-under-test.ts");
    let runner_path = scratch_dir.join("mock-runner.mjs");

    std::fs::write(&scraper_path, code).context("writing scraper-under-test.ts")?;
    std::fs::write(&runner_path, mock_runner_source(&scraper_path)).context("writing mock-runner.mjs")?;

    let mut cmd = Command::new(&config.runner_binary);
    cmd.arg(&runner_path);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let spawn_result = cmd.spawn();
    let child = match spawn_result {
        Ok(child) => child,
        Err(e) => {
            warn!(error = %e, "run_mock_page: failed to spawn runner, falling back to static analysis");
            return Ok(static_fallback(code));
        }
    };

    let timeout = Duration::from_millis(config.mock_runner_timeout_ms);
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!(error = %e, "run_mock_page: runner subprocess error, falling back to static analysis");
            return Ok(static_fallback(code));
        }
        Err(_) => {
            debug!("run_mock_page: runner timed out after 30s, falling back to static analysis");
            return Ok(static_fallback(code));
        }
    };

    let mut stdout = String::new();
    let mut reader = output.stdout.as_slice();
    reader.read_to_string(&mut stdout).await.ok();

    match parse_sentinel_line(&stdout) {
        Some(result) if result.success && result.session_count > 0 => {
            let samples = result
                .sessions
                .into_iter()
                .take(10)
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect();
            Ok((result.session_count, samples))
        }
        _ => Ok(static_fallback(code)),
    }
}

fn parse_sentinel_line(stdout: &str) -> Option<MockRunnerResult> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(RESULT_SENTINEL))
        .and_then(|json| serde_json::from_str(json).ok())
}

fn static_fallback(code: &str) -> (u32, Vec<SessionSample>) {
    let estimated = estimate_session_count(code);
    (estimated, fabricate_samples(code, estimated))
}

fn mock_runner_source(scraper_path: &Path) -> String {
    format!(
        r#"import {{ scrape }} from "{path}";

const mockPage = {{
  url: () => "about:blank",
  goto: async () => {{}},
  waitForTimeout: async () => {{}},
  evaluate: async () => ({{}}),
  extract: async () => ({{}}),
}};

try {{
  const sessions = await scrape(mockPage);
  const sample = Array.isArray(sessions) ? sessions.slice(0, 10) : [];
  console.log("{sentinel}" + JSON.stringify({{
    success: true,
    sessionCount: Array.isArray(sessions) ? sessions.length : 0,
    sessions: sample,
  }}));
}} catch (err) {{
  console.log("{sentinel}" + JSON.stringify({{ success: false, sessionCount: 0, sessions: [] }}));
}}
"#,
        path = scraper_path.display(),
        sentinel = RESULT_SENTINEL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sentinel_line_with_preceding_noise() {
        let stdout = "some preamble\n__RESULT__{\"success\":true,\"sessionCount\":2,\"sessions\":[{\"name\":\"A\"}]}\n";
        let result = parse_sentinel_line(stdout).unwrap();
        assert!(result.success);
        assert_eq!(result.session_count, 2);
        assert_eq!(result.sessions.len(), 1);
    }

    #[test]
    fn distinguishes_zero_sessions_from_one_session() {
        let zero = "__RESULT__{\"success\":true,\"sessionCount\":0,\"sessions\":[]}";
        let one = "__RESULT__{\"success\":true,\"sessionCount\":1,\"sessions\":[{}]}";
        assert_eq!(parse_sentinel_line(zero).unwrap().session_count, 0);
        assert_eq!(parse_sentinel_line(one).unwrap().session_count, 1);
    }

    #[test]
    fn missing_sentinel_returns_none() {
        assert!(parse_sentinel_line("nothing useful here").is_none());
    }
}
