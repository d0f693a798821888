//! Daemon configuration and loading.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub browser: BrowserConfig,
    pub agent: AgentConfig,
    pub scheduler: SchedulerConfig,
    pub scratchpad: ScratchpadConfig,
    pub testing: TestingConfig,
}

impl Config {
    /// Load configuration with the same fallback chain as the rest of the
    /// stack: explicit path -> project-local file -> user config dir ->
    /// defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".scraperd.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("scraperd").join("scraperd.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Backend RPC client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/rpc".to_string(),
            api_key_env: "SCRAPERD_BACKEND_TOKEN".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Headless-browser driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: String,
    #[serde(rename = "navigation-timeout-ms")]
    pub navigation_timeout_ms: u64,
    #[serde(rename = "post-load-sleep-ms")]
    pub post_load_sleep_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            navigation_timeout_ms: 30_000,
            post_load_sleep_ms: 3_000,
        }
    }
}

/// Code-generation agent subprocess configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub binary: String,
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
    #[serde(rename = "kill-grace-ms")]
    pub kill_grace_ms: u64,
    #[serde(rename = "extra-path")]
    pub extra_path: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: "scraper-agent".to_string(),
            timeout_ms: 20 * 60 * 1000,
            kill_grace_ms: 5_000,
            extra_path: None,
        }
    }
}

/// Worker pool and periodic-loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub workers: u32,
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,
    #[serde(rename = "directory-interval-ms")]
    pub directory_interval_ms: u64,
    #[serde(rename = "contact-interval-ms")]
    pub contact_interval_ms: u64,
    #[serde(rename = "discovery-interval-ms")]
    pub discovery_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            poll_interval_ms: 5_000,
            directory_interval_ms: 30_000,
            contact_interval_ms: 60_000,
            discovery_interval_ms: 30_000,
        }
    }
}

/// Scratchpad filesystem layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchpadConfig {
    pub dir: PathBuf,
}

impl Default for ScratchpadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./.scraper-development"),
        }
    }
}

/// Test-stage subprocess configuration: the mock-page runner and the
/// external browser test harness (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    #[serde(rename = "runner-binary")]
    pub runner_binary: String,
    #[serde(rename = "mock-runner-timeout-ms")]
    pub mock_runner_timeout_ms: u64,
    #[serde(rename = "harness-script")]
    pub harness_script: PathBuf,
    #[serde(rename = "harness-timeout-ms")]
    pub harness_timeout_ms: u64,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            runner_binary: "node".to_string(),
            mock_runner_timeout_ms: 30_000,
            harness_script: PathBuf::from("./test-scraper.ts"),
            harness_timeout_ms: 3 * 60 * 1000,
        }
    }
}

/// Clamp the `--workers` flag to `[1, 10]`, defaulting to 1 on the way in
/// for values clap itself would already reject as non-numeric.
pub fn clamp_workers(n: u32) -> u32 {
    n.clamp(1, 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_expectations() {
        let config = Config::default();
        assert_eq!(config.scheduler.workers, 1);
        assert_eq!(config.agent.timeout_ms, 20 * 60 * 1000);
        assert_eq!(config.browser.post_load_sleep_ms, 3_000);
    }

    #[test]
    fn deserialize_partial_config_uses_defaults() {
        let yaml = r#"
scheduler:
  workers: 4
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scheduler.workers, 4);
        assert_eq!(config.scheduler.poll_interval_ms, 5_000);
        assert_eq!(config.backend.base_url, "http://localhost:4000/rpc");
    }

    #[test]
    fn clamp_workers_bounds() {
        assert_eq!(clamp_workers(0), 1);
        assert_eq!(clamp_workers(1), 1);
        assert_eq!(clamp_workers(10), 10);
        assert_eq!(clamp_workers(25), 10);
    }
}
