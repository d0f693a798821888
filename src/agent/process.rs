//! Code-generation subprocess supervision (§4.4): spawn the agent CLI with
//! closed stdin and an augmented `PATH`, stream line-delimited JSON events,
//! mirror every byte to the transcript, and escalate SIGTERM -> SIGKILL on
//! timeout -- grounded on `daemon.rs`'s `stop()` termination sequence and
//! `loop::validation::run_validation`'s `tokio::process::Command` + timeout
//! shape.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use eyre::{Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;

use super::events::{parse_event_line, AgentEvent};
use super::transcript::TranscriptWriter;

#[derive(Debug, Default)]
pub struct AgentRunState {
    pub model: Option<String>,
    pub assistant_text: String,
    pub tool_traces: Vec<String>,
    pub final_duration_ms: Option<u64>,
    pub final_cost_usd: Option<f64>,
    pub saw_result_event: bool,
}

impl AgentRunState {
    fn fold(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::SystemInit { model } => {
                debug!(%model, "AgentRunState::fold: system/init");
                self.model = Some(model);
            }
            AgentEvent::AssistantText { text } => {
                // Stream incremental text, tracking the longest seen prefix
                // to avoid re-echoing a line the agent already sent in full
                // on a prior event.
                if text.len() > self.assistant_text.len() && text.starts_with(&self.assistant_text) {
                    let delta = &text[self.assistant_text.len()..];
                    info!(delta, "agent text");
                    self.assistant_text = text;
                } else if !self.assistant_text.ends_with(&text) {
                    info!(%text, "agent text");
                    self.assistant_text.push_str(&text);
                }
            }
            AgentEvent::ToolUse { name, input_preview } => {
                info!(%name, %input_preview, "agent tool_use");
                self.tool_traces.push(format!("{name}({input_preview})"));
            }
            AgentEvent::ToolResult { preview } => {
                debug!(%preview, "agent tool_result");
            }
            AgentEvent::Result { duration_ms, cost_usd } => {
                info!(?duration_ms, ?cost_usd, "agent result");
                self.final_duration_ms = duration_ms;
                self.final_cost_usd = cost_usd;
                self.saw_result_event = true;
            }
            AgentEvent::Unparsed(line) => {
                debug!(%line, "agent: unparseable stdout line appended verbatim");
            }
        }
    }
}

#[derive(Debug)]
pub struct AgentRunResult {
    pub state: AgentRunState,
    pub timed_out: bool,
    pub exit_code: i32,
    pub stderr: String,
    pub stdout: String,
}

/// Run the agent CLI to completion (or timeout). `prompt` is passed as the
/// final argv element; the agent is invoked with `--print --output-format
/// stream-json`.
pub async fn run_agent(
    config: &AgentConfig,
    prompt: &str,
    output_file: &Path,
    transcript: &mut TranscriptWriter,
) -> Result<AgentRunResult> {
    debug!(binary = %config.binary, "run_agent: called");

    let mut cmd = Command::new(&config.binary);
    cmd.arg("--print").arg("--output-format").arg("stream-json").arg(prompt);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.env("SCRAPER_OUTPUT_FILE", output_file);
    // If the supervisor aborts this task (shutdown grace period elapsed),
    // dropping `child` below kills the subprocess instead of orphaning it.
    cmd.kill_on_drop(true);

    if let Some(extra) = &config.extra_path {
        let existing = std::env::var("PATH").unwrap_or_default();
        cmd.env("PATH", format!("{extra}:{existing}"));
    }

    let mut child = cmd.spawn().context("Failed to spawn agent subprocess")?;
    let stdout = child.stdout.take().context("agent subprocess had no stdout")?;
    let stderr = child.stderr.take().context("agent subprocess had no stderr")?;

    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            collected.push_str(&line);
            collected.push('\n');
        }
        collected
    });

    let mut state = AgentRunState::default();
    let mut lines = BufReader::new(stdout).lines();
    let mut raw_stdout = String::new();

    let read_loop = async {
        while let Some(line) = lines.next_line().await.context("reading agent stdout")? {
            transcript.write_line(&line)?;
            raw_stdout.push_str(&line);
            raw_stdout.push('\n');
            let event = parse_event_line(&line);
            state.fold(event);
        }
        Ok::<(), eyre::Error>(())
    };

    let timeout = Duration::from_millis(config.timeout_ms);
    let timed_out = match tokio::time::timeout(timeout, read_loop).await {
        Ok(Ok(())) => false,
        Ok(Err(e)) => return Err(e),
        Err(_) => true,
    };

    let exit_code = if timed_out {
        warn!(timeout_ms = config.timeout_ms, "run_agent: agent timed out, terminating");
        terminate_with_grace(&child, Duration::from_millis(config.kill_grace_ms)).await;
        let _ = child.wait().await;
        124
    } else {
        let status = child.wait().await.context("waiting for agent subprocess")?;
        status.code().unwrap_or(-1)
    };

    let stderr_output = stderr_task.await.unwrap_or_default();

    Ok(AgentRunResult {
        state,
        timed_out,
        exit_code,
        stderr: stderr_output,
        stdout: raw_stdout,
    })
}

/// Graceful-then-forceful termination: SIGTERM, poll for exit up to `grace`,
/// SIGKILL if it's still alive. Mirrors `daemon.rs::stop()`'s escalation.
async fn terminate_with_grace(child: &tokio::process::Child, grace: Duration) {
    let Some(pid) = child.id() else {
        return;
    };
    let nix_pid = Pid::from_raw(pid as i32);

    if kill(nix_pid, Signal::SIGTERM).is_err() {
        debug!(pid, "terminate_with_grace: process already gone before SIGTERM");
        return;
    }

    let poll_interval = Duration::from_millis(100);
    let mut waited = Duration::ZERO;
    while waited < grace {
        tokio::time::sleep(poll_interval).await;
        waited += poll_interval;
        if kill(nix_pid, None).is_err() {
            debug!(pid, "terminate_with_grace: process exited after SIGTERM");
            return;
        }
    }

    warn!(pid, "terminate_with_grace: still alive after grace period, sending SIGKILL");
    let _ = kill(nix_pid, Signal::SIGKILL);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(binary: &str) -> AgentConfig {
        AgentConfig {
            binary: binary.to_string(),
            timeout_ms: 5_000,
            kill_grace_ms: 200,
            extra_path: None,
        }
    }

    #[tokio::test]
    async fn runs_a_fake_agent_and_parses_events() {
        let dir = tempdir().unwrap();
        let output_file = dir.path().join("out.ts");
        let mut transcript = TranscriptWriter::open(dir.path(), &crate::domain::RequestId::from("r1")).unwrap();

        // "sh" as the agent binary, emitting two event lines.
        let script = r#"echo '{"type":"system","subtype":"init","model":"test-model"}'; echo '{"type":"result","duration_ms":10,"total_cost_usd":0.01}'"#;
        let mut config = test_config("sh");
        config.timeout_ms = 5_000;
        // override argv: spawn via sh -c instead of the default argv shape
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        let mut child = cmd.spawn().unwrap();
        let stdout = child.stdout.take().unwrap();
        let mut lines = BufReader::new(stdout).lines();
        let mut state = AgentRunState::default();
        while let Ok(Some(line)) = lines.next_line().await {
            transcript.write_line(&line).unwrap();
            state.fold(parse_event_line(&line));
        }
        child.wait().await.unwrap();

        assert_eq!(state.model.as_deref(), Some("test-model"));
        assert!(state.saw_result_event);
        assert_eq!(state.final_duration_ms, Some(10));
        let _ = output_file; // not written by this fake agent
    }

    #[tokio::test]
    async fn timeout_triggers_exit_code_124() {
        let dir = tempdir().unwrap();
        let mut transcript = TranscriptWriter::open(dir.path(), &crate::domain::RequestId::from("r2")).unwrap();
        let mut config = test_config("sh");
        config.timeout_ms = 100;
        config.kill_grace_ms = 50;

        // Can't easily exercise the full run_agent() argv shape with `sh`
        // (it ignores --print/--output-format), so this drives the same
        // timeout-then-kill path directly against a sleeping child.
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("sleep 5");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        let mut child = cmd.spawn().unwrap();
        let stdout = child.stdout.take().unwrap();
        let mut lines = BufReader::new(stdout).lines();
        let read_loop = async {
            while let Ok(Some(line)) = lines.next_line().await {
                transcript.write_line(&line).unwrap();
            }
        };
        let timed_out = tokio::time::timeout(Duration::from_millis(config.timeout_ms), read_loop)
            .await
            .is_err();
        assert!(timed_out);
        terminate_with_grace(&child, Duration::from_millis(config.kill_grace_ms)).await;
        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }
}
