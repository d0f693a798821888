//! Scratchpad filesystem layout (§5, §6): per-request scratch files,
//! partitioned by request id so workers never touch each other's files.

use std::path::{Path, PathBuf};

use crate::config::ScratchpadConfig;
use crate::domain::RequestId;

#[derive(Debug, Clone)]
pub struct Scratchpad {
    dir: PathBuf,
}

impl Scratchpad {
    pub fn from_config(config: &ScratchpadConfig) -> Self {
        Self { dir: config.dir.clone() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prompt_path(&self, request_id: &RequestId) -> PathBuf {
        self.dir.join(format!("prompt-{}.md", request_id.as_str()))
    }

    pub fn scraper_path(&self, request_id: &RequestId) -> PathBuf {
        self.dir.join(format!("scraper-{}.ts", request_id.as_str()))
    }

    pub fn transcript_path(&self, request_id: &RequestId) -> PathBuf {
        self.dir.join(format!("transcript-{}.txt", request_id.as_str()))
    }

    /// A per-request working directory under the scratchpad, used by the
    /// test stage for its mock-runner and harness invocations so concurrent
    /// workers never share a scratch file.
    pub fn request_scratch_dir(&self, request_id: &RequestId) -> PathBuf {
        self.dir.join(format!("test-{}", request_id.as_str()))
    }

    pub fn daemon_log_path(&self) -> PathBuf {
        self.dir.join("daemon.log")
    }

    pub fn current_status_path(&self) -> PathBuf {
        self.dir.join("current-status.txt")
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// Overwrite `current-status.txt` with a one-line snapshot of what each
    /// worker is doing. Best-effort: failures are logged by the caller, not
    /// fatal to the scheduling loop.
    pub fn write_current_status(&self, lines: &[String]) -> std::io::Result<()> {
        std::fs::write(self.current_status_path(), lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scratchpad(dir: &Path) -> Scratchpad {
        Scratchpad::from_config(&ScratchpadConfig { dir: dir.to_path_buf() })
    }

    #[test]
    fn per_request_paths_are_partitioned_by_id() {
        let dir = tempdir().unwrap();
        let pad = scratchpad(dir.path());
        let id = RequestId::from("r1");
        assert_eq!(pad.prompt_path(&id), dir.path().join("prompt-r1.md"));
        assert_eq!(pad.scraper_path(&id), dir.path().join("scraper-r1.ts"));
        assert_eq!(pad.transcript_path(&id), dir.path().join("transcript-r1.txt"));
    }

    #[test]
    fn write_current_status_overwrites_the_file() {
        let dir = tempdir().unwrap();
        let pad = scratchpad(dir.path());
        pad.ensure_dir().unwrap();
        pad.write_current_status(&["worker-0: idle".to_string()]).unwrap();
        pad.write_current_status(&["worker-0: busy r1".to_string()]).unwrap();
        let contents = std::fs::read_to_string(pad.current_status_path()).unwrap();
        assert_eq!(contents, "worker-0: busy r1");
    }
}
