//! Per-request transcript mirroring (§4.4, §6 scratchpad layout):
//! `transcript-<id>.txt` gets every byte of the agent's stdout, append-only.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::debug;

use crate::domain::RequestId;

pub struct TranscriptWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl TranscriptWriter {
    pub fn open(scratchpad_dir: &Path, request_id: &RequestId) -> Result<Self> {
        std::fs::create_dir_all(scratchpad_dir)
            .with_context(|| format!("Failed to create scratchpad dir {}", scratchpad_dir.display()))?;
        let path = scratchpad_dir.join(format!("transcript-{}.txt", request_id.as_str()));
        debug!(?path, "TranscriptWriter::open: called");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open transcript file {}", path.display()))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_append_only_lines() {
        let dir = tempdir().unwrap();
        let request_id = RequestId::from("r1");
        {
            let mut writer = TranscriptWriter::open(dir.path(), &request_id).unwrap();
            writer.write_line("line one").unwrap();
            writer.write_line("line two").unwrap();
        }
        let contents = std::fs::read_to_string(dir.path().join("transcript-r1.txt")).unwrap();
        assert_eq!(contents, "line one\nline two\n");
    }

    #[test]
    fn reopening_appends_rather_than_truncating() {
        let dir = tempdir().unwrap();
        let request_id = RequestId::from("r1");
        {
            let mut writer = TranscriptWriter::open(dir.path(), &request_id).unwrap();
            writer.write_line("first session").unwrap();
        }
        {
            let mut writer = TranscriptWriter::open(dir.path(), &request_id).unwrap();
            writer.write_line("second session").unwrap();
        }
        let contents = std::fs::read_to_string(dir.path().join("transcript-r1.txt")).unwrap();
        assert_eq!(contents, "first session\nsecond session\n");
    }
}
