use anyhow::{Context, Result};
use ledger_core::LogSink;
use std::{
  fs::OpenOptions,
  io::Write,
  path::{Path, PathBuf},
  sync::Mutex,
};
use tracing::debug;

/// Appends one line per record to a flat text file.
#[derive(Debug)]
pub struct FileLogSink {
  path: PathBuf,
  // serialises appends from concurrent callers
  lock: Mutex<()>,
}

impl FileLogSink {
  pub fn new<P: AsRef<Path>>(path: P) -> Self {
    Self {
      path: path.as_ref().to_path_buf(),
      lock: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl LogSink for FileLogSink {
  fn append(&self, record: &str) -> Result<()> {
    let _guard = self
      .lock
      .lock()
      .map_err(|_| anyhow::anyhow!("file sink lock poisoned"))?;
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .with_context(|| format!("opening {}", self.path.display()))?;
    writeln!(file, "{record}").with_context(|| format!("appending to {}", self.path.display()))?;
    debug!(path = %self.path.display(), "Data is appended to file successfully.");
    Ok(())
  }
}
