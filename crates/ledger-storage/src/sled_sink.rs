use anyhow::{Context, Result};
use ledger_core::LogSink;
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::path::Path;
use tracing::info;

const TREE_RECORDS: &str = "records";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
  pub seq: u64,
  pub record: String,
}

/// Appends records to a sled tree keyed by a monotonically increasing
/// sequence number. The ledger only ever writes to it.
#[derive(Clone)]
pub struct SledLogSink {
  db: Db,
  records: Tree,
}

impl SledLogSink {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let db = sled::open(path).context("opening sled log sink")?;
    let records = db.open_tree(TREE_RECORDS)?;
    info!("sled log sink opened");
    Ok(Self { db, records })
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// All entries in append order.
  pub fn entries(&self) -> Result<Vec<LogEntry>> {
    self
      .records
      .iter()
      .values()
      .map(|v| -> Result<LogEntry> { Ok(bincode::deserialize(&v?)?) })
      .collect()
  }

  pub fn flush(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }
}

impl LogSink for SledLogSink {
  fn append(&self, record: &str) -> Result<()> {
    let seq = self.db.generate_id()?;
    let entry = LogEntry {
      seq,
      record: record.to_string(),
    };
    self
      .records
      .insert(seq.to_be_bytes(), bincode::serialize(&entry)?)?;
    self.db.flush()?;
    Ok(())
  }
}
