use anyhow::{anyhow, Result};
use std::sync::Mutex;

/// Write-only destination for block header records. The ledger never reads
/// anything back from a sink.
pub trait LogSink: Send + Sync {
    fn append(&self, record: &str) -> Result<()>;
}

/// Discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn append(&self, _record: &str) -> Result<()> {
        Ok(())
    }
}

/// Keeps records in memory, in append order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn append(&self, record: &str) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?
            .push(record.to_string());
        Ok(())
    }
}
