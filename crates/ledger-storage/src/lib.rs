pub mod file_sink;
pub mod sled_sink;

pub use file_sink::FileLogSink;
pub use sled_sink::{LogEntry, SledLogSink};

/// Flat file the ledger appends to when no path is given.
pub const DEFAULT_LOG_FILE: &str = "data.txt";
