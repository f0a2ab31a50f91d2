use std::fs;

use ledger_storage::SledLogSink;
use tempfile::{tempdir, TempDir};

pub fn create_temp_sink() -> (TempDir, SledLogSink) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("sink");
    (
        temp_dir,
        SledLogSink::open(&db_path).expect("Failed to open SledLogSink"),
    )
}

pub fn teardown(temp_dir: TempDir) {
    let dir_path = temp_dir.path().to_path_buf();
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&dir_path);
    // Verify the directory is removed
    assert!(!dir_path.exists(), "Temp directory should be removed");
}
