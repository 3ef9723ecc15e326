use crate::error::ScrubError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One observational report per committed window: the window's lower bound
/// and the number of rows its update touched. Emitted after the checkpoint
/// and never read back by the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub window_lower_bound: i64,
    pub rows_affected: u64,
}

/// Advisory sink for per-window progress, in the spirit of an operator log.
pub trait ProgressHook: Send + Sync {
    fn on_window(&self, record: &ProgressRecord);
}

/// Collects records in memory, for tests and for tooling that polls instead
/// of streaming.
#[derive(Debug, Default)]
pub struct MemoryProgress {
    records: Mutex<Vec<ProgressRecord>>,
}

impl MemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<ProgressRecord> {
        self.records.lock().clone()
    }
}

impl ProgressHook for MemoryProgress {
    fn on_window(&self, record: &ProgressRecord) {
        self.records.lock().push(*record);
    }
}

pub fn encode_record(record: &ProgressRecord) -> Result<Vec<u8>, ScrubError> {
    serde_json::to_vec(record).map_err(|e| ScrubError::Encode(e.to_string()))
}

pub fn decode_record(bytes: &[u8]) -> Result<ProgressRecord, ScrubError> {
    serde_json::from_slice(bytes).map_err(|e| ScrubError::Decode(e.to_string()))
}
