//! Progress computation for a streaming download.
//!
//! With a known total the percentage follows the byte count but stays below
//! 100 until the payload is assembled and saved. Without a total it advances
//! one step per chunk up to a cap, so the indicator keeps moving.

/// Highest percentage reported while bytes are still streaming (known total).
pub const DETERMINATE_CAP: f64 = 99.9;
/// Highest percentage reported while streaming without a known total.
pub const INDETERMINATE_CAP: f64 = 95.0;
/// Increment per chunk without a known total.
pub const INDETERMINATE_STEP: f64 = 1.0;
/// Reported once the payload is persisted.
pub const COMPLETE: f64 = 100.0;

/// Snapshot sent to the caller after each received chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub percent: f64,
    pub bytes_received: u64,
    pub total_bytes: Option<u64>,
}

/// Monotonic progress state for one download.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: Option<u64>,
    received: u64,
    percent: f64,
}

impl ProgressTracker {
    /// `total` of `Some(0)` is treated as unknown.
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|&t| t > 0),
            received: 0,
            percent: 0.0,
        }
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total
    }

    pub fn bytes_received(&self) -> u64 {
        self.received
    }

    /// Records a chunk of `len` bytes and returns the updated snapshot.
    pub fn on_chunk(&mut self, len: usize) -> ProgressUpdate {
        self.received = self.received.saturating_add(len as u64);
        let next = match self.total {
            Some(total) => (self.received as f64 * 100.0 / total as f64).min(DETERMINATE_CAP),
            None => (self.percent + INDETERMINATE_STEP).min(INDETERMINATE_CAP),
        };
        self.percent = self.percent.max(next);
        self.snapshot()
    }

    /// Marks the download as fully persisted.
    pub fn complete(&mut self) -> ProgressUpdate {
        self.percent = COMPLETE;
        self.snapshot()
    }

    fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            percent: self.percent,
            bytes_received: self.received,
            total_bytes: self.total,
        }
    }
}
