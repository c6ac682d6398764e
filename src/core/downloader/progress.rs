// ─── Download Progress ───
// Per-chunk progress values with throughput throttled to once per second.

use std::time::{Duration, Instant};

use serde::Serialize;

const THROUGHPUT_WINDOW: Duration = Duration::from_secs(1);

/// Progress of one artifact transfer. Emitted after every chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadProgress {
    pub key: String,
    pub bytes_read: u64,
    /// `None` when the remote did not declare a content length.
    pub total_bytes: Option<u64>,
    /// Bytes per second since the previous throughput sample. Present at most
    /// once per elapsed second.
    pub speed: Option<f64>,
}

impl DownloadProgress {
    /// Percentage with two decimals, or `None` when the total is unknown.
    pub fn percent(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                let raw = self.bytes_read as f64 / total as f64 * 100.0;
                Some((raw * 100.0).round() / 100.0)
            }
            Some(_) => Some(100.0),
            None => None,
        }
    }
}

/// Accumulates transferred bytes for one artifact.
pub struct ProgressTracker {
    key: String,
    total: Option<u64>,
    read: u64,
    window_start: Instant,
    window_bytes: u64,
}

impl ProgressTracker {
    pub fn new(key: &str, total: Option<u64>) -> Self {
        Self::starting_at(key, total, Instant::now())
    }

    fn starting_at(key: &str, total: Option<u64>, now: Instant) -> Self {
        Self {
            key: key.to_string(),
            total,
            read: 0,
            window_start: now,
            window_bytes: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    pub fn record(&mut self, chunk_len: usize) -> DownloadProgress {
        self.record_at(chunk_len, Instant::now())
    }

    fn record_at(&mut self, chunk_len: usize, now: Instant) -> DownloadProgress {
        self.read += chunk_len as u64;
        self.window_bytes += chunk_len as u64;

        let elapsed = now.saturating_duration_since(self.window_start);
        let speed = if elapsed >= THROUGHPUT_WINDOW {
            let speed = self.window_bytes as f64 / elapsed.as_secs_f64();
            self.window_start = now;
            self.window_bytes = 0;
            Some(speed)
        } else {
            None
        };

        DownloadProgress {
            key: self.key.clone(),
            bytes_read: self.read,
            total_bytes: self.total,
            speed,
        }
    }
}
