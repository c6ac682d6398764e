mod client;
mod progress;

pub use client::{BatchReport, Downloader};
pub use progress::{DownloadProgress, ProgressTracker};
