// ─── Events ───
// Observer capability through which sync and launch passes report outward.
// The GUI collaborator implements `LauncherObserver`; the core never depends
// on a UI transport.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::downloader::DownloadProgress;
use crate::core::launch::LaunchState;

/// Wire shape of the event surface (`totalFile`, `numberFile`, `progress`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum LauncherEvent {
    TotalFile(usize),
    NumberFile { file: String, number: usize },
    Progress(ProgressPayload),
    Launch(LaunchState),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPayload {
    pub file: String,
    pub percent: Option<f64>,
    pub read: u64,
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl From<&DownloadProgress> for ProgressPayload {
    fn from(progress: &DownloadProgress) -> Self {
        Self {
            file: progress.key.clone(),
            percent: progress.percent(),
            read: progress.bytes_read,
            total: progress.total_bytes,
            speed: progress.speed,
        }
    }
}

/// Receives one-way notifications. Implementations must not block: the
/// transfer loop calls these inline between chunks.
pub trait LauncherObserver: Send + Sync {
    /// Number of files the current batch will fetch.
    fn on_total(&self, _count: usize) {}

    /// A file is about to be fetched; `number` is 1-based within the batch.
    fn on_file_started(&self, _file: &str, _number: usize) {}

    fn on_progress(&self, _progress: &DownloadProgress) {}

    fn on_launch_state(&self, _state: &LaunchState) {}
}

/// Discards every event.
pub struct NoopObserver;

impl LauncherObserver for NoopObserver {}

/// Forwards events into an unbounded channel, so sending never waits on the consumer.
#[derive(Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<LauncherEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LauncherEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: LauncherEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.tx.send(event);
    }
}

impl LauncherObserver for ChannelObserver {
    fn on_total(&self, count: usize) {
        self.send(LauncherEvent::TotalFile(count));
    }

    fn on_file_started(&self, file: &str, number: usize) {
        self.send(LauncherEvent::NumberFile {
            file: file.to_string(),
            number,
        });
    }

    fn on_progress(&self, progress: &DownloadProgress) {
        self.send(LauncherEvent::Progress(progress.into()));
    }

    fn on_launch_state(&self, state: &LaunchState) {
        self.send(LauncherEvent::Launch(state.clone()));
    }
}

/// Renders events as log lines; used by the CLI.
pub struct TracingObserver;

impl LauncherObserver for TracingObserver {
    fn on_total(&self, count: usize) {
        info!("{} file(s) to download", count);
    }

    fn on_file_started(&self, file: &str, number: usize) {
        info!("Downloading #{}: {}", number, file);
    }

    fn on_progress(&self, progress: &DownloadProgress) {
        // Only sampled events carry a speed, which keeps the log readable.
        let Some(speed) = progress.speed else {
            return;
        };
        const MB: f64 = 1024.0 * 1024.0;
        let read_mb = progress.bytes_read as f64 / MB;
        match (progress.percent(), progress.total_bytes) {
            (Some(percent), Some(total)) => info!(
                "{}: {:.2}% ({:.2} MB of {:.2} MB) at {:.2} MB/s",
                progress.key,
                percent,
                read_mb,
                total as f64 / MB,
                speed / MB
            ),
            _ => info!("{}: {:.2} MB at {:.2} MB/s", progress.key, read_mb, speed / MB),
        }
    }

    fn on_launch_state(&self, state: &LaunchState) {
        match state {
            LaunchState::ExitedWithError { .. } | LaunchState::SpawnFailed { .. } => {
                warn!("Launch state: {:?}", state)
            }
            _ => debug!("Launch state: {:?}", state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_wire_names_match_the_gui_surface() {
        let total = serde_json::to_value(LauncherEvent::TotalFile(1)).unwrap();
        assert_eq!(total, serde_json::json!({"event": "totalFile", "payload": 1}));

        let number = serde_json::to_value(LauncherEvent::NumberFile {
            file: "b.jar".into(),
            number: 1,
        })
        .unwrap();
        assert_eq!(
            number,
            serde_json::json!({"event": "numberFile", "payload": {"file": "b.jar", "number": 1}})
        );
    }

    #[test]
    fn progress_payload_omits_missing_speed() {
        let progress = DownloadProgress {
            key: "a.jar".into(),
            bytes_read: 50,
            total_bytes: Some(100),
            speed: None,
        };
        let value = serde_json::to_value(LauncherEvent::Progress((&progress).into())).unwrap();
        assert_eq!(value["payload"]["percent"], 50.0);
        assert!(value["payload"].get("speed").is_none());
    }

    #[tokio::test]
    async fn channel_observer_preserves_emission_order() {
        let (observer, mut rx) = ChannelObserver::new();
        observer.on_total(2);
        observer.on_file_started("a.jar", 1);

        assert_eq!(rx.recv().await, Some(LauncherEvent::TotalFile(2)));
        assert_eq!(
            rx.recv().await,
            Some(LauncherEvent::NumberFile {
                file: "a.jar".into(),
                number: 1
            })
        );
    }

    #[test]
    fn channel_observer_ignores_a_closed_receiver() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.on_total(3);
    }
}
