use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::progress::ProgressTracker;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::LauncherObserver;
use crate::core::sync::{Artifact, ArtifactSource, BodyFile};

/// Outcome of one sequential batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Keys fetched, in fetch order.
    pub fetched: Vec<String>,
    pub bytes: u64,
}

/// Sequential streaming downloader.
///
/// One transfer is active at a time. Bodies are copied chunk by chunk as the
/// transport yields them, so memory use does not depend on artifact size.
pub struct Downloader {
    client: Client,
    observer: Arc<dyn LauncherObserver>,
    cancel: CancellationToken,
}

impl Downloader {
    pub fn new(client: Client, observer: Arc<dyn LauncherObserver>) -> Self {
        Self {
            client,
            observer,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    // ── Single artifact ─────────────────────────────────

    /// Stream `artifact` to its destination and return the number of bytes written.
    ///
    /// A failure mid-transfer leaves the partial file in place; its fingerprint
    /// will not match on the next pass, so it is fetched again.
    pub async fn fetch(&self, artifact: &Artifact) -> LauncherResult<u64> {
        ensure_parent_dir(&artifact.dest).await?;

        let url = artifact.source.display_url();
        let request = match &artifact.source {
            ArtifactSource::Endpoint { endpoint, key } => {
                self.client.post(endpoint).json(&BodyFile { url: key })
            }
            ArtifactSource::Url(url) => self.client.get(url),
        };

        let response = request
            .send()
            .await
            .map_err(|source| LauncherError::RemoteUnavailable {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        let mut tracker = ProgressTracker::new(&artifact.key, total);

        // Handle is scoped to this block so it is closed before returning.
        {
            let mut file = tokio::fs::File::create(&artifact.dest)
                .await
                .map_err(|e| LauncherError::io(&artifact.dest, e))?;

            let mut body = response.bytes_stream();
            loop {
                if self.cancel.is_cancelled() {
                    flush_partial(&mut file, &artifact.key).await;
                    return Err(LauncherError::Cancelled {
                        key: artifact.key.clone(),
                    });
                }

                let Some(chunk) = body.next().await else {
                    break;
                };
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        flush_partial(&mut file, &artifact.key).await;
                        return Err(LauncherError::transfer(&artifact.key, e));
                    }
                };
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::transfer(&artifact.key, e))?;

                self.observer.on_progress(&tracker.record(chunk.len()));
            }

            file.flush()
                .await
                .map_err(|e| LauncherError::transfer(&artifact.key, e))?;
        }

        let written = tracker.bytes_read();
        if let Some(expected) = total.filter(|&t| t != written) {
            warn!(
                "{}: received {} bytes, content-length was {}",
                artifact.key, written, expected
            );
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, artifact.dest, written);
        Ok(written)
    }

    // ── Sequential batch ────────────────────────────────

    /// Fetch artifacts one at a time in the given order.
    ///
    /// Emits the batch size, then a 1-based "now fetching" notice before each
    /// file. The first failure aborts the rest of the batch.
    pub async fn fetch_batch(&self, artifacts: &[&Artifact]) -> LauncherResult<BatchReport> {
        let total = artifacts.len();
        self.observer.on_total(total);
        info!("Starting batch download: {} files", total);

        let mut report = BatchReport::default();
        for (index, artifact) in artifacts.iter().enumerate() {
            self.observer.on_file_started(artifact.file_name(), index + 1);

            let bytes = self.fetch(artifact).await.inspect_err(|e| {
                warn!("Batch aborted at {} ({}/{}): {}", artifact.key, index + 1, total, e);
            })?;

            report.bytes += bytes;
            report.fetched.push(artifact.key.clone());
        }

        Ok(report)
    }
}

/// Push what was received to disk so the partial file is complete up to the failure.
async fn flush_partial(file: &mut tokio::fs::File, key: &str) {
    if let Err(e) = file.flush().await {
        warn!("Flushing partial {} failed: {}", key, e);
    }
}

async fn ensure_parent_dir(dest: &Path) -> LauncherResult<()> {
    let Some(parent) = dest.parent() else {
        return Ok(());
    };
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| LauncherError::DirectoryCreateFailed {
            path: parent.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{ChannelObserver, LauncherEvent, NoopObserver};
    use mockito::Matcher;

    fn downloader(observer: Arc<dyn LauncherObserver>) -> Downloader {
        Downloader::new(Client::new(), observer)
    }

    #[tokio::test]
    async fn posts_the_key_and_streams_into_a_new_parent_directory() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![7u8; 1_000_000];
        let mock = server
            .mock("POST", "/api/files")
            .match_body(Matcher::Json(serde_json::json!({"url": "mods/deep/b.jar"})))
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(
            "mods/deep/b.jar",
            dir.path(),
            ArtifactSource::Endpoint {
                endpoint: format!("{}/api/files", server.url()),
                key: "mods/deep/b.jar".into(),
            },
        )
        .unwrap();

        let written = downloader(Arc::new(NoopObserver)).fetch(&artifact).await.unwrap();

        mock.assert_async().await;
        assert_eq!(written, 1_000_000);
        assert_eq!(std::fs::metadata(&artifact.dest).unwrap().len(), 1_000_000);
    }

    #[tokio::test]
    async fn non_success_status_is_a_download_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.jar")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(
            "missing.jar",
            dir.path(),
            ArtifactSource::Url(format!("{}/missing.jar", server.url())),
        )
        .unwrap();

        let err = downloader(Arc::new(NoopObserver)).fetch(&artifact).await.unwrap_err();
        assert!(matches!(err, LauncherError::DownloadFailed { status: 404, .. }));
    }

    #[tokio::test]
    async fn progress_ends_at_the_declared_total() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/a.jar")
            .with_body(vec![1u8; 4096])
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(
            "a.jar",
            dir.path(),
            ArtifactSource::Url(format!("{}/a.jar", server.url())),
        )
        .unwrap();

        let (observer, mut rx) = ChannelObserver::new();
        downloader(Arc::new(observer)).fetch(&artifact).await.unwrap();

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            if let LauncherEvent::Progress(p) = event {
                last = Some(p);
            }
        }
        let last = last.expect("at least one progress event");
        assert_eq!(last.read, 4096);
        assert_eq!(last.total, Some(4096));
        assert_eq!(last.percent, Some(100.0));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_the_first_chunk() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/a.jar")
            .with_body(vec![1u8; 64])
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(
            "a.jar",
            dir.path(),
            ArtifactSource::Url(format!("{}/a.jar", server.url())),
        )
        .unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let err = downloader(Arc::new(NoopObserver))
            .with_cancellation(token)
            .fetch(&artifact)
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::Cancelled { key } if key == "a.jar"));
    }

    #[tokio::test]
    async fn batch_aborts_on_the_first_failure() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/a.jar").with_status(500).create_async().await;
        let never = server
            .mock("GET", "/b.jar")
            .with_body("b")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let a = Artifact::new("a.jar", dir.path(), ArtifactSource::Url(format!("{}/a.jar", server.url()))).unwrap();
        let b = Artifact::new("b.jar", dir.path(), ArtifactSource::Url(format!("{}/b.jar", server.url()))).unwrap();

        let (observer, mut rx) = ChannelObserver::new();
        let result = downloader(Arc::new(observer)).fetch_batch(&[&a, &b]).await;

        assert!(result.is_err());
        never.assert_async().await;
        assert_eq!(rx.recv().await, Some(LauncherEvent::TotalFile(2)));
        assert_eq!(
            rx.recv().await,
            Some(LauncherEvent::NumberFile {
                file: "a.jar".into(),
                number: 1
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropped_connection_leaves_the_partial_file() {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n0123456789")
                .await
                .unwrap();
            socket.flush().await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(
            "x/a.jar",
            dir.path(),
            ArtifactSource::Url(format!("http://{addr}/a.jar")),
        )
        .unwrap();

        let err = downloader(Arc::new(NoopObserver)).fetch(&artifact).await.unwrap_err();

        assert!(matches!(err, LauncherError::TransferFailed { ref key, .. } if key == "x/a.jar"));
        assert_eq!(std::fs::metadata(&artifact.dest).unwrap().len(), 10);
    }

    #[tokio::test]
    async fn file_in_place_of_a_parent_dir_fails_directory_creation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), b"not a dir").unwrap();
        let artifact = Artifact::new(
            "file.txt/a.jar",
            dir.path(),
            ArtifactSource::Url("http://127.0.0.1:9/a.jar".into()),
        )
        .unwrap();

        let err = downloader(Arc::new(NoopObserver)).fetch(&artifact).await.unwrap_err();

        assert!(matches!(
            err,
            LauncherError::DirectoryCreateFailed { ref path, .. } if *path == dir.path().join("file.txt")
        ));
    }
}
