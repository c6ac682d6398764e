// ─── Manifest Resolver ───
// One network read per call, decoded into the schema of the sync mode.
// No internal retries; callers decide retry policy.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::flat::FlatManifest;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{VersionJson, VersionManifest};

#[derive(Clone)]
pub struct ManifestResolver {
    client: Client,
}

impl ManifestResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Raw body of a successful GET.
    pub async fn fetch_bytes(&self, url: &str) -> LauncherResult<Vec<u8>> {
        let remote = |source: reqwest::Error| LauncherError::RemoteUnavailable {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(remote)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(remote)?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }

    /// Fetch and decode a JSON document, returning the raw body alongside.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> LauncherResult<(T, Vec<u8>)> {
        let raw = self.fetch_bytes(url).await?;
        let value = serde_json::from_slice(&raw).map_err(|e| LauncherError::malformed(url, e))?;
        Ok((value, raw))
    }

    /// Flat mode: relative path -> MD5 hex.
    pub async fn fetch_flat(&self, url: &str) -> LauncherResult<FlatManifest> {
        let raw = self.fetch_bytes(url).await?;
        let manifest = FlatManifest::parse(url, &raw)?;
        info!("Flat manifest lists {} artifacts", manifest.len());
        Ok(manifest)
    }

    pub async fn fetch_version_index(&self, url: &str) -> LauncherResult<VersionManifest> {
        let (manifest, _): (VersionManifest, _) = self.fetch_json(url).await?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Version detail document plus its raw bytes, which are persisted as-is.
    pub async fn fetch_version(&self, url: &str) -> LauncherResult<(VersionJson, Vec<u8>)> {
        self.fetch_json(url).await
    }
}
