// ─── Flat Manifest ───
// `{ "<relative path>": "<md5 hex>", ... }` describing general asset sync.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, ArtifactSource, DesiredState};
use crate::core::cache::{validate_key, CacheLayout, HashAlgorithm};
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatManifest {
    entries: BTreeMap<String, String>,
}

impl FlatManifest {
    /// Decode and validate a flat manifest body fetched from `url`.
    pub fn parse(url: &str, raw: &[u8]) -> LauncherResult<Self> {
        let manifest: FlatManifest =
            serde_json::from_slice(raw).map_err(|e| LauncherError::malformed(url, e))?;

        for (key, fingerprint) in &manifest.entries {
            validate_key(key).map_err(|e| LauncherError::malformed(url, e))?;
            if fingerprint.trim().is_empty() {
                return Err(LauncherError::malformed(
                    url,
                    format!("empty fingerprint for {key}"),
                ));
            }
        }

        Ok(manifest)
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry becomes an MD5-fingerprinted artifact fetched from `files_endpoint`.
    pub fn desired_state(
        &self,
        layout: &CacheLayout,
        files_endpoint: &str,
    ) -> LauncherResult<DesiredState> {
        self.entries
            .iter()
            .map(|(key, fingerprint)| {
                let source = ArtifactSource::Endpoint {
                    endpoint: files_endpoint.to_string(),
                    key: key.clone(),
                };
                Artifact::new(key.clone(), layout.root(), source)
                    .map(|a| a.with_fingerprint(fingerprint.clone(), HashAlgorithm::Md5))
            })
            .collect()
    }
}
