// ─── Artifacts ───
// Desired-state model shared by flat and version-manifest sync modes.

use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::core::cache::{validate_key, HashAlgorithm, Probe};
use crate::core::error::LauncherResult;

/// Where the bytes of an artifact come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// POST `{"url": "<key>"}` to the artifact endpoint.
    Endpoint { endpoint: String, key: String },
    /// Plain GET.
    Url(String),
}

impl ArtifactSource {
    pub fn display_url(&self) -> &str {
        match self {
            ArtifactSource::Endpoint { endpoint, .. } => endpoint,
            ArtifactSource::Url(url) => url,
        }
    }
}

/// Request body accepted by the artifact endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct BodyFile<'a> {
    pub url: &'a str,
}

/// A single addressable file. Immutable for the duration of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub key: String,
    /// Expected digest; `None` means presence is enough.
    pub fingerprint: Option<String>,
    pub algorithm: HashAlgorithm,
    pub size: Option<u64>,
    pub source: ArtifactSource,
    pub dest: PathBuf,
}

impl Artifact {
    pub fn new(key: impl Into<String>, root: &Path, source: ArtifactSource) -> LauncherResult<Self> {
        let key = key.into();
        validate_key(&key)?;
        let dest = root.join(&key);
        Ok(Self {
            key,
            fingerprint: None,
            algorithm: HashAlgorithm::default(),
            size: None,
            source,
            dest,
        })
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>, algorithm: HashAlgorithm) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self.algorithm = algorithm;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn probe(&self) -> Probe {
        match self.fingerprint {
            Some(_) => Probe::hashed(self.key.clone(), self.algorithm),
            None => Probe::presence(self.key.clone()),
        }
    }

    /// Last path segment of the key, shown to observers.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Desired artifacts keyed by artifact key. Iteration is in key order, which
/// keeps diff results and progress numbering stable for a given manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    artifacts: BTreeMap<String, Artifact>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact. The first entry for a key wins.
    pub fn insert(&mut self, artifact: Artifact) {
        match self.artifacts.entry(artifact.key.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(artifact);
            }
            btree_map::Entry::Occupied(_) => {
                debug!("Duplicate artifact key ignored: {}", artifact.key);
            }
        }
    }

    pub fn extend(&mut self, other: DesiredState) {
        for artifact in other.artifacts.into_values() {
            self.insert(artifact);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Artifact> {
        self.artifacts.get(key)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn probes(&self) -> Vec<Probe> {
        self.iter().map(Artifact::probe).collect()
    }
}

impl FromIterator<Artifact> for DesiredState {
    fn from_iter<T: IntoIterator<Item = Artifact>>(iter: T) -> Self {
        let mut state = DesiredState::new();
        for artifact in iter {
            state.insert(artifact);
        }
        state
    }
}
