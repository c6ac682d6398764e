// ─── Local State Scanner ───
// Observes which keys exist under the cache root and what they hash to.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::hasher::{fingerprint, HashAlgorithm};
use crate::core::error::{LauncherError, LauncherResult};

/// One file observed on disk. `fingerprint` is `None` for presence-only probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub key: String,
    pub fingerprint: Option<String>,
}

/// What to look for: a key and, when content matters, the digest to compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub key: String,
    pub algorithm: Option<HashAlgorithm>,
}

impl Probe {
    pub fn hashed(key: impl Into<String>, algorithm: HashAlgorithm) -> Self {
        Self {
            key: key.into(),
            algorithm: Some(algorithm),
        }
    }

    pub fn presence(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            algorithm: None,
        }
    }
}

/// Observed cache contents for one sync pass. Keys with no entry are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedState {
    entries: BTreeMap<String, LocalEntry>,
}

impl ObservedState {
    pub fn get(&self, key: &str) -> Option<&LocalEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn fingerprint(&self, key: &str) -> Option<&str> {
        self.entries.get(key)?.fingerprint.as_deref()
    }

    pub fn insert(&mut self, entry: LocalEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for ObservedState {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut state = ObservedState::default();
        for (key, fingerprint) in iter {
            state.insert(LocalEntry {
                key,
                fingerprint: Some(fingerprint),
            });
        }
        state
    }
}

/// Probe `root/<key>` for every candidate, re-reading from disk each call.
///
/// Missing files (including missing parent directories) are absent. A file
/// that exists but cannot be fully read is also reported absent, so it gets
/// fetched again instead of failing the pass.
pub fn observe<I>(root: &Path, probes: I) -> ObservedState
where
    I: IntoIterator<Item = Probe>,
{
    let mut state = ObservedState::default();

    for probe in probes {
        let path = root.join(&probe.key);
        if !path.is_file() {
            continue;
        }

        let fingerprint = match probe.algorithm {
            None => None,
            Some(algorithm) => match fingerprint(&path, algorithm) {
                Ok(digest) => Some(digest),
                Err(err) => {
                    warn!("Treating unreadable {} as absent: {}", probe.key, err);
                    continue;
                }
            },
        };

        state.insert(LocalEntry {
            key: probe.key,
            fingerprint,
        });
    }

    debug!("Observed {} local entries under {:?}", state.len(), root);
    state
}

/// Run [`observe`] on the blocking pool.
pub async fn observe_async(root: PathBuf, probes: Vec<Probe>) -> LauncherResult<ObservedState> {
    let join_root = root.clone();
    tokio::task::spawn_blocking(move || observe(&root, probes))
        .await
        .map_err(|e| LauncherError::io(join_root, std::io::Error::other(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_and_missing_parents_are_not_errors() {
        let temp = tempfile::tempdir().unwrap();
        let state = observe(
            temp.path(),
            vec![
                Probe::hashed("a.jar", HashAlgorithm::Md5),
                Probe::hashed("deep/missing/dir/b.jar", HashAlgorithm::Md5),
            ],
        );
        assert!(state.is_empty());
    }

    #[test]
    fn present_keys_report_their_fingerprint() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("mods")).unwrap();
        std::fs::write(temp.path().join("mods/a.jar"), b"hello world").unwrap();

        let state = observe(temp.path(), vec![Probe::hashed("mods/a.jar", HashAlgorithm::Md5)]);

        assert_eq!(
            state.fingerprint("mods/a.jar"),
            Some("5eb63bbbe01eeed093cb22bb8f5acdc3")
        );
    }

    #[test]
    fn presence_probes_skip_hashing() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("lib.jar"), b"x").unwrap();

        let state = observe(temp.path(), vec![Probe::presence("lib.jar")]);

        assert!(state.contains("lib.jar"));
        assert_eq!(state.fingerprint("lib.jar"), None);
    }

    #[test]
    fn directories_named_like_keys_are_absent() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("a.jar")).unwrap();

        let state = observe(temp.path(), vec![Probe::hashed("a.jar", HashAlgorithm::Md5)]);
        assert!(!state.contains("a.jar"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn present_but_unreadable_files_are_absent() {
        let temp = tempfile::tempdir().unwrap();
        // A regular file for metadata purposes whose reads fail with EIO.
        std::os::unix::fs::symlink("/proc/self/mem", temp.path().join("a.jar")).unwrap();
        std::fs::write(temp.path().join("b.jar"), b"b").unwrap();

        let state = observe(
            temp.path(),
            vec![
                Probe::hashed("a.jar", HashAlgorithm::Md5),
                Probe::hashed("b.jar", HashAlgorithm::Md5),
            ],
        );

        assert!(temp.path().join("a.jar").is_file());
        assert!(!state.contains("a.jar"));
        assert!(state.contains("b.jar"));
    }

    #[test]
    fn every_call_rereads_the_disk() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("a.jar");
        std::fs::write(&path, b"one").unwrap();
        let first = observe(temp.path(), vec![Probe::hashed("a.jar", HashAlgorithm::Md5)]);

        std::fs::write(&path, b"two").unwrap();
        let second = observe(temp.path(), vec![Probe::hashed("a.jar", HashAlgorithm::Md5)]);

        assert_ne!(first.fingerprint("a.jar"), second.fingerprint("a.jar"));
    }
}
