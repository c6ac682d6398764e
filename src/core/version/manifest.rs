// ─── Version Manifest ───
// Index of every published game version (`latest` pointers + `versions[]`).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};

/// Top-level version index document.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the index.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(rename = "releaseTime", default)]
    pub release_time: Option<DateTime<Utc>>,
}

impl VersionManifest {
    /// Find a specific version entry by ID (e.g. "1.16.5").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Resolve `latest` / `latest-snapshot` aliases, then look the id up.
    pub fn resolve(&self, id: &str) -> LauncherResult<&VersionEntry> {
        let wanted = match id {
            "latest" | "latest-release" => self.latest.release.as_str(),
            "latest-snapshot" => self.latest.snapshot.as_str(),
            other => other,
        };
        self.find_version(wanted)
            .ok_or_else(|| LauncherError::VersionNotFound(wanted.to_string()))
    }

    /// Release entries, newest first.
    pub fn releases(&self) -> Vec<&VersionEntry> {
        let mut releases: Vec<&VersionEntry> = self
            .versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect();
        releases.sort_by(|a, b| b.release_time.cmp(&a.release_time));
        releases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VersionManifest {
        serde_json::from_value(serde_json::json!({
            "latest": {"release": "1.16.5", "snapshot": "21w03a"},
            "versions": [
                {
                    "id": "21w03a",
                    "type": "snapshot",
                    "url": "https://example.com/21w03a.json",
                    "time": "2021-01-20T14:15:38+00:00",
                    "releaseTime": "2021-01-20T14:12:32+00:00"
                },
                {
                    "id": "1.16.4",
                    "type": "release",
                    "url": "https://example.com/1.16.4.json",
                    "time": "2021-01-14T16:05:32+00:00",
                    "releaseTime": "2020-10-29T15:49:37+00:00"
                },
                {
                    "id": "1.16.5",
                    "type": "release",
                    "url": "https://example.com/1.16.5.json",
                    "time": "2021-01-14T16:05:32+00:00",
                    "releaseTime": "2021-01-14T16:05:32+00:00"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn latest_alias_resolves_to_the_latest_release() {
        let manifest = sample();
        assert_eq!(manifest.resolve("latest").unwrap().id, "1.16.5");
        assert_eq!(manifest.resolve("latest-snapshot").unwrap().id, "21w03a");
        assert_eq!(manifest.resolve("1.16.4").unwrap().id, "1.16.4");
    }

    #[test]
    fn unknown_version_is_reported() {
        let err = sample().resolve("0.0.1").unwrap_err();
        assert!(matches!(err, LauncherError::VersionNotFound(id) if id == "0.0.1"));
    }

    #[test]
    fn releases_are_sorted_newest_first() {
        let manifest = sample();
        let ids: Vec<&str> = manifest.releases().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1.16.5", "1.16.4"]);
    }
}
