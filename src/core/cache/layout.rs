// ─── Cache Layout ───
// Maps artifact keys (forward-slash relative paths) onto the cache root.
//
//   libraries/<group-path>/<artifact>/<version>/<artifact>-<version>.jar
//   versions/<id>/<id>.jar
//   assets/indexes/<id>.json
//   assets/objects/<2-char-prefix>/<hash>

use std::path::{Component, Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn natives_dir(&self, version_id: &str) -> PathBuf {
        self.root.join("natives").join(version_id)
    }

    /// Absolute destination for a validated key.
    pub fn resolve(&self, key: &str) -> LauncherResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    pub fn version_jar_key(version_id: &str) -> String {
        format!("versions/{0}/{0}.jar", version_id)
    }

    pub fn version_json_key(version_id: &str) -> String {
        format!("versions/{0}/{0}.json", version_id)
    }

    pub fn library_key(relative_path: &str) -> String {
        format!("libraries/{}", relative_path.trim_start_matches('/'))
    }

    pub fn asset_index_key(index_id: &str) -> String {
        format!("assets/indexes/{}.json", index_id)
    }

    pub fn asset_object_key(hash: &str) -> String {
        format!("assets/objects/{}/{}", hash.get(..2).unwrap_or(hash), hash)
    }
}

/// Keys must stay inside the cache root: relative, no `..`, no `.`.
pub fn validate_key(key: &str) -> LauncherResult<()> {
    if key.trim().is_empty() || key.contains('\\') {
        return Err(LauncherError::InvalidArtifactKey(key.to_string()));
    }

    let all_normal = Path::new(key)
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if !all_normal {
        return Err(LauncherError::InvalidArtifactKey(key.to_string()));
    }

    Ok(())
}
