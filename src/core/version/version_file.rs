// ─── Version File ───
// Structured version document: downloads, libraries with OS rules, asset
// index pointer and argument templates.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::core::cache::{CacheLayout, HashAlgorithm};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;
use crate::core::sync::{Artifact, ArtifactSource, DesiredState};

/// A fully parsed version JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    /// Asset index id used by legacy documents that omit `assetIndex`.
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default, rename = "type")]
    pub version_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// Maven repository base for entries without `downloads` (loader profiles).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    #[serde(default)]
    pub natives: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
}

// ─── OS Rule Evaluation ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl LibraryEntry {
    /// Start disallowed; the last rule whose OS matches decides. No rules means allowed.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let Some(rules) = &self.rules else {
            return true;
        };

        let current_os = current_os_name();
        let mut allowed = false;

        for rule in rules {
            let os_matches = match rule.os.as_ref().and_then(|os| os.name.as_deref()) {
                None => true,
                Some(name) => name == current_os,
            };

            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }

        allowed
    }

    /// Classifier name of the native jar for this OS, with `${arch}` expanded.
    pub fn native_classifier_for_current_os(&self) -> Option<String> {
        let natives = self.natives.as_ref()?;
        let os = current_os_name();
        natives.as_object()?.get(os)?.as_str().map(|s| {
            let arch = if cfg!(target_pointer_width = "64") {
                "64"
            } else {
                "32"
            };
            s.replace("${arch}", arch)
        })
    }

    fn native_download(&self) -> Option<LibDownloadArtifact> {
        let classifier = self.native_classifier_for_current_os()?;
        let classifiers = self.downloads.as_ref()?.classifiers.as_ref()?;
        let raw = classifiers.get(&classifier)?.clone();
        serde_json::from_value(raw).ok()
    }

    /// Library artifacts for this OS: the main jar plus its native classifier, if any.
    fn artifacts(&self, layout: &CacheLayout) -> LauncherResult<Vec<Artifact>> {
        let mut out = Vec::new();

        if let Some(downloads) = &self.downloads {
            if let Some(main) = &downloads.artifact {
                out.push(library_artifact(layout, main)?);
            }
            if let Some(native) = self.native_download() {
                out.push(library_artifact(layout, &native)?);
            }
        } else if let Some(repo) = &self.url {
            let coordinate = MavenArtifact::parse(&self.name)?;
            let key = CacheLayout::library_key(&coordinate.relative_path());
            let source = ArtifactSource::Url(coordinate.url(repo));
            out.push(Artifact::new(key, layout.root(), source)?);
        } else {
            debug!("Library {} has no download location", self.name);
        }

        Ok(out)
    }

    /// Key of the jar that goes on the classpath.
    fn classpath_key(&self) -> LauncherResult<Option<String>> {
        if let Some(main) = self.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            return Ok(Some(CacheLayout::library_key(&main.path)));
        }
        if self.downloads.is_none() && self.url.is_some() {
            let coordinate = MavenArtifact::parse(&self.name)?;
            return Ok(Some(CacheLayout::library_key(&coordinate.relative_path())));
        }
        Ok(None)
    }
}

fn library_artifact(layout: &CacheLayout, download: &LibDownloadArtifact) -> LauncherResult<Artifact> {
    let key = CacheLayout::library_key(&download.path);
    let mut artifact = Artifact::new(key, layout.root(), ArtifactSource::Url(download.url.clone()))?;
    if let Some(sha1) = &download.sha1 {
        artifact = artifact.with_fingerprint(sha1.clone(), HashAlgorithm::Sha1);
    }
    if let Some(size) = download.size {
        artifact = artifact.with_size(size);
    }
    Ok(artifact)
}

/// Mojang OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

impl VersionJson {
    /// Artifacts for the first bootstrap stage: client jar, libraries allowed
    /// on this OS, and the asset index document.
    pub fn desired_state(&self, layout: &CacheLayout, version_id: &str) -> LauncherResult<DesiredState> {
        let mut desired = DesiredState::new();

        if let Some(client) = self.downloads.as_ref().and_then(|d| d.client.as_ref()) {
            let key = CacheLayout::version_jar_key(version_id);
            desired.insert(
                Artifact::new(key, layout.root(), ArtifactSource::Url(client.url.clone()))?
                    .with_fingerprint(client.sha1.clone(), HashAlgorithm::Sha1)
                    .with_size(client.size),
            );
        }

        let mut skipped = 0usize;
        for lib in &self.libraries {
            if !lib.is_allowed_for_current_os() {
                skipped += 1;
                continue;
            }
            for artifact in lib.artifacts(layout)? {
                desired.insert(artifact);
            }
        }
        if skipped > 0 {
            debug!("Skipped {} libraries by OS rule", skipped);
        }

        if let Some(index) = &self.asset_index {
            let key = CacheLayout::asset_index_key(&index.id);
            let mut artifact = Artifact::new(key, layout.root(), ArtifactSource::Url(index.url.clone()))?;
            if let Some(sha1) = &index.sha1 {
                artifact = artifact.with_fingerprint(sha1.clone(), HashAlgorithm::Sha1);
            }
            if let Some(size) = index.total_size {
                artifact = artifact.with_size(size);
            }
            desired.insert(artifact);
        }

        Ok(desired)
    }

    /// Read a persisted version document.
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = std::fs::read(path).map_err(|e| LauncherError::io(path, e))?;
        serde_json::from_slice(&raw)
            .map_err(|e| LauncherError::malformed(&path.to_string_lossy(), e))
    }

    /// Classpath keys of the libraries allowed on this OS, in document order.
    pub fn classpath_keys(&self) -> LauncherResult<Vec<String>> {
        let mut keys = Vec::new();
        for lib in self.libraries.iter().filter(|l| l.is_allowed_for_current_os()) {
            if let Some(key) = lib.classpath_key()? {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    /// Keys of native classifier jars that must be extracted before launch.
    pub fn native_keys(&self) -> Vec<String> {
        self.libraries
            .iter()
            .filter(|l| l.is_allowed_for_current_os())
            .filter_map(LibraryEntry::native_download)
            .map(|native| CacheLayout::library_key(&native.path))
            .collect()
    }

    /// Cache key of the asset index document this version downloads, if it lists one.
    /// Legacy documents that only name an `assets` id have nothing to fetch.
    pub fn asset_index_key(&self) -> Option<String> {
        self.asset_index
            .as_ref()
            .map(|index| CacheLayout::asset_index_key(&index.id))
    }

    /// Asset index id, falling back to the legacy `assets` field.
    pub fn asset_index_id(&self) -> Option<&str> {
        self.asset_index
            .as_ref()
            .map(|index| index.id.as_str())
            .or(self.assets.as_deref())
    }

    /// Game arguments with conditional entries filtered for this OS.
    pub fn simple_game_args(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) => args.game.iter().flat_map(extract_argument_values).collect(),
            None => match &self.minecraft_arguments {
                Some(s) => s.split_whitespace().map(str::to_string).collect(),
                None => vec![],
            },
        }
    }

    /// JVM arguments with conditional entries filtered for this OS.
    pub fn simple_jvm_args(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) => args.jvm.iter().flat_map(extract_argument_values).collect(),
            None => vec![],
        }
    }
}

fn extract_argument_values(value: &serde_json::Value) -> Vec<String> {
    if let Some(arg) = value.as_str() {
        return vec![arg.to_string()];
    }

    let Some(obj) = value.as_object() else {
        return vec![];
    };

    if let Some(rules) = obj.get("rules").and_then(|r| r.as_array()) {
        if !rules_allow_current_os(rules) {
            return vec![];
        }
    }

    match obj.get("value") {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => vec![],
    }
}

// Feature-gated rules (demo user, custom resolution) never match: no
// feature flags are enabled for a launch.
fn rules_allow_current_os(rules: &[serde_json::Value]) -> bool {
    let mut allowed = false;
    let current_os = current_os_name();

    for rule in rules {
        if rule.get("features").is_some() {
            return false;
        }

        let action = rule
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("disallow");

        let os_matches = match rule
            .get("os")
            .and_then(|os| os.get("name"))
            .and_then(|name| name.as_str())
        {
            None => true,
            Some(name) => name == current_os,
        };

        if os_matches {
            allowed = action == "allow";
        }
    }

    allowed
}
