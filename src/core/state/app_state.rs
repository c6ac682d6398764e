use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::cache::CacheLayout;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;

const DEFAULT_LAUNCHER_NAME: &str = "minecraft_launcher";
const LAUNCHER_NAME_ENV: &str = "LAUNCHER_NAME";
const SETTINGS_FILE: &str = "launcher_settings.json";

/// User-tunable settings persisted as `launcher_settings.json` in the cache root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Flat manifest endpoint: JSON object of relative path -> MD5 hex.
    pub list_endpoint: String,
    /// Artifact endpoint: POST `{"url": "<key>"}` streams the artifact back.
    pub files_endpoint: String,
    pub version_manifest_url: String,
    pub resources_url: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub min_memory: String,
    pub max_memory: String,
    pub java_path: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            list_endpoint: "http://85.193.85.49:3005/api/list".into(),
            files_endpoint: "http://85.193.85.49:3005/api/files".into(),
            version_manifest_url: "https://launchermeta.mojang.com/mc/game/version_manifest.json"
                .into(),
            resources_url: "https://resources.download.minecraft.net".into(),
            connect_timeout_secs: 15,
            read_timeout_secs: 60,
            min_memory: "512M".into(),
            max_memory: "4G".into(),
            java_path: None,
            window_width: 1280,
            window_height: 720,
        }
    }
}

/// Everything a sync or launch pass needs from the host: where the cache
/// lives, how it is configured, and the shared HTTP client.
pub struct AppState {
    pub cache_root: PathBuf,
    pub settings: LauncherSettings,
    pub http_client: Client,
}

impl AppState {
    /// Build state for `cache_root`, or the default root when `None`.
    pub fn new(cache_root: Option<PathBuf>) -> LauncherResult<Self> {
        let cache_root = match cache_root {
            Some(root) => root,
            None => default_cache_root()?,
        };
        let settings = load_settings_from_disk(&cache_root).unwrap_or_default();
        Self::with_settings(cache_root, settings)
    }

    pub fn with_settings(cache_root: PathBuf, settings: LauncherSettings) -> LauncherResult<Self> {
        let http_client = build_http_client(&settings).map_err(|source| {
            LauncherError::RemoteUnavailable {
                url: String::new(),
                source,
            }
        })?;

        debug!("Cache root: {:?}", cache_root);
        Ok(Self {
            cache_root,
            settings,
            http_client,
        })
    }

    pub fn layout(&self) -> CacheLayout {
        CacheLayout::new(&self.cache_root)
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.layout().libraries_dir()
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.layout().versions_dir()
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.layout().assets_dir()
    }

    pub fn save_settings(&self) -> LauncherResult<()> {
        std::fs::create_dir_all(&self.cache_root).map_err(|source| {
            LauncherError::DirectoryCreateFailed {
                path: self.cache_root.clone(),
                source,
            }
        })?;
        let settings_path = self.cache_root.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(&self.settings)?;
        std::fs::write(&settings_path, json).map_err(|e| LauncherError::io(settings_path, e))
    }
}

fn load_settings_from_disk(cache_root: &Path) -> Option<LauncherSettings> {
    let path = cache_root.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(err) => {
            warn!("Ignoring invalid settings file {:?}: {}", path, err);
            None
        }
    }
}

/// `<home>/<LAUNCHER_NAME>`, with `minecraft_launcher` as the fallback name.
pub fn default_cache_root() -> LauncherResult<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        LauncherError::io(
            PathBuf::from("~"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found"),
        )
    })?;
    Ok(home.join(launcher_name()))
}

fn launcher_name() -> String {
    std::env::var(LAUNCHER_NAME_ENV)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LAUNCHER_NAME.to_string())
}
