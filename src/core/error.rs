use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the sync and launch pipeline.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── Network ─────────────────────────────────────────
    #[error("Remote unavailable at {url}: {source}")]
    RemoteUnavailable {
        url: String,
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Manifest ────────────────────────────────────────
    #[error("Malformed manifest from {url}: {reason}")]
    MalformedManifest { url: String, reason: String },

    #[error("Invalid artifact key: {0:?}")]
    InvalidArtifactKey(String),

    #[error("Version not found in manifest: {0}")]
    VersionNotFound(String),

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot create directory {path:?}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot walk library root {path:?}: {source}")]
    WalkError {
        path: PathBuf,
        source: walkdir::Error,
    },

    // ── Transfer ────────────────────────────────────────
    #[error("Transfer of {key} failed: {source}")]
    TransferFailed {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Transfer of {key} cancelled")]
    Cancelled { key: String },

    // ── Process ─────────────────────────────────────────
    #[error("Cannot spawn {program:?}: {source}")]
    SpawnFailed {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Game process exited with error (code {code:?})")]
    ExitedWithError { code: Option<i32> },

    // ── Loader ──────────────────────────────────────────
    #[error("Loader error: {0}")]
    Loader(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(url: &str, reason: impl std::fmt::Display) -> Self {
        LauncherError::MalformedManifest {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn transfer(
        key: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LauncherError::TransferFailed {
            key: key.to_string(),
            source: source.into(),
        }
    }
}

// ── Serialization for the GUI collaborator ──────────────
// The event surface only carries strings, so errors cross it as their message.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
