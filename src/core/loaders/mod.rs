pub mod context;
pub mod fabric;
pub mod installer;
pub mod vanilla;

use std::path::PathBuf;

use crate::core::cache::CacheLayout;
use crate::core::error::{LauncherError, LauncherResult};

pub use context::InstallContext;
pub use installer::{InstallPlan, Installer, LoaderInstaller};

/// Write a fetched document byte-for-byte under the cache root.
pub(crate) async fn persist_document(layout: &CacheLayout, key: &str, raw: &[u8]) -> LauncherResult<PathBuf> {
    let path = layout.resolve(key)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| LauncherError::DirectoryCreateFailed {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(&path, raw)
        .await
        .map_err(|e| LauncherError::io(&path, e))?;
    Ok(path)
}
