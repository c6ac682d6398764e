use crate::core::cache::CacheLayout;
use crate::core::sync::ManifestResolver;

/// Inputs shared by every installer.
#[derive(Clone, Copy)]
pub struct InstallContext<'a> {
    pub layout: &'a CacheLayout,
    pub resolver: &'a ManifestResolver,
    pub version_manifest_url: &'a str,
    /// Game version id, or `latest`/`latest-release`/`latest-snapshot`.
    pub game_version: &'a str,
    /// Loader version for loaders that have one; `None` picks the newest stable.
    pub loader_version: Option<&'a str>,
}
