// ─── Sync Pass ───
// resolve -> observe -> diff -> sequential fetch. One pass at a time per
// cache root; a failure anywhere aborts the pass and is returned as is.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::artifact::DesiredState;
use super::diff::stale_artifacts;
use super::resolver::ManifestResolver;
use crate::core::assets::AssetIndex;
use crate::core::cache::{observe_async, CacheLayout};
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::LauncherObserver;
use crate::core::launch::LoaderType;
use crate::core::loaders::{InstallContext, Installer};
use crate::core::state::{AppState, LauncherSettings};

/// Outcome of one reconcile step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Artifacts the manifest listed.
    pub checked: usize,
    /// Keys that were stale and got fetched, in fetch order.
    pub fetched: Vec<String>,
    pub bytes: u64,
}

/// Outcome of a version-mode bootstrap: both stages plus what was resolved.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub game_version: String,
    pub version_id: String,
    pub loader_version: Option<String>,
    pub main_class: String,
    pub libraries: SyncReport,
    pub assets: SyncReport,
}

pub struct SyncSession {
    layout: CacheLayout,
    settings: LauncherSettings,
    resolver: ManifestResolver,
    downloader: Downloader,
}

impl SyncSession {
    pub fn new(app: &AppState, observer: Arc<dyn LauncherObserver>) -> Self {
        Self {
            layout: app.layout(),
            settings: app.settings.clone(),
            resolver: ManifestResolver::new(app.http_client.clone()),
            downloader: Downloader::new(app.http_client.clone(), observer),
        }
    }

    /// Stop the pass at the next chunk boundary once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.downloader = self.downloader.with_cancellation(cancel);
        self
    }

    pub fn resolver(&self) -> &ManifestResolver {
        &self.resolver
    }

    /// Observe, diff and fetch whatever in `desired` is missing or stale.
    pub async fn reconcile(&self, desired: &DesiredState) -> LauncherResult<SyncReport> {
        let observed = observe_async(self.layout.root().to_path_buf(), desired.probes()).await?;
        let stale = stale_artifacts(desired, &observed);
        info!("{} of {} artifacts need fetching", stale.len(), desired.len());

        let batch = self.downloader.fetch_batch(&stale).await?;
        Ok(SyncReport {
            checked: desired.len(),
            fetched: batch.fetched,
            bytes: batch.bytes,
        })
    }

    /// Flat mode: the list endpoint names every artifact and its MD5.
    pub async fn sync_flat(&self) -> LauncherResult<SyncReport> {
        let manifest = self.resolver.fetch_flat(&self.settings.list_endpoint).await?;
        let desired = manifest.desired_state(&self.layout, &self.settings.files_endpoint)?;
        self.reconcile(&desired).await
    }

    /// Version mode: client jar, libraries and asset index first, then the
    /// asset objects the freshly synced index lists.
    pub async fn bootstrap(
        &self,
        loader: LoaderType,
        game_version: &str,
        loader_version: Option<&str>,
    ) -> LauncherResult<BootstrapReport> {
        let installer = Installer::new(loader)?;
        let plan = installer
            .plan(InstallContext {
                layout: &self.layout,
                resolver: &self.resolver,
                version_manifest_url: &self.settings.version_manifest_url,
                game_version,
                loader_version,
            })
            .await?;

        info!("Bootstrapping {} ({})", plan.version_id, loader);
        let libraries = self.reconcile(&plan.desired).await?;

        let assets = match &plan.asset_index_key {
            Some(key) => {
                let path = self.layout.resolve(key)?;
                let raw = tokio::fs::read(&path)
                    .await
                    .map_err(|e| LauncherError::io(&path, e))?;
                let index = AssetIndex::parse(key, &raw)?;
                let desired = index.desired_state(&self.layout, &self.settings.resources_url)?;
                self.reconcile(&desired).await?
            }
            None => SyncReport::default(),
        };

        Ok(BootstrapReport {
            game_version: plan.game_version,
            version_id: plan.version_id,
            loader_version: plan.loader_version,
            main_class: plan.main_class,
            libraries,
            assets,
        })
    }
}
