use async_trait::async_trait;
use tracing::info;

use crate::core::cache::CacheLayout;
use crate::core::error::LauncherResult;

use super::context::InstallContext;
use super::installer::{InstallPlan, LoaderInstaller};
use super::persist_document;

/// Resolves a game version from the version index, persists its detail
/// document, and lists the client jar, libraries and asset index.
pub struct VanillaInstaller;

#[async_trait]
impl LoaderInstaller for VanillaInstaller {
    async fn plan(&self, ctx: InstallContext<'_>) -> LauncherResult<InstallPlan> {
        let index = ctx.resolver.fetch_version_index(ctx.version_manifest_url).await?;
        let entry = index.resolve(ctx.game_version)?;
        info!("Planning vanilla {} ({})", entry.id, entry.version_type);

        let (doc, raw) = ctx.resolver.fetch_version(&entry.url).await?;
        let version_id = doc.id.clone().unwrap_or_else(|| entry.id.clone());
        persist_document(ctx.layout, &CacheLayout::version_json_key(&entry.id), &raw).await?;

        let desired = doc.desired_state(ctx.layout, &entry.id)?;
        info!("Version {} lists {} artifacts", version_id, desired.len());

        Ok(InstallPlan {
            game_version: entry.id.clone(),
            version_id,
            loader_version: None,
            main_class: doc.main_class.clone(),
            desired,
            asset_index_key: doc.asset_index_key(),
        })
    }
}
