use async_trait::async_trait;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::LoaderType;
use crate::core::sync::DesiredState;

use super::{context::InstallContext, fabric::FabricInstaller, vanilla::VanillaInstaller};

/// What a bootstrap needs on disk before the variant can launch.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Resolved game version id (never `latest`).
    pub game_version: String,
    /// Id the launch reports as its version name.
    pub version_id: String,
    pub loader_version: Option<String>,
    pub main_class: String,
    /// First-stage artifacts: client jar, libraries, asset index document.
    pub desired: DesiredState,
    /// Key of the asset index document, read after the first stage lands.
    pub asset_index_key: Option<String>,
}

#[async_trait]
pub trait LoaderInstaller: Send + Sync {
    async fn plan(&self, ctx: InstallContext<'_>) -> LauncherResult<InstallPlan>;
}

/// Static dispatch over the supported installers.
pub enum Installer {
    Vanilla(VanillaInstaller),
    Fabric(FabricInstaller),
}

impl Installer {
    /// Forge content is published through the flat manifest, so it has no installer.
    pub fn new(loader: LoaderType) -> LauncherResult<Self> {
        match loader {
            LoaderType::Vanilla => Ok(Self::Vanilla(VanillaInstaller)),
            LoaderType::Fabric => Ok(Self::Fabric(FabricInstaller::new())),
            LoaderType::Forge => Err(LauncherError::Loader(
                "forge content is delivered by the flat sync, not bootstrapped".into(),
            )),
        }
    }

    pub async fn plan(&self, ctx: InstallContext<'_>) -> LauncherResult<InstallPlan> {
        match self {
            Installer::Vanilla(i) => i.plan(ctx).await,
            Installer::Fabric(i) => i.plan(ctx).await,
        }
    }
}
