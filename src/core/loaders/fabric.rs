use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::context::InstallContext;
use super::installer::{InstallPlan, LoaderInstaller};
use super::persist_document;
use super::vanilla::VanillaInstaller;
use crate::core::cache::CacheLayout;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::{MavenArtifact, FABRIC_MAVEN};
use crate::core::sync::{Artifact, ArtifactSource};

const FABRIC_META_BASE: &str = "https://meta.fabricmc.net/v2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricProfile {
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<FabricLibrary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FabricLibrary {
    pub name: String,
    pub url: Option<String>,
}

/// One row of `/versions/loader/<mc>`, newest first.
#[derive(Debug, Deserialize)]
struct LoaderListing {
    loader: LoaderVersion,
}

#[derive(Debug, Deserialize)]
struct LoaderVersion {
    version: String,
    #[serde(default)]
    stable: bool,
}

pub fn version_id(loader_version: &str, game_version: &str) -> String {
    format!("fabric-loader-{}-{}", loader_version, game_version)
}

/// Vanilla plan plus the fabric loader profile and its maven libraries.
pub struct FabricInstaller {
    meta_base: String,
}

impl Default for FabricInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl FabricInstaller {
    pub fn new() -> Self {
        Self {
            meta_base: FABRIC_META_BASE.into(),
        }
    }

    pub fn with_meta_base(mut self, meta_base: impl Into<String>) -> Self {
        self.meta_base = meta_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Newest stable loader for `game_version`, or the newest one if none is stable.
    async fn newest_loader(&self, ctx: &InstallContext<'_>, game_version: &str) -> LauncherResult<String> {
        let url = format!("{}/versions/loader/{}", self.meta_base, game_version);
        let (listing, _): (Vec<LoaderListing>, _) = ctx.resolver.fetch_json(&url).await?;

        let pick = listing
            .iter()
            .find(|row| row.loader.stable)
            .or_else(|| listing.first())
            .ok_or_else(|| LauncherError::Loader(format!("no fabric loader for {}", game_version)))?;
        if !pick.loader.stable {
            warn!("No stable fabric loader for {}, using {}", game_version, pick.loader.version);
        }
        Ok(pick.loader.version.clone())
    }

    fn ensure_loader_artifact(libraries: &mut Vec<FabricLibrary>, loader_version: &str) {
        let loader_coord = format!("net.fabricmc:fabric-loader:{}", loader_version);
        if libraries.iter().any(|lib| lib.name == loader_coord) {
            return;
        }
        libraries.push(FabricLibrary {
            name: loader_coord,
            url: Some(FABRIC_MAVEN.into()),
        });
    }
}

#[async_trait]
impl LoaderInstaller for FabricInstaller {
    async fn plan(&self, ctx: InstallContext<'_>) -> LauncherResult<InstallPlan> {
        let mut plan = VanillaInstaller.plan(ctx).await?;
        let game_version = plan.game_version.clone();

        let loader_version = match ctx.loader_version {
            Some(version) => version.to_string(),
            None => self.newest_loader(&ctx, &game_version).await?,
        };
        info!("Planning fabric {} for {}", loader_version, game_version);

        let url = format!(
            "{}/versions/loader/{}/{}/profile/json",
            self.meta_base, game_version, loader_version
        );
        let (mut profile, raw): (FabricProfile, _) = ctx.resolver.fetch_json(&url).await?;
        if profile.main_class.trim().is_empty() {
            return Err(LauncherError::malformed(&url, "profile has no mainClass"));
        }

        let id = profile
            .id
            .clone()
            .unwrap_or_else(|| version_id(&loader_version, &game_version));
        persist_document(ctx.layout, &CacheLayout::version_json_key(&id), &raw).await?;

        Self::ensure_loader_artifact(&mut profile.libraries, &loader_version);
        for lib in &profile.libraries {
            let coordinate = MavenArtifact::parse(&lib.name)?;
            let repo = lib.url.as_deref().unwrap_or(FABRIC_MAVEN);
            let key = CacheLayout::library_key(&coordinate.relative_path());
            let source = ArtifactSource::Url(coordinate.url(repo));
            plan.desired.insert(Artifact::new(key, ctx.layout.root(), source)?);
        }

        plan.version_id = id;
        plan.loader_version = Some(loader_version);
        plan.main_class = profile.main_class;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::vanilla::tests::mock_mojang;
    use crate::core::sync::ManifestResolver;

    fn libs(names: &[&str]) -> Vec<FabricLibrary> {
        names
            .iter()
            .map(|name| FabricLibrary {
                name: name.to_string(),
                url: None,
            })
            .collect()
    }

    #[test]
    fn ensure_loader_artifact_adds_fabric_loader_coordinate() {
        let mut libraries = libs(&["net.fabricmc:intermediary:1.16.5"]);

        FabricInstaller::ensure_loader_artifact(&mut libraries, "0.14.9");

        assert!(libraries
            .iter()
            .any(|lib| lib.name == "net.fabricmc:fabric-loader:0.14.9"));
    }

    #[test]
    fn ensure_loader_artifact_keeps_existing_coordinate_unique() {
        let mut libraries = libs(&["net.fabricmc:fabric-loader:0.14.9"]);

        FabricInstaller::ensure_loader_artifact(&mut libraries, "0.14.9");

        assert_eq!(libraries.len(), 1);
    }

    #[tokio::test]
    async fn plan_picks_the_newest_stable_loader() {
        let mut server = mockito::Server::new_async().await;
        mock_mojang(&mut server).await;
        server
            .mock("GET", "/fabric/versions/loader/1.16.5")
            .with_body(
                serde_json::json!([
                    {"loader": {"version": "0.15.0-beta", "stable": false}},
                    {"loader": {"version": "0.14.9", "stable": true}}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/fabric/versions/loader/1.16.5/0.14.9/profile/json")
            .with_body(
                serde_json::json!({
                    "id": "fabric-loader-0.14.9-1.16.5",
                    "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
                    "libraries": [
                        {"name": "net.fabricmc:intermediary:1.16.5", "url": "https://maven.fabricmc.net/"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        let resolver = ManifestResolver::new(reqwest::Client::new());
        let manifest_url = format!("{}/mc/version_manifest.json", server.url());

        let plan = FabricInstaller::new()
            .with_meta_base(format!("{}/fabric", server.url()))
            .plan(InstallContext {
                layout: &layout,
                resolver: &resolver,
                version_manifest_url: &manifest_url,
                game_version: "1.16.5",
                loader_version: None,
            })
            .await
            .unwrap();

        assert_eq!(plan.loader_version.as_deref(), Some("0.14.9"));
        assert_eq!(plan.version_id, "fabric-loader-0.14.9-1.16.5");
        assert_eq!(plan.main_class, "net.fabricmc.loader.impl.launch.knot.KnotClient");
        assert!(dir
            .path()
            .join("versions/fabric-loader-0.14.9-1.16.5/fabric-loader-0.14.9-1.16.5.json")
            .is_file());

        let loader = plan
            .desired
            .get("libraries/net/fabricmc/fabric-loader/0.14.9/fabric-loader-0.14.9.jar")
            .unwrap();
        assert!(loader.fingerprint.is_none());
        assert!(plan
            .desired
            .get("libraries/net/fabricmc/intermediary/1.16.5/intermediary-1.16.5.jar")
            .is_some());
        assert!(plan.desired.get("versions/1.16.5/1.16.5.jar").is_some());
    }
}
