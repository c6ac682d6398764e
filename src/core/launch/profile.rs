// ─── Launch Profiles ───
// Fixed per-variant templates. Arguments keep their `${name}` placeholders;
// `task` resolves them once identity and paths are known.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::auth::LaunchAccountProfile;
use crate::core::cache::CacheLayout;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::VersionJson;

pub const FORGE_MAIN_CLASS: &str = "net.minecraft.launchwrapper.Launch";
pub const FORGE_TWEAK_CLASS: &str = "net.minecraftforge.fml.common.launcher.FMLTweaker";
pub const FABRIC_MAIN_CLASS: &str = "net.fabricmc.loader.impl.launch.knot.KnotClient";

const COMMON_JVM_ARGS: &[&str] = &[
    "-Xms${min_memory}",
    "-Xmx${max_memory}",
    "-Djava.library.path=${natives_directory}",
    "-Dminecraft.launcher.brand=${launcher_name}",
    "-Dminecraft.launcher.version=${launcher_version}",
];

const G1_JVM_ARGS: &[&str] = &[
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:+UseG1GC",
    "-XX:G1NewSizePercent=20",
    "-XX:G1ReservePercent=20",
    "-XX:MaxGCPauseMillis=50",
    "-XX:G1HeapRegionSize=32M",
];

const FORGE_GAME_ARGS: &[&str] = &[
    "--tweakClass", FORGE_TWEAK_CLASS,
    "--username", "${auth_player_name}",
    "--uuid", "${auth_uuid}",
    "--accessToken", "${auth_access_token}",
    "--userType", "${user_type}",
    "--userProperties", "${user_properties}",
    "--assetIndex", "${assets_index_name}",
    "--version", "${version_name}",
    "--gameDir", "${game_directory}",
    "--assetsDir", "${assets_root}",
    "--resourcePackDir", "${resource_pack_directory}",
    "--versionType", "${version_type}",
    "--width", "${resolution_width}",
    "--height", "${resolution_height}",
    "--launchTarget", "fmlclient",
    "--fml.forgeVersion", "${forge_version}",
    "--fml.mcVersion", "${mc_version}",
    "--fml.forgeGroup", "${forge_group}",
    "--fml.mcpVersion", "${mcp_version}",
];

const FABRIC_GAME_ARGS: &[&str] = &[
    "--username", "${auth_player_name}",
    "--uuid", "${auth_uuid}",
    "--accessToken", "${auth_access_token}",
    "--userType", "${user_type}",
    "--userProperties", "${user_properties}",
    "--assetsDir", "${assets_root}",
    "--assetIndex", "${assets_index_name}",
    "--version", "${version_name}",
    "--gameDir", "${game_directory}",
    "--width", "${resolution_width}",
    "--height", "${resolution_height}",
    "--versionType", "${version_type}",
];

/// Loader variant: vanilla, forge-style (loader-A) or fabric-style (loader-B).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    #[default]
    Vanilla,
    Forge,
    Fabric,
}

impl LoaderType {
    pub fn as_str(self) -> &'static str {
        match self {
            LoaderType::Vanilla => "vanilla",
            LoaderType::Forge => "forge",
            LoaderType::Fabric => "fabric",
        }
    }
}

impl fmt::Display for LoaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoaderType {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" => Ok(LoaderType::Vanilla),
            "forge" => Ok(LoaderType::Forge),
            "fabric" => Ok(LoaderType::Fabric),
            other => Err(LauncherError::Loader(format!("unknown loader variant: {other}"))),
        }
    }
}

/// Forge version metadata passed through the `--fml.*` game arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgeMetadata {
    pub forge_version: String,
    pub mcp_version: String,
    pub forge_group: String,
}

impl Default for ForgeMetadata {
    fn default() -> Self {
        Self {
            forge_version: "36.2.39".into(),
            mcp_version: "20210115.111550".into(),
            forge_group: "net.minecraftforge".into(),
        }
    }
}

impl ForgeMetadata {
    /// `libraries/<group>/forge/forge-<mc>-<forge>-client.jar`, where the
    /// distribution's flat manifest places it.
    pub fn client_jar_key(&self, game_version: &str) -> String {
        CacheLayout::library_key(&format!(
            "{}/forge/forge-{}-{}-client.jar",
            self.forge_group.replace('.', "/"),
            game_version,
            self.forge_version,
        ))
    }
}

/// What to launch and as whom.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub loader: LoaderType,
    pub game_version: String,
    /// Fabric loader version, used for the version name only.
    pub loader_version: Option<String>,
    pub forge: ForgeMetadata,
    pub identity: LaunchAccountProfile,
}

impl LaunchRequest {
    pub fn new(loader: LoaderType, game_version: impl Into<String>, identity: LaunchAccountProfile) -> Self {
        Self {
            loader,
            game_version: game_version.into(),
            loader_version: None,
            forge: ForgeMetadata::default(),
            identity,
        }
    }

    pub fn with_loader_version(mut self, loader_version: impl Into<String>) -> Self {
        self.loader_version = Some(loader_version.into());
        self
    }

    pub fn with_forge(mut self, forge: ForgeMetadata) -> Self {
        self.forge = forge;
        self
    }
}

/// Where the classpath's library entries come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// Every jar found under this root.
    Walk(PathBuf),
    /// Exactly these jars, in order.
    Listed(Vec<PathBuf>),
}

/// A variant's template before placeholder substitution.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub loader: LoaderType,
    pub main_class: String,
    pub jvm_args: Vec<String>,
    pub game_args: Vec<String>,
    pub libraries: LibrarySource,
    /// Appended after the library entries.
    pub extra_jars: Vec<PathBuf>,
    pub game_jar: PathBuf,
    pub native_jars: Vec<PathBuf>,
    pub natives_dir: PathBuf,
    pub version_name: String,
    pub version_type: String,
    pub asset_index: String,
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

impl LaunchProfile {
    pub fn resolve(request: &LaunchRequest, layout: &CacheLayout) -> LauncherResult<Self> {
        let mc = request.game_version.as_str();
        let game_jar = layout.resolve(&CacheLayout::version_jar_key(mc))?;
        let base_doc_path = layout.resolve(&CacheLayout::version_json_key(mc))?;

        // Required for vanilla, optional metadata for the loader variants.
        let base_doc = match request.loader {
            LoaderType::Vanilla => Some(VersionJson::load(&base_doc_path)?),
            _ if base_doc_path.is_file() => Some(VersionJson::load(&base_doc_path)?),
            _ => None,
        };

        let asset_index = base_doc
            .as_ref()
            .and_then(|doc| doc.asset_index_id())
            .unwrap_or(mc)
            .to_string();
        let version_type = base_doc
            .as_ref()
            .and_then(|doc| doc.version_type.clone())
            .unwrap_or_else(|| "release".into());
        let native_jars = match &base_doc {
            Some(doc) => doc
                .native_keys()
                .iter()
                .map(|key| layout.resolve(key))
                .collect::<LauncherResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        let mut jvm_args = owned(COMMON_JVM_ARGS);
        let profile = match request.loader {
            LoaderType::Vanilla => {
                let Some(doc) = base_doc.as_ref() else {
                    return Err(LauncherError::Loader(format!("no version document for {mc}")));
                };
                for arg in doc.simple_jvm_args() {
                    if !jvm_args.contains(&arg) {
                        jvm_args.push(arg);
                    }
                }
                let listed = doc
                    .classpath_keys()?
                    .iter()
                    .map(|key| layout.resolve(key))
                    .collect::<LauncherResult<Vec<_>>>()?;

                LaunchProfile {
                    loader: request.loader,
                    main_class: doc.main_class.clone(),
                    jvm_args,
                    game_args: doc.simple_game_args(),
                    libraries: LibrarySource::Listed(listed),
                    extra_jars: vec![game_jar.clone()],
                    game_jar,
                    native_jars,
                    natives_dir: layout.natives_dir(mc),
                    version_name: doc.id.clone().unwrap_or_else(|| mc.to_string()),
                    version_type,
                    asset_index,
                }
            }
            LoaderType::Forge => {
                jvm_args.extend(owned(G1_JVM_ARGS));
                let forge_jar = layout.resolve(&request.forge.client_jar_key(mc))?;

                LaunchProfile {
                    loader: request.loader,
                    main_class: FORGE_MAIN_CLASS.into(),
                    jvm_args,
                    game_args: owned(FORGE_GAME_ARGS),
                    libraries: LibrarySource::Walk(layout.libraries_dir()),
                    extra_jars: vec![forge_jar, game_jar.clone()],
                    game_jar,
                    native_jars,
                    natives_dir: layout.natives_dir(mc),
                    version_name: mc.to_string(),
                    version_type,
                    asset_index,
                }
            }
            LoaderType::Fabric => {
                jvm_args.extend(owned(G1_JVM_ARGS));
                jvm_args.push("-Dfabric.gameJarPath=${game_jar}".into());
                let version_name = match request.loader_version.as_deref() {
                    Some(loader) => format!("fabric-loader-{loader}-{mc}"),
                    None => mc.to_string(),
                };

                LaunchProfile {
                    loader: request.loader,
                    main_class: FABRIC_MAIN_CLASS.into(),
                    jvm_args,
                    game_args: owned(FABRIC_GAME_ARGS),
                    libraries: LibrarySource::Walk(layout.libraries_dir()),
                    extra_jars: vec![game_jar.clone()],
                    game_jar,
                    native_jars,
                    natives_dir: layout.natives_dir(mc),
                    version_name,
                    version_type,
                    asset_index,
                }
            }
        };

        debug!(
            "Resolved {} profile for {}: main class {}",
            profile.loader, mc, profile.main_class
        );
        Ok(profile)
    }
}
