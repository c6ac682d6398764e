// Command handlers behind the CLI. Each one only calls the library API.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use limacina_lib::core::error::LauncherResult;
use limacina_lib::core::events::{LauncherObserver, TracingObserver};
use limacina_lib::core::launch::{LaunchController, LaunchRequest, LaunchState, LoaderType};
use limacina_lib::core::state::AppState;
use limacina_lib::core::sync::{BootstrapReport, ManifestResolver, SyncReport, SyncSession};

#[derive(Debug, Serialize)]
pub struct MinecraftVersionInfo {
    pub id: String,
    pub release_time: String,
    pub version_type: String,
}

fn observer() -> Arc<dyn LauncherObserver> {
    Arc::new(TracingObserver)
}

pub async fn sync_content(state: &AppState, cancel: CancellationToken) -> LauncherResult<SyncReport> {
    let report = SyncSession::new(state, observer())
        .with_cancellation(cancel)
        .sync_flat()
        .await?;
    info!(
        "Sync finished: {} checked, {} fetched ({} bytes)",
        report.checked,
        report.fetched.len(),
        report.bytes
    );
    Ok(report)
}

pub async fn bootstrap_version(
    state: &AppState,
    loader: LoaderType,
    game_version: &str,
    loader_version: Option<&str>,
    cancel: CancellationToken,
) -> LauncherResult<BootstrapReport> {
    let report = SyncSession::new(state, observer())
        .with_cancellation(cancel)
        .bootstrap(loader, game_version, loader_version)
        .await?;
    info!(
        "{} ready: {} library files and {} asset objects fetched",
        report.version_id,
        report.libraries.fetched.len(),
        report.assets.fetched.len()
    );
    Ok(report)
}

pub async fn get_minecraft_versions(
    state: &AppState,
    include_snapshots: bool,
) -> LauncherResult<Vec<MinecraftVersionInfo>> {
    let resolver = ManifestResolver::new(state.http_client.clone());
    let manifest = resolver
        .fetch_version_index(&state.settings.version_manifest_url)
        .await?;

    let entries = if include_snapshots {
        manifest.versions.iter().collect()
    } else {
        manifest.releases()
    };

    Ok(entries
        .into_iter()
        .map(|v| MinecraftVersionInfo {
            id: v.id.clone(),
            release_time: v
                .release_time
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            version_type: v.version_type.clone(),
        })
        .collect())
}

/// Spawn the game. With `detach` the call returns once the game is running;
/// otherwise it waits for the game to exit and returns the terminal state.
pub async fn launch_game(
    state: &AppState,
    request: &LaunchRequest,
    detach: bool,
) -> LauncherResult<LaunchState> {
    let handle = LaunchController::launch(request, state, observer()).await?;
    info!("Game started (pid {:?})", handle.pid());

    if detach {
        return Ok(handle.state());
    }
    Ok(handle.wait().await)
}
