mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use limacina_lib::core::auth::LaunchAccountProfile;
use limacina_lib::core::error::LauncherResult;
use limacina_lib::core::launch::{ForgeMetadata, LaunchRequest, LaunchState, LoaderType};
use limacina_lib::core::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "limacina", version, about = "Sync and launch the game client distribution")]
struct Cli {
    /// Cache root (defaults to ~/$LAUNCHER_NAME).
    #[arg(long, global = true, env = "LIMACINA_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch missing or changed files listed by the flat manifest.
    Sync,
    /// Install a vanilla version: client, libraries and assets.
    Bootstrap {
        #[arg(default_value = "latest")]
        version: String,
    },
    /// Install a vanilla version plus the Fabric loader.
    Fabric {
        mc_version: String,
        /// Loader version; newest stable when omitted.
        #[arg(long)]
        loader: Option<String>,
    },
    /// Launch the game.
    Launch {
        #[arg(long, default_value_t = LoaderType::Forge)]
        loader: LoaderType,
        #[arg(long, default_value = "Player")]
        username: String,
        #[arg(long, default_value = "1.16.5")]
        version: String,
        /// Fabric loader version, used for the version name.
        #[arg(long)]
        loader_version: Option<String>,
        /// Forge version passed to FML and used to locate the forge client jar.
        #[arg(long)]
        forge_version: Option<String>,
        /// MCP mapping version passed to FML.
        #[arg(long)]
        mcp_version: Option<String>,
        #[arg(long, env = "LIMACINA_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
        /// Return as soon as the game is running.
        #[arg(long)]
        detach: bool,
    },
    /// List published versions.
    Versions {
        #[arg(long)]
        snapshots: bool,
    },
}

/// Cancelled on the first Ctrl-C so a running sync stops at the next chunk.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current chunk");
            on_signal.cancel();
        }
    });
    token
}

async fn run(cli: Cli) -> LauncherResult<()> {
    let state = AppState::new(cli.root)?;

    match cli.command {
        Command::Sync => {
            commands::sync_content(&state, interrupt_token()).await?;
        }
        Command::Bootstrap { version } => {
            commands::bootstrap_version(&state, LoaderType::Vanilla, &version, None, interrupt_token())
                .await?;
        }
        Command::Fabric { mc_version, loader } => {
            commands::bootstrap_version(
                &state,
                LoaderType::Fabric,
                &mc_version,
                loader.as_deref(),
                interrupt_token(),
            )
            .await?;
        }
        Command::Launch {
            loader,
            username,
            version,
            loader_version,
            forge_version,
            mcp_version,
            access_token,
            detach,
        } => {
            let mut identity = LaunchAccountProfile::offline(&username);
            if let Some(token) = access_token {
                identity = identity.with_access_token(token);
            }
            let mut request = LaunchRequest::new(loader, version, identity);
            if let Some(loader_version) = loader_version {
                request = request.with_loader_version(loader_version);
            }
            if forge_version.is_some() || mcp_version.is_some() {
                let defaults = ForgeMetadata::default();
                request = request.with_forge(ForgeMetadata {
                    forge_version: forge_version.unwrap_or(defaults.forge_version),
                    mcp_version: mcp_version.unwrap_or(defaults.mcp_version),
                    ..defaults
                });
            }

            match commands::launch_game(&state, &request, detach).await? {
                LaunchState::ExitedWithError { code, detail } => {
                    error!("Game exited with error (code {:?}): {}", code, detail)
                }
                running if !running.is_terminal() => info!("Game left running ({:?})", running),
                other => info!("Launch finished in state {:?}", other),
            }
        }
        Command::Versions { snapshots } => {
            for version in commands::get_minecraft_versions(&state, snapshots).await? {
                println!("{}\t{}\t{}", version.id, version.version_type, version.release_time);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    limacina_lib::init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
