// ─── Launch Task ───
// Idle -> ArgsBuilt -> Spawned -> {Running, SpawnFailed} -> {Exited, ExitedWithError}
//
// Spawning returns as soon as the process exists; a supervision task
// reports the exit to the observer and to whoever holds the handle.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use serde::Serialize;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::classpath::{build_classpath, build_listed_classpath, get_classpath_separator, safe_path_str};
use super::natives::extract_natives;
use super::profile::{LaunchProfile, LaunchRequest, LibrarySource, LoaderType};
use crate::core::auth::LaunchAccountProfile;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::LauncherObserver;
use crate::core::java::find_java;
use crate::core::state::AppState;

pub const LAUNCHER_NAME: &str = "Limacina";
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lifecycle of one launch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LaunchState {
    Idle,
    ArgsBuilt,
    Spawned { pid: Option<u32> },
    Running { pid: Option<u32> },
    SpawnFailed { reason: String },
    Exited,
    ExitedWithError { code: Option<i32>, detail: String },
}

impl LaunchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LaunchState::SpawnFailed { .. } | LaunchState::Exited | LaunchState::ExitedWithError { .. }
        )
    }
}

/// Everything needed to start the game process.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub loader: LoaderType,
    pub identity: LaunchAccountProfile,
    pub java: PathBuf,
    pub main_class: String,
    pub classpath: String,
    pub jvm_args: Vec<String>,
    pub game_args: Vec<String>,
    pub working_dir: PathBuf,
    /// Prepended to the platform library search path of the child.
    pub natives_dir: Option<PathBuf>,
}

impl LaunchSpec {
    /// Arguments after the program: JVM flags, classpath, main class, game arguments.
    pub fn command_line(&self) -> Vec<String> {
        let mut args = self.jvm_args.clone();
        args.push("-cp".into());
        args.push(self.classpath.clone());
        args.push(self.main_class.clone());
        args.extend(self.game_args.iter().cloned());
        args
    }

    /// Copy-pasteable command with the access token masked.
    pub fn display_command(&self) -> String {
        let token = self.identity.access_token.as_str();
        std::iter::once(self.java.to_string_lossy().to_string())
            .chain(self.command_line())
            .map(|arg| {
                if !token.is_empty() && arg == token {
                    "********".to_string()
                } else {
                    shell_escape(&arg)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ── Placeholder substitution ────────────────────────────

/// `${name}` values for one launch.
#[derive(Debug, Clone, Default)]
pub struct LaunchVars {
    values: Vec<(String, String)>,
}

impl LaunchVars {
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name.to_string(), value)),
        }
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace every `${name}` token of `raw` in one pass. Values are copied
    /// verbatim and never rescanned. `None` if a token has no value or is unterminated.
    pub fn substitute(&self, raw: &str) -> Option<String> {
        let mut resolved = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(start) = rest.find("${") {
            resolved.push_str(&rest[..start]);
            let token = &rest[start + 2..];
            let end = token.find('}')?;
            resolved.push_str(self.get(&token[..end])?);
            rest = &token[end + 1..];
        }

        resolved.push_str(rest);
        Some(resolved)
    }
}

/// An unresolved value also removes the option flag right before it.
fn drop_dangling_option(args: &mut Vec<String>) {
    if args.last().is_some_and(|last| last.starts_with('-')) {
        let _ = args.pop();
    }
}

/// JVM flags with placeholders resolved. Template classpath switches are
/// dropped with their value; the classpath is always injected by `command_line`.
fn sanitize_jvm_args(raw_args: &[String], vars: &LaunchVars) -> Vec<String> {
    let mut sanitized = Vec::new();
    let mut i = 0;

    while i < raw_args.len() {
        let arg = &raw_args[i];

        if arg == "-cp" || arg == "-classpath" || arg == "--class-path" {
            i += 2;
            continue;
        }

        match vars.substitute(arg) {
            Some(resolved) => sanitized.push(resolved),
            None => {
                debug!("Dropping unresolved JVM argument {:?}", arg);
                if !arg.starts_with('-') {
                    drop_dangling_option(&mut sanitized);
                }
            }
        }
        i += 1;
    }

    sanitized
}

fn sanitize_game_args(raw_args: &[String], vars: &LaunchVars) -> Vec<String> {
    let mut sanitized = Vec::new();

    for arg in raw_args {
        match vars.substitute(arg) {
            Some(resolved) => sanitized.push(resolved),
            None => {
                debug!("Dropping unresolved game argument {:?}", arg);
                if !arg.starts_with('-') {
                    drop_dangling_option(&mut sanitized);
                }
            }
        }
    }

    sanitize_numeric_window_args(sanitized)
}

fn sanitize_numeric_window_args(args: Vec<String>) -> Vec<String> {
    let mut sanitized = Vec::with_capacity(args.len());
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];
        if arg == "--width" || arg == "--height" {
            let Some(value) = args.get(i + 1) else {
                i += 1;
                continue;
            };

            if value.starts_with('-') || value.parse::<u32>().is_err() {
                i += 1;
                continue;
            }

            sanitized.push(arg.clone());
            sanitized.push(value.clone());
            i += 2;
            continue;
        }

        sanitized.push(arg.clone());
        i += 1;
    }

    sanitized
}

fn launch_vars(
    request: &LaunchRequest,
    profile: &LaunchProfile,
    app: &AppState,
    classpath: &str,
) -> LaunchVars {
    let identity = &request.identity;
    let settings = &app.settings;
    let game_dir = safe_path_str(&app.cache_root);

    let mut vars = LaunchVars::default();
    vars.set("auth_player_name", identity.username.as_str())
        .set("auth_uuid", identity.uuid.as_str())
        .set("auth_access_token", identity.access_token.as_str())
        .set("user_type", identity.user_type.as_str())
        .set("user_properties", "{}")
        .set("version_name", profile.version_name.as_str())
        .set("version_type", profile.version_type.as_str())
        .set("mc_version", request.game_version.as_str())
        .set("assets_index_name", profile.asset_index.as_str())
        .set("assets_root", safe_path_str(&app.assets_dir()))
        .set("game_directory", game_dir.as_str())
        .set("resource_pack_directory", safe_path_str(&app.cache_root.join("resourcepacks")))
        .set("library_directory", safe_path_str(&app.libraries_dir()))
        .set("natives_directory", safe_path_str(&profile.natives_dir))
        .set("game_jar", safe_path_str(&profile.game_jar))
        .set("classpath", classpath)
        .set("classpath_separator", get_classpath_separator())
        .set("launcher_name", LAUNCHER_NAME)
        .set("launcher_version", LAUNCHER_VERSION)
        .set("min_memory", settings.min_memory.as_str())
        .set("max_memory", settings.max_memory.as_str())
        .set("resolution_width", settings.window_width.to_string())
        .set("resolution_height", settings.window_height.to_string())
        .set("forge_version", request.forge.forge_version.as_str())
        .set("mcp_version", request.forge.mcp_version.as_str())
        .set("forge_group", request.forge.forge_group.as_str());
    vars
}

// ── Controller ──────────────────────────────────────────

/// Drives one launch through its states and reports each transition.
pub struct LaunchController {
    observer: Arc<dyn LauncherObserver>,
    state: LaunchState,
    spec: Option<LaunchSpec>,
}

impl LaunchController {
    pub fn new(observer: Arc<dyn LauncherObserver>) -> Self {
        Self {
            observer,
            state: LaunchState::Idle,
            spec: None,
        }
    }

    /// Start from an already assembled spec.
    pub fn with_spec(observer: Arc<dyn LauncherObserver>, spec: LaunchSpec) -> Self {
        let mut controller = Self::new(observer);
        controller.spec = Some(spec);
        controller.transition(LaunchState::ArgsBuilt);
        controller
    }

    pub fn state(&self) -> &LaunchState {
        &self.state
    }

    pub fn spec(&self) -> Option<&LaunchSpec> {
        self.spec.as_ref()
    }

    fn transition(&mut self, next: LaunchState) {
        debug!("Launch state: {:?} -> {:?}", self.state, next);
        self.observer.on_launch_state(&next);
        self.state = next;
    }

    /// Idle -> ArgsBuilt: pick the variant template, build the classpath,
    /// extract natives and resolve every placeholder.
    pub async fn prepare(&mut self, request: &LaunchRequest, app: &AppState) -> LauncherResult<&LaunchSpec> {
        if self.state != LaunchState::Idle {
            return Err(LauncherError::Loader(format!(
                "launch arguments already built (state {:?})",
                self.state
            )));
        }

        let identity = request.identity.clone().sanitized();
        let request = LaunchRequest {
            identity,
            ..request.clone()
        };

        let profile = LaunchProfile::resolve(&request, &app.layout())?;

        let classpath = match &profile.libraries {
            LibrarySource::Walk(root) => build_classpath(root, &profile.extra_jars)?,
            LibrarySource::Listed(jars) => build_listed_classpath(jars, &profile.extra_jars),
        };
        debug!("Classpath len={} value={:?}", classpath.len(), classpath);

        let extracted = extract_natives(profile.native_jars.clone(), &profile.natives_dir).await?;
        debug!("Extracted {} natives into {:?}", extracted, profile.natives_dir);

        let vars = launch_vars(&request, &profile, app, &classpath);
        let spec = LaunchSpec {
            loader: request.loader,
            java: find_java(app.settings.java_path.as_deref()),
            main_class: profile.main_class.clone(),
            jvm_args: sanitize_jvm_args(&profile.jvm_args, &vars),
            game_args: sanitize_game_args(&profile.game_args, &vars),
            classpath,
            working_dir: app.cache_root.clone(),
            natives_dir: Some(profile.natives_dir.clone()),
            identity: request.identity,
        };

        self.spec = Some(spec);
        self.transition(LaunchState::ArgsBuilt);
        self.spec
            .as_ref()
            .ok_or_else(|| LauncherError::Loader("launch spec missing after build".into()))
    }

    /// ArgsBuilt -> Spawned -> Running, or SpawnFailed.
    ///
    /// Returns once the process is running. The exit is reported through the
    /// observer and the returned handle, never as an error of this call.
    /// Must be called within a Tokio runtime.
    pub fn spawn(mut self) -> LauncherResult<LaunchHandle> {
        let Some(spec) = self.spec.take().filter(|_| self.state == LaunchState::ArgsBuilt) else {
            return Err(LauncherError::Loader(format!(
                "cannot spawn from state {:?}",
                self.state
            )));
        };

        let mut cmd = Command::new(&spec.java);
        cmd.args(spec.command_line())
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(natives) = &spec.natives_dir {
            configure_native_library_env(&mut cmd, natives);
        }

        info!("Launching {} with Java: {:?}", spec.loader, spec.java);
        debug!("Command (copy/paste): {}", spec.display_command());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = LauncherError::SpawnFailed {
                    program: spec.java.clone(),
                    source,
                };
                error!("{}", err);
                self.transition(LaunchState::SpawnFailed {
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let pid = child.id();
        self.transition(LaunchState::Spawned { pid });
        self.transition(LaunchState::Running { pid });

        let (state_tx, state_rx) = watch::channel(self.state.clone());
        let observer = self.observer.clone();
        let task = tokio::spawn(async move {
            let terminal = match child.wait().await {
                Ok(status) if status.success() => {
                    info!("Game process {:?} exited normally", pid);
                    LaunchState::Exited
                }
                Ok(status) => {
                    let err = LauncherError::ExitedWithError { code: status.code() };
                    warn!("{} ({})", err, status);
                    LaunchState::ExitedWithError {
                        code: status.code(),
                        detail: status.to_string(),
                    }
                }
                Err(e) => {
                    warn!("Lost track of game process {:?}: {}", pid, e);
                    LaunchState::ExitedWithError {
                        code: None,
                        detail: e.to_string(),
                    }
                }
            };
            observer.on_launch_state(&terminal);
            let _ = state_tx.send(terminal.clone());
            terminal
        });

        Ok(LaunchHandle {
            pid,
            state: state_rx,
            task,
        })
    }

    /// Convenience for `prepare` followed by `spawn`.
    pub async fn launch(
        request: &LaunchRequest,
        app: &AppState,
        observer: Arc<dyn LauncherObserver>,
    ) -> LauncherResult<LaunchHandle> {
        let mut controller = LaunchController::new(observer);
        controller.prepare(request, app).await?;
        controller.spawn()
    }
}

/// The running game process. Dropping the handle does not stop the game.
pub struct LaunchHandle {
    pid: Option<u32>,
    state: watch::Receiver<LaunchState>,
    task: JoinHandle<LaunchState>,
}

impl LaunchHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Latest known state.
    pub fn state(&self) -> LaunchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LaunchState> {
        self.state.clone()
    }

    /// Wait for the process to exit and return its terminal state.
    pub async fn wait(self) -> LaunchState {
        match self.task.await {
            Ok(state) => state,
            Err(e) => LaunchState::ExitedWithError {
                code: None,
                detail: format!("supervision task failed: {e}"),
            },
        }
    }
}

fn configure_native_library_env(cmd: &mut Command, natives_dir: &Path) {
    let native_path = safe_path_str(natives_dir);

    let var = if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    };
    cmd.env(var, append_env_path(var, &native_path));
}

fn append_env_path(var_name: &str, value: &str) -> String {
    let separator = get_classpath_separator();
    match std::env::var(var_name) {
        Ok(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, separator, existing)
        }
        _ => value.to_string(),
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{ChannelObserver, LauncherEvent, NoopObserver};

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn vars() -> LaunchVars {
        let mut vars = LaunchVars::default();
        vars.set("auth_player_name", "Steve")
            .set("natives_directory", "/tmp/natives")
            .set("classpath", "a.jar:b.jar")
            .set("resolution_width", "1280")
            .set("resolution_height", "720");
        vars
    }

    fn spec(java: &str, working_dir: &Path) -> LaunchSpec {
        LaunchSpec {
            loader: LoaderType::Vanilla,
            identity: LaunchAccountProfile::offline("Steve"),
            java: PathBuf::from(java),
            main_class: "net.minecraft.client.main.Main".into(),
            classpath: "a.jar".into(),
            jvm_args: strings(&["-Xmx1G"]),
            game_args: strings(&["--username", "Steve"]),
            working_dir: working_dir.to_path_buf(),
            natives_dir: None,
        }
    }

    #[test]
    fn jvm_args_drop_template_classpath_and_unresolved_tokens() {
        let args = strings(&[
            "-XX:+UseG1GC",
            "-cp",
            "${classpath}",
            "-Djava.library.path=${natives_directory}",
            "-Dlog4j.configurationFile=${path}",
        ]);

        assert_eq!(
            sanitize_jvm_args(&args, &vars()),
            strings(&["-XX:+UseG1GC", "-Djava.library.path=/tmp/natives"])
        );
    }

    #[test]
    fn unresolved_game_arg_takes_its_option_with_it() {
        let args = strings(&["--username", "${auth_player_name}", "--xuid", "${auth_xuid}", "--demo"]);
        assert_eq!(
            sanitize_game_args(&args, &vars()),
            strings(&["--username", "Steve", "--demo"])
        );
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let mut vars = vars();
        vars.set("auth_access_token", "SECRET");

        let mut sneaky = vars.clone();
        sneaky.set("auth_player_name", "${auth_access_token}");
        assert_eq!(
            sanitize_game_args(&strings(&["--username", "${auth_player_name}"]), &sneaky),
            strings(&["--username", "${auth_access_token}"])
        );

        let mut braces = vars;
        braces.set("auth_player_name", "a${b");
        assert_eq!(
            sanitize_game_args(&strings(&["--username", "${auth_player_name}"]), &braces),
            strings(&["--username", "a${b"])
        );
    }

    #[test]
    fn unterminated_token_is_unresolved() {
        assert_eq!(vars().substitute("-Dx=${natives_directory"), None);
        assert_eq!(
            vars().substitute("${natives_directory}/${auth_player_name}"),
            Some("/tmp/natives/Steve".to_string())
        );
    }

    #[test]
    fn only_finished_launches_are_terminal() {
        assert!(!LaunchState::ArgsBuilt.is_terminal());
        assert!(!LaunchState::Running { pid: Some(1) }.is_terminal());
        assert!(LaunchState::Exited.is_terminal());
        assert!(LaunchState::SpawnFailed { reason: "x".into() }.is_terminal());
        assert!(LaunchState::ExitedWithError { code: Some(1), detail: String::new() }.is_terminal());
    }

    #[test]
    fn invalid_window_sizes_are_dropped() {
        let args = strings(&["--width", "abc", "--height", "720", "--width"]);
        assert_eq!(sanitize_game_args(&args, &vars()), strings(&["abc", "--height", "720"]));
    }

    #[test]
    fn later_values_replace_earlier_ones() {
        let mut vars = LaunchVars::default();
        vars.set("user_type", "msa").set("user_type", "mojang");
        assert_eq!(vars.substitute("${user_type}").as_deref(), Some("mojang"));
    }

    #[test]
    fn command_line_orders_jvm_classpath_main_then_game() {
        let spec = spec("java", Path::new("."));
        assert_eq!(
            spec.command_line(),
            strings(&["-Xmx1G", "-cp", "a.jar", "net.minecraft.client.main.Main", "--username", "Steve"])
        );
    }

    #[test]
    fn display_command_masks_the_access_token() {
        let mut spec = spec("java", Path::new("."));
        spec.game_args = strings(&["--accessToken", "secret-token"]);
        spec.identity.access_token = "secret-token".into();

        let shown = spec.display_command();
        assert!(!shown.contains("secret-token"));
        assert!(shown.contains("--accessToken ********"));
    }

    #[test]
    fn spawn_requires_built_arguments() {
        let controller = LaunchController::new(Arc::new(NoopObserver));
        assert!(controller.spawn().is_err());
    }

    #[tokio::test]
    async fn missing_executable_is_reported_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, mut rx) = ChannelObserver::new();
        let controller = LaunchController::with_spec(
            Arc::new(observer),
            spec("/definitely/not/a/java", dir.path()),
        );

        let err = controller.spawn().err().expect("spawn should fail");
        assert!(matches!(err, LauncherError::SpawnFailed { .. }));

        assert_eq!(rx.recv().await, Some(LauncherEvent::Launch(LaunchState::ArgsBuilt)));
        assert!(matches!(
            rx.recv().await,
            Some(LauncherEvent::Launch(LaunchState::SpawnFailed { .. }))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn clean_exit_is_reported_after_running() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, mut rx) = ChannelObserver::new();
        let handle = LaunchController::with_spec(Arc::new(observer), spec("true", dir.path()))
            .spawn()
            .unwrap();

        assert!(handle.pid().is_some());
        assert_eq!(handle.wait().await, LaunchState::Exited);

        let mut states = Vec::new();
        while let Ok(LauncherEvent::Launch(state)) = rx.try_recv() {
            states.push(state);
        }
        assert_eq!(states.first(), Some(&LaunchState::ArgsBuilt));
        assert!(matches!(states[1], LaunchState::Spawned { .. }));
        assert!(matches!(states[2], LaunchState::Running { .. }));
        assert_eq!(states.last(), Some(&LaunchState::Exited));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_exit_is_recorded_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LaunchController::with_spec(Arc::new(NoopObserver), spec("false", dir.path()))
            .spawn()
            .unwrap();

        match handle.wait().await {
            LaunchState::ExitedWithError { code, .. } => assert_eq!(code, Some(1)),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn states_serialize_with_a_tag() {
        let json = serde_json::to_value(LaunchState::ExitedWithError {
            code: Some(1),
            detail: "exit status: 1".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "exitedWithError");
        assert_eq!(json["code"], 1);
    }
}
