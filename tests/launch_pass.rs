use std::path::{Path, PathBuf};
use std::sync::Arc;

use limacina_lib::core::auth::{offline_uuid, LaunchAccountProfile};
use limacina_lib::core::events::NoopObserver;
use limacina_lib::core::launch::classpath::safe_path_str;
use limacina_lib::core::launch::{
    build_classpath, get_classpath_separator, LaunchController, LaunchRequest, LaunchSpec, LaunchState,
    LoaderType,
};
use limacina_lib::core::state::{AppState, LauncherSettings};

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"jar").unwrap();
}

fn cache_with_one_library(root: &Path) -> AppState {
    touch(&root.join("libraries/org/ow2/asm/asm/9.1/asm-9.1.jar"));
    touch(&root.join("versions/1.16.5/1.16.5.jar"));
    AppState::with_settings(root.to_path_buf(), LauncherSettings::default()).unwrap()
}

async fn prepare(loader: LoaderType, root: &Path) -> LaunchSpec {
    let app = cache_with_one_library(root);
    let request = LaunchRequest::new(loader, "1.16.5", LaunchAccountProfile::offline("Steve"))
        .with_loader_version("0.14.9");

    let mut controller = LaunchController::new(Arc::new(NoopObserver));
    let spec = controller.prepare(&request, &app).await.unwrap().clone();
    assert_eq!(controller.state(), &LaunchState::ArgsBuilt);
    spec
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[test]
fn empty_library_root_yields_only_the_extras() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("libraries")).unwrap();
    let extras = vec![PathBuf::from("/opt/loader.jar"), PathBuf::from("/opt/game.jar")];

    let classpath = build_classpath(&dir.path().join("libraries"), &extras).unwrap();

    assert_eq!(
        classpath,
        ["/opt/loader.jar", "/opt/game.jar"].join(get_classpath_separator())
    );
}

#[tokio::test]
async fn forge_launch_carries_tweak_class_and_forge_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let forge_jar = dir
        .path()
        .join("libraries/net/minecraftforge/forge/forge-1.16.5-36.2.39-client.jar");
    touch(&forge_jar);
    touch(&dir.path().join("libraries/net/minecraftforge/eventbus/eventbus-4.0.0.jar"));
    let spec = prepare(LoaderType::Forge, dir.path()).await;

    assert_eq!(spec.main_class, "net.minecraft.launchwrapper.Launch");
    assert_eq!(
        value_after(&spec.game_args, "--tweakClass"),
        Some("net.minecraftforge.fml.common.launcher.FMLTweaker")
    );
    assert_eq!(value_after(&spec.game_args, "--fml.forgeVersion"), Some("36.2.39"));
    assert_eq!(value_after(&spec.game_args, "--fml.mcVersion"), Some("1.16.5"));
    assert_eq!(value_after(&spec.game_args, "--username"), Some("Steve"));
    assert_eq!(value_after(&spec.game_args, "--uuid"), Some(offline_uuid("Steve").as_str()));
    assert!(!spec.game_args.iter().any(|a| a.contains("${")));

    let entries: Vec<String> = spec
        .classpath
        .split(get_classpath_separator())
        .map(str::to_string)
        .collect();
    assert_eq!(
        entries,
        vec![
            safe_path_str(&dir.path().join("libraries/net/minecraftforge/eventbus/eventbus-4.0.0.jar")),
            safe_path_str(&dir.path().join("libraries/org/ow2/asm/asm/9.1/asm-9.1.jar")),
            safe_path_str(&forge_jar),
            safe_path_str(&dir.path().join("versions/1.16.5/1.16.5.jar")),
        ]
    );
}

#[tokio::test]
async fn fabric_launch_uses_knot_and_no_tweak_class() {
    let dir = tempfile::tempdir().unwrap();
    let spec = prepare(LoaderType::Fabric, dir.path()).await;

    assert_eq!(spec.main_class, "net.fabricmc.loader.impl.launch.knot.KnotClient");
    assert!(!spec.game_args.iter().any(|a| a == "--tweakClass"));
    assert!(!spec.game_args.iter().any(|a| a.starts_with("--fml.")));
    assert_eq!(
        value_after(&spec.game_args, "--version"),
        Some("fabric-loader-0.14.9-1.16.5")
    );
    assert_eq!(value_after(&spec.game_args, "--width"), Some("1280"));

    let game_jar = safe_path_str(&dir.path().join("versions/1.16.5/1.16.5.jar"));
    assert!(spec
        .jvm_args
        .iter()
        .any(|a| *a == format!("-Dfabric.gameJarPath={game_jar}")));
    assert!(spec.classpath.ends_with(&game_jar));

    let command = spec.command_line();
    let main = command.iter().position(|a| *a == spec.main_class).unwrap();
    assert_eq!(command[main - 2], "-cp");
}

#[tokio::test]
async fn missing_library_root_fails_before_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let app = AppState::with_settings(dir.path().to_path_buf(), LauncherSettings::default()).unwrap();
    let request = LaunchRequest::new(LoaderType::Forge, "1.16.5", LaunchAccountProfile::offline("Steve"));

    let mut controller = LaunchController::new(Arc::new(NoopObserver));
    assert!(controller.prepare(&request, &app).await.is_err());
    assert_eq!(controller.state(), &LaunchState::Idle);
}

#[tokio::test]
async fn identity_values_are_passed_through_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let app = cache_with_one_library(dir.path());
    let identity = LaunchAccountProfile::offline("${auth_access_token}").with_access_token("SECRET");
    let request = LaunchRequest::new(LoaderType::Fabric, "1.16.5", identity);

    let mut controller = LaunchController::new(Arc::new(NoopObserver));
    let spec = controller.prepare(&request, &app).await.unwrap();

    assert_eq!(value_after(&spec.game_args, "--username"), Some("${auth_access_token}"));
    assert_eq!(value_after(&spec.game_args, "--accessToken"), Some("SECRET"));
    assert!(!spec.display_command().contains("SECRET"));
}
