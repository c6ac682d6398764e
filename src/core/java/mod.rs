// ─── Java Discovery ───
// configured path -> $JAVA_HOME/bin/java -> `which`/`where java` -> bare `java`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

const JAVA_HOME_ENV: &str = "JAVA_HOME";

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Pick the java executable for a launch. Never fails: the last resort is
/// the bare program name, resolved by the OS at spawn time.
pub fn find_java(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        if path.is_file() {
            return path.to_path_buf();
        }
        warn!("Configured java {:?} does not exist, searching", path);
    }

    if let Some(path) = std::env::var_os(JAVA_HOME_ENV)
        .map(|home| java_in_home(Path::new(&home)))
        .filter(|path| path.is_file())
    {
        debug!("Using java from {}: {:?}", JAVA_HOME_ENV, path);
        return path;
    }

    if let Some(path) = search_path() {
        debug!("Using java from PATH: {:?}", path);
        return path;
    }

    PathBuf::from(java_exe())
}

fn java_in_home(home: &Path) -> PathBuf {
    home.join("bin").join(java_exe())
}

fn search_path() -> Option<PathBuf> {
    let locator = if cfg!(windows) { "where" } else { "which" };
    let output = Command::new(locator).arg("java").output().ok()?;
    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}
