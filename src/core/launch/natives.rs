// ─── Native Extraction ───
// Copies top-level shared libraries out of native classifier jars into the
// per-version natives directory before launch.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

const NATIVE_SUFFIXES: [&str; 4] = [".dll", ".so", ".dylib", ".jnilib"];

fn is_native(name: &str) -> bool {
    NATIVE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Recreate `natives_dir` and fill it from `jars`. Returns the number of
/// files extracted. Jars that are missing or unreadable are skipped.
pub async fn extract_natives(jars: Vec<PathBuf>, natives_dir: &Path) -> LauncherResult<usize> {
    if natives_dir.exists() {
        let _ = tokio::fs::remove_dir_all(natives_dir).await;
    }
    tokio::fs::create_dir_all(natives_dir)
        .await
        .map_err(|source| LauncherError::DirectoryCreateFailed {
            path: natives_dir.to_path_buf(),
            source,
        })?;

    if jars.is_empty() {
        return Ok(0);
    }

    let dest_dir = natives_dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        jars.iter()
            .map(|jar| extract_jar(jar, &dest_dir))
            .sum::<usize>()
    })
    .await
    .map_err(|e| LauncherError::io(natives_dir, std::io::Error::other(e)))
}

fn extract_jar(jar: &Path, dest_dir: &Path) -> usize {
    let file = match std::fs::File::open(jar) {
        Ok(file) => file,
        Err(e) => {
            warn!("Cannot open native jar {:?}: {}", jar, e);
            return 0;
        }
    };
    let mut archive = match zip::ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(e) => {
            warn!("Cannot read native jar {:?}: {}", jar, e);
            return 0;
        }
    };

    let mut extracted = 0;
    for i in 0..archive.len() {
        let Ok(mut entry) = archive.by_index(i) else {
            continue;
        };
        let name = entry.name().to_string();

        if name.contains("META-INF") || name.contains('/') || name.contains('\\') {
            continue;
        }
        if !is_native(&name) {
            continue;
        }

        let dest = dest_dir.join(&name);
        let mut out = match std::fs::File::create(&dest) {
            Ok(out) => out,
            Err(e) => {
                warn!("Cannot create {:?}: {}", dest, e);
                continue;
            }
        };
        if std::io::copy(&mut entry, &mut out).is_ok() {
            debug!("Extracted native: {}", name);
            extracted += 1;
        }
    }

    extracted
}
