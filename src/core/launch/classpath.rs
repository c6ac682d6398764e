// ─── Classpath Builder ───
// Walks a library root for jars and joins them, plus explicit extras,
// with the platform path-list separator.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::error::{LauncherError, LauncherResult};

fn parse_numeric_version_parts(raw: &str) -> Vec<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.parse::<u32>().ok())
        .collect()
}

pub(crate) fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_numeric_version_parts(a);
    let b_parts = parse_numeric_version_parts(b);

    let max_len = a_parts.len().max(b_parts.len());
    for idx in 0..max_len {
        let a_val = a_parts.get(idx).copied().unwrap_or(0);
        let b_val = b_parts.get(idx).copied().unwrap_or(0);
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }

    // Deterministic tiebreaker for versions with identical numeric parts.
    a.cmp(b)
}

/// Platform-specific Java classpath separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

fn is_jar(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
}

/// Maven-layout identity of a jar below `root`: (`<group>/<artifact>`, version).
///
/// Only jars named `<artifact>-<version>*` inside `<artifact>/<version>/` have an
/// identity. Anything else, such as jars sitting directly in an artifact
/// directory, is never deduplicated.
fn library_identity(root: &Path, jar: &Path) -> Option<(PathBuf, String)> {
    let relative = jar.strip_prefix(root).ok()?;
    if relative.components().count() < 4 {
        return None;
    }
    let version_dir = relative.parent()?;
    let artifact_dir = version_dir.parent()?;
    let version = version_dir.file_name()?.to_str()?;
    let artifact = artifact_dir.file_name()?.to_str()?;
    let file_name = relative.file_name()?.to_str()?;

    if !file_name.starts_with(&format!("{artifact}-{version}")) {
        return None;
    }
    Some((artifact_dir.to_path_buf(), version.to_string()))
}

/// Every jar under `library_root`, in file-name-sorted walk order.
///
/// When one `<group>/<artifact>` directory holds several version directories,
/// only the newest version's jars are kept.
pub fn collect_library_jars(library_root: &Path) -> LauncherResult<Vec<PathBuf>> {
    let mut jars = Vec::new();

    for entry in WalkDir::new(library_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(LauncherError::WalkError {
                    path: library_root.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                warn!("Skipping unreadable entry under {:?}: {}", library_root, err);
                continue;
            }
        };

        if entry.file_type().is_file() && is_jar(entry.path()) {
            jars.push(entry.into_path());
        }
    }

    let mut newest: HashMap<PathBuf, String> = HashMap::new();
    for jar in &jars {
        if let Some((identity, version)) = library_identity(library_root, jar) {
            let slot = newest.entry(identity).or_insert_with(|| version.clone());
            if compare_versions(&version, slot) == Ordering::Greater {
                *slot = version;
            }
        }
    }

    jars.retain(|jar| match library_identity(library_root, jar) {
        Some((identity, version)) => {
            let keep = newest.get(&identity).is_some_and(|winner| *winner == version);
            if !keep {
                warn!(
                    "Dropping {:?}: newer version of {:?} present",
                    jar, identity
                );
            }
            keep
        }
        None => true,
    });

    debug!("Found {} jars under {:?}", jars.len(), library_root);
    Ok(jars)
}

/// Classpath from a library-root walk plus `extras`, which always come last.
///
/// A root without jars yields only the extras. Fails with `WalkError` when
/// the root itself cannot be traversed.
pub fn build_classpath(library_root: &Path, extras: &[PathBuf]) -> LauncherResult<String> {
    let mut jars = collect_library_jars(library_root)?;
    jars.retain(|jar| !extras.contains(jar));
    Ok(join_entries(jars.iter().chain(extras)))
}

/// Classpath from explicit jar paths, e.g. the libraries a version document lists.
/// Missing files are skipped with a warning; duplicates keep their first position.
pub fn build_listed_classpath(jars: &[PathBuf], extras: &[PathBuf]) -> String {
    let present = jars.iter().filter(|jar| {
        let exists = jar.is_file();
        if !exists {
            warn!("Library missing from cache, not on classpath: {:?}", jar);
        }
        exists
    });
    let mut entries: Vec<String> = present.chain(extras).map(|p| safe_path_str(p)).collect();
    dedup_preserving_order(&mut entries);
    entries.join(get_classpath_separator())
}

fn join_entries<'a>(entries: impl Iterator<Item = &'a PathBuf>) -> String {
    entries
        .map(|p| safe_path_str(p))
        .collect::<Vec<_>>()
        .join(get_classpath_separator())
}

fn dedup_preserving_order(entries: &mut Vec<String>) {
    let mut seen = HashSet::new();
    entries.retain(|entry| {
        let key = if cfg!(target_os = "windows") {
            entry.to_lowercase()
        } else {
            entry.clone()
        };
        seen.insert(key)
    });
}

/// Convert path to string, stripping the `\\?\` prefix that canonicalize adds on Windows.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // Java misreads extended-length paths on the classpath.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
