// ─── Content Hasher ───
// Deterministic content fingerprints for cached artifacts.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::core::error::{LauncherError, LauncherResult};

const READ_BLOCK: usize = 8 * 1024;

/// Digest used by a manifest. Flat manifests publish MD5, Mojang documents SHA-1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha1,
}

impl HashAlgorithm {
    /// Length of the lowercase hex digest.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha1 => 40,
        }
    }
}

/// Hash the whole file in one streaming pass and return a lowercase hex digest.
///
/// The handle is closed before returning. A read error mid-stream yields
/// `Io` and no partial digest.
pub fn fingerprint(path: &Path, algorithm: HashAlgorithm) -> LauncherResult<String> {
    let file = File::open(path).map_err(|e| LauncherError::io(path, e))?;
    let digest = match algorithm {
        HashAlgorithm::Md5 => hash_reader::<Md5, _>(file),
        HashAlgorithm::Sha1 => hash_reader::<Sha1, _>(file),
    };
    digest.map_err(|e| LauncherError::io(path, e))
}

/// Async wrapper that keeps blocking reads off the runtime workers.
pub async fn fingerprint_async(
    path: impl AsRef<Path>,
    algorithm: HashAlgorithm,
) -> LauncherResult<String> {
    let path = path.as_ref().to_path_buf();
    let join_path = path.clone();
    tokio::task::spawn_blocking(move || fingerprint(&path, algorithm))
        .await
        .map_err(|e| LauncherError::io(join_path, std::io::Error::other(e)))?
}

fn hash_reader<D: Digest, R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; READ_BLOCK];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
